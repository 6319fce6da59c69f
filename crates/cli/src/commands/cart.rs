//! Cart commands, including the interactive quantity editor.

use pantry_core::{CartState, LineId, ProductId};
use pantry_storefront::{
    AppState, CartEditor, CartView, EditResult, ErrorKind, SyncOutcome,
};

use super::{CommandError, Input, require_token};
use crate::render;

const CART_PATH: &str = "/cart";

const EDIT_HELP: &str = "\
Commands:
  + <line>          increase quantity
  - <line>          decrease quantity (at 1 removes the line)
  = <line> <qty>    set quantity (0 removes the line)
  commit <line>     send one line's pending quantity
  commit            send every pending quantity
  refresh           reload the cart
  show              print the cart
  quit              leave (pending quantities are discarded)
<line> is a line number from the listing or a line ID.
";

/// `pantry cart show`
pub async fn show(state: &AppState) -> Result<(), CommandError> {
    load(state).await?;
    print!("{}", render::cart(&CartView::from(&state.cart().snapshot())));
    Ok(())
}

/// `pantry cart add <product> [--qty N]`
pub async fn add(state: &AppState, product_id: &str, qty: i64) -> Result<(), CommandError> {
    require_token(state, CART_PATH).await?;
    let outcome = state.cart().add_line(&ProductId::new(product_id), qty).await;
    settle(state, outcome).await?;
    print!("{}", render::cart(&CartView::from(&state.cart().snapshot())));
    Ok(())
}

/// `pantry cart set <line> <qty>`
pub async fn set(state: &AppState, line: &str, qty: i64) -> Result<(), CommandError> {
    load(state).await?;
    let line_id = resolve_line(&state.cart().snapshot(), line)?;
    let outcome = state.cart().set_quantity(&line_id, qty).await;
    settle(state, outcome).await?;
    print!("{}", render::cart(&CartView::from(&state.cart().snapshot())));
    Ok(())
}

/// `pantry cart remove <line>`
pub async fn remove(state: &AppState, line: &str) -> Result<(), CommandError> {
    load(state).await?;
    let line_id = resolve_line(&state.cart().snapshot(), line)?;
    let outcome = state.cart().remove_line(&line_id).await;
    settle(state, outcome).await?;
    print!("{}", render::cart(&CartView::from(&state.cart().snapshot())));
    Ok(())
}

/// `pantry cart clear`
pub async fn clear(state: &AppState) -> Result<(), CommandError> {
    require_token(state, CART_PATH).await?;
    let outcome = state.cart().clear().await;
    settle(state, outcome).await?;
    println!("Cart cleared.");
    Ok(())
}

/// `pantry cart edit`
pub async fn edit(state: &AppState) -> Result<(), CommandError> {
    load(state).await?;
    let mut editor = CartEditor::new(state.cart());
    let mut input = Input::new();

    print_editor(state, &editor);
    println!("Type `help` for commands.");

    while let Some(raw) = input.ask("cart> ").await? {
        let command = match EditCommand::parse(&raw) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            EditCommand::Quit => break,
            EditCommand::Help => print!("{EDIT_HELP}"),
            EditCommand::Show => print_editor(state, &editor),
            EditCommand::Refresh => {
                report(state, state.cart().fetch().await).await?;
                editor.reconcile();
                print_editor(state, &editor);
            }
            EditCommand::Increment(line) => {
                let result = match resolve_line(&state.cart().snapshot(), &line) {
                    Ok(line_id) => editor.increment(&line_id).await,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                after_edit(state, &editor, result).await?;
            }
            EditCommand::Decrement(line) => {
                let result = match resolve_line(&state.cart().snapshot(), &line) {
                    Ok(line_id) => editor.decrement(&line_id).await,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                after_edit(state, &editor, result).await?;
            }
            EditCommand::Set(line, qty) => {
                let result = match resolve_line(&state.cart().snapshot(), &line) {
                    Ok(line_id) => editor.change(&line_id, qty).await,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                after_edit(state, &editor, result).await?;
            }
            EditCommand::Commit(Some(line)) => {
                let line_id = match resolve_line(&state.cart().snapshot(), &line) {
                    Ok(line_id) => line_id,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match editor.commit(&line_id).await {
                    Some(outcome) => report(state, outcome).await?,
                    None => println!("Nothing to commit for that line."),
                }
                print_editor(state, &editor);
            }
            EditCommand::Commit(None) => {
                let results = editor.commit_all().await;
                if results.is_empty() {
                    println!("Nothing to commit.");
                }
                for (_, outcome) in results {
                    report(state, outcome).await?;
                }
                print_editor(state, &editor);
            }
        }
    }

    if !editor.pending().is_empty() {
        println!("Discarded {} uncommitted change(s).", editor.pending().len());
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Require a login and fetch the cart.
async fn load(state: &AppState) -> Result<(), CommandError> {
    require_token(state, CART_PATH).await?;
    settle(state, state.cart().fetch().await).await
}

/// Turn an outcome into the command's result.
async fn settle(state: &AppState, outcome: SyncOutcome) -> Result<(), CommandError> {
    match outcome {
        SyncOutcome::Applied => Ok(()),
        SyncOutcome::AppliedStale => {
            println!("Saved, but the cart could not be refreshed; run `pantry cart show` to retry.");
            Ok(())
        }
        SyncOutcome::Failed(ErrorKind::AuthRequired) => {
            state.session_expired(CART_PATH).await?;
            Err(CommandError::LoginRequired)
        }
        SyncOutcome::Failed(_) => Err(CommandError::Cart(
            state
                .cart()
                .snapshot()
                .last_error
                .unwrap_or_else(|| "Cart operation failed".to_string()),
        )),
    }
}

/// Inside the edit loop: print failures and keep going, except for logins.
async fn report(state: &AppState, outcome: SyncOutcome) -> Result<(), CommandError> {
    match settle(state, outcome).await {
        Err(CommandError::Cart(message)) => {
            println!("! {message}");
            Ok(())
        }
        other => other,
    }
}

async fn after_edit(
    state: &AppState,
    editor: &CartEditor<'_, pantry_storefront::ApiClient>,
    result: EditResult,
) -> Result<(), CommandError> {
    match result {
        EditResult::Buffered => {}
        EditResult::Removed(outcome) => report(state, outcome).await?,
        EditResult::UnknownLine => println!("That line is no longer in the cart."),
    }
    print_editor(state, editor);
    Ok(())
}

fn print_editor(state: &AppState, editor: &CartEditor<'_, pantry_storefront::ApiClient>) {
    let view = CartView::new(&state.cart().snapshot(), editor.pending());
    print!("{}", render::cart(&view));
}

/// A 1-based line number from the listing, or a line ID.
fn resolve_line(state: &CartState, arg: &str) -> Result<LineId, CommandError> {
    let arg = arg.trim();
    if let Ok(number) = arg.parse::<usize>()
        && let Some(line) = number.checked_sub(1).and_then(|i| state.lines.get(i))
    {
        return Ok(line.line_id.clone());
    }
    let line_id = LineId::new(arg);
    if state.line(&line_id).is_some() {
        return Ok(line_id);
    }
    Err(CommandError::UnknownLine(arg.to_string()))
}

/// One command typed into `pantry cart edit`.
#[derive(Debug, PartialEq, Eq)]
enum EditCommand {
    Increment(String),
    Decrement(String),
    Set(String, i64),
    Commit(Option<String>),
    Refresh,
    Show,
    Help,
    Quit,
}

impl EditCommand {
    /// `Ok(None)` for a blank line.
    fn parse(raw: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = raw.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Ok(None),
            ["+", line] => Self::Increment((*line).to_string()),
            ["-", line] => Self::Decrement((*line).to_string()),
            ["=", line, qty] => {
                let qty = qty
                    .parse::<i64>()
                    .map_err(|_| format!("'{qty}' is not a whole number"))?;
                Self::Set((*line).to_string(), qty)
            }
            ["commit"] => Self::Commit(None),
            ["commit", line] => Self::Commit(Some((*line).to_string())),
            ["refresh"] => Self::Refresh,
            ["show"] => Self::Show,
            ["help" | "?"] => Self::Help,
            ["quit" | "exit" | "q"] => Self::Quit,
            _ => return Err(format!("Unknown command '{}'; type `help`", raw.trim())),
        };
        Ok(Some(command))
    }
}
