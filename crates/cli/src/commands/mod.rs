//! Subcommand implementations.
//!
//! Commands print results to stdout and return `CommandError` on failure.
//! Auth-gated commands pass the path they stand for so a missing or
//! rejected login remembers where to return after `pantry login`.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;

use std::path::PathBuf;

use pantry_storefront::{ApiError, AppState, AuthError, AuthToken, ErrorKind};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Nobody is logged in, or the service refused the saved token.
    #[error("Please log in to continue (run `pantry login`)")]
    LoginRequired,

    /// The cart has no such line.
    #[error("No cart line '{0}'; run `pantry cart show` for line numbers")]
    UnknownLine(String),

    /// A cart operation failed; carries the store's error message.
    #[error("{0}")]
    Cart(String),

    /// A required form field was not given.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A file named on the command line could not be read.
    #[error("Could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Terminal input failed.
    #[error("Could not read input: {0}")]
    Input(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The token for an auth-gated `path`.
async fn require_token(state: &AppState, path: &str) -> Result<AuthToken, CommandError> {
    match state.auth().require_auth(path).await {
        Ok(token) => Ok(token),
        Err(e) if e.is_login_required() => Err(CommandError::LoginRequired),
        Err(e) => Err(e.into()),
    }
}

/// Pass `result` through, turning a refused token into a login prompt.
async fn check_auth<T>(
    state: &AppState,
    path: &str,
    result: Result<T, ApiError>,
) -> Result<T, CommandError> {
    match result {
        Err(e) if e.kind() == ErrorKind::AuthRequired => {
            tracing::info!(path, "Service refused the saved session");
            state.session_expired(path).await?;
            Err(CommandError::LoginRequired)
        }
        other => Ok(other?),
    }
}

/// Line-oriented reader over stdin for prompts and the edit loop.
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    /// A reader over this process's stdin.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one line; `None` at end of input.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>, CommandError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(label.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?)
    }

    /// Use `given`, or prompt for it.
    pub async fn value_or_ask(
        &mut self,
        given: Option<String>,
        label: &str,
        field: &'static str,
    ) -> Result<String, CommandError> {
        if let Some(value) = given {
            return Ok(value);
        }
        self.ask(label)
            .await?
            .ok_or(CommandError::MissingField(field))
    }
}
