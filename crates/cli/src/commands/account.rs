//! Login, registration and session commands.

use pantry_core::Registration;
use pantry_storefront::AppState;

use super::{CommandError, Input};
use crate::render;

/// `pantry login -e <email> [-p <password>]`
pub async fn login(
    state: &AppState,
    email: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let password = Input::new()
        .value_or_ask(password, "Password: ", "password")
        .await?;

    let success = state.login(email, &password).await?;
    println!("Logged in as {}.", success.user.name);
    println!("Continue at {}", success.destination);
    Ok(())
}

/// `pantry register -n <name> -e <email>`
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<(), CommandError> {
    let mut input = Input::new();
    let password = input
        .value_or_ask(password, "Password: ", "password")
        .await?;
    let confirm_password = input
        .value_or_ask(confirm_password, "Confirm password: ", "password confirmation")
        .await?;

    let registration = Registration::new(name, email, &password, &confirm_password)
        .map_err(pantry_storefront::AuthError::from)?;
    let message = state.auth().register(&registration).await?;

    println!("{}", message.unwrap_or_else(|| "Account created.".to_string()));
    println!("Run `pantry login -e {}` to sign in.", registration.email());
    Ok(())
}

/// `pantry logout`
pub async fn logout(state: &AppState) -> Result<(), CommandError> {
    state.logout().await?;
    println!("Logged out.");
    Ok(())
}

/// `pantry whoami`
pub async fn whoami(state: &AppState) {
    let user = state.auth().current_user().await;
    print!("{}", render::user(user.as_ref()));
    if let Some(path) = state.auth().pending_redirect().await {
        println!("After login you will continue at {path}");
    }
    let config = state.config();
    println!("Service: {}", config.api_base_url);
    println!("Session: {}", config.session_file.display());
}
