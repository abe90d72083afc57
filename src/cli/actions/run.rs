use crate::cli::actions::{ask, login, logout, signup, status, whoami, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Signup(args) => signup::execute(args).await,
        Action::Logout(globals) => logout::execute(&globals).await,
        Action::Whoami(globals) => whoami::execute(&globals).await,
        Action::Status(globals) => status::execute(&globals),
        Action::Ask(args) => ask::execute(args).await,
    }
}
