use crate::{cli::globals::GlobalArgs, session::AuthState};
use anyhow::Result;

/// Reports the stored session without contacting the backend.
/// # Errors
/// Returns an error if the client cannot be built.
pub fn execute(globals: &GlobalArgs) -> Result<()> {
    let auth = globals.auth_service()?;

    match auth.restore() {
        AuthState::Authenticated(user) => {
            println!("Logged in as {} (not verified)", super::describe(&user));
        }
        AuthState::Unauthenticated => println!("Not logged in."),
    }
    println!("session file: {}", globals.session_file.display());
    Ok(())
}
