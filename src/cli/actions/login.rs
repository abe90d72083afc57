use crate::{auth::AuthOutcome, cli::globals::GlobalArgs};
use anyhow::{bail, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

/// # Errors
/// Returns the user-facing failure message if the login is rejected.
pub async fn execute(args: Args) -> Result<()> {
    let auth = args.globals.auth_service()?;

    match auth.login(&args.email, &args.password).await {
        AuthOutcome::Success(user) => {
            println!("Logged in as {}", super::describe(&user));
            Ok(())
        }
        AuthOutcome::Failure(failure) => bail!(failure.message),
    }
}
