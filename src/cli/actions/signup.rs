use crate::{auth::AuthOutcome, cli::globals::GlobalArgs};
use anyhow::{bail, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// # Errors
/// Returns the user-facing failure message if the account cannot be created.
pub async fn execute(args: Args) -> Result<()> {
    let auth = args.globals.auth_service()?;

    match auth.signup(&args.name, &args.email, &args.password).await {
        AuthOutcome::Success(user) => {
            println!("Account created for {}", super::describe(&user));
            Ok(())
        }
        AuthOutcome::Failure(failure) => bail!(failure.message),
    }
}
