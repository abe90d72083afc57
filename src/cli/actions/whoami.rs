use crate::{
    api::types::User,
    auth::{AuthError, AuthErrorKind, AuthService},
    cli::globals::GlobalArgs,
};
use anyhow::{anyhow, Result};

/// # Errors
/// Returns an error if there is no valid session.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    let auth = globals.auth_service()?;
    let user = whoami(&auth).await?;

    println!("{}", super::describe(&user));
    println!("id: {}", user.id);
    Ok(())
}

async fn whoami(auth: &AuthService) -> Result<User> {
    auth.restore();

    match auth.check_auth().await {
        Ok(user) => Ok(user),
        Err(AuthError::NoToken) => Err(anyhow!("Not logged in. Run `civic login` first.")),
        Err(err) if err.kind() == AuthErrorKind::TokenInvalid => {
            Err(anyhow!(super::SESSION_EXPIRED))
        }
        Err(err) => Err(anyhow::Error::new(err).context("Session check failed")),
    }
}
