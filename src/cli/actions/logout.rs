use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Signs out even when no session is stored; the stored file is always removed.
/// # Errors
/// Returns an error if the client cannot be built.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    let auth = globals.auth_service()?;
    auth.restore();
    auth.logout().await;

    println!("Signed out.");
    Ok(())
}
