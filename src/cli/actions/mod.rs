pub mod ask;
pub mod login;
pub mod logout;
pub mod signup;
pub mod status;
pub mod whoami;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::{api::types::User, cli::globals::GlobalArgs};

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Signup(signup::Args),
    Logout(GlobalArgs),
    Whoami(GlobalArgs),
    Status(GlobalArgs),
    Ask(ask::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

pub(crate) const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

pub(crate) fn describe(user: &User) -> String {
    format!("{} <{}>", user.name, user.email)
}
