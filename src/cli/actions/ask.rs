use crate::{auth::AuthService, cli::globals::GlobalArgs, session::AuthState};
use anyhow::{anyhow, Result};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub question: String,
    pub language: String,
}

struct Reply {
    answer: Result<String>,
    session_expired: bool,
}

/// Hydrates the stored session, then posts the question with it.
///
/// # Errors
/// Returns an error if the backend call fails.
pub async fn execute(args: Args) -> Result<()> {
    let auth = args.globals.auth_service()?;
    let reply = ask(&auth, &args.question, &args.language).await;

    if reply.session_expired {
        eprintln!("{}", super::SESSION_EXPIRED);
    }

    println!("{}", reply.answer?);
    Ok(())
}

async fn ask(auth: &AuthService, question: &str, language: &str) -> Reply {
    let state = auth.initialize().await;
    debug!("asking as {:?}", state.user().map(|user| user.id.as_str()));

    let mut changes = auth.subscribe();
    let response = auth.api().query(question, language).await;

    // The request itself may have ended the session.
    let session_expired = changes.has_changed().unwrap_or(false)
        && *changes.borrow_and_update() == AuthState::Unauthenticated;

    Reply {
        answer: response
            .map(|response| response.answer)
            .map_err(|err| anyhow!("Backend error: {err}")),
        session_expired,
    }
}
