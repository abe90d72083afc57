//! # Civic (Session Client)
//!
//! `civic` is the client side of the Civic AI question service. It keeps a
//! signed-in identity (a bearer token plus the user record) in memory and on
//! disk, and talks to the backend through a single HTTP client that attaches
//! the token and reacts to rejected credentials.
//!
//! ## Session Lifecycle
//!
//! A session is created by `login`/`signup`, restored from the session file at
//! startup and re-validated against `GET /auth/me`. It is destroyed on logout,
//! on a failed validation, or as soon as any request comes back `401`.
//!
//! - **Persistence:** the token and the serialized user live under the keys
//!   `civic_ai_token` and `civic_ai_user`; they are written together and removed
//!   together, and memory never disagrees with disk after a mutation.
//! - **Identity Provider:** logout also signs out of the third-party provider.
//!   That call is best-effort; local teardown happens regardless.
//!
//! ## Layout
//!
//! - [`session`]: shared session state, storage backends and provider sign-out.
//! - [`auth`]: login, signup, logout, validation and hydration.
//! - [`api`]: the HTTP gateway (bearer injection and `401` handling).
//! - [`cli`]: the `civic` command line.

pub mod api;
pub mod auth;
pub mod cli;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with("civic/"));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
