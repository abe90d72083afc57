use crate::cli::{
    actions::{ask, login, signup, Action},
    commands::{
        session::{
            ARG_EMAIL, ARG_LANGUAGE, ARG_NAME, ARG_PASSWORD, ARG_QUESTION, CMD_ASK, CMD_LOGIN,
            CMD_LOGOUT, CMD_SIGNUP, CMD_STATUS, CMD_WHOAMI,
        },
        ARG_API_URL, ARG_PROVIDER_SIGNOUT_URL, ARG_SESSION_FILE, ARG_TIMEOUT,
    },
    globals::GlobalArgs,
};
use anyhow::{anyhow, bail, Context, Result};
use secrecy::SecretString;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

/// Parses an absolute `http(s)` URL.
///
/// # Errors
/// Returns an error if the value is not a valid `http` or `https` URL.
pub fn parse_http_url(value: &str, arg: &str) -> Result<Url> {
    let url = Url::parse(value.trim()).with_context(|| format!("invalid --{arg}: {value}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => bail!("invalid --{arg}: unsupported scheme {scheme}"),
    }
}

/// `$HOME/.civic/session.json`, or `.civic/session.json` relative to the
/// working directory when `HOME` is unset.
#[must_use]
pub fn default_session_file() -> PathBuf {
    let base = env::var_os("HOME").map_or_else(PathBuf::new, PathBuf::from);
    base.join(".civic").join("session.json")
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let api_url = matches
        .get_one::<String>(ARG_API_URL)
        .context("missing required argument: --api-url")?;
    let api_url = parse_http_url(api_url, ARG_API_URL)?;

    let session_file = matches
        .get_one::<String>(ARG_SESSION_FILE)
        .map_or_else(default_session_file, PathBuf::from);

    let mut globals = GlobalArgs::new(api_url, session_file);

    if let Some(url) = matches.get_one::<String>(ARG_PROVIDER_SIGNOUT_URL) {
        globals.provider_signout_url = Some(parse_http_url(url, ARG_PROVIDER_SIGNOUT_URL)?);
    }

    if let Some(seconds) = matches.get_one::<u64>(ARG_TIMEOUT) {
        globals.timeout = Duration::from_secs(*seconds);
    }

    Ok(globals)
}

fn required(matches: &clap::ArgMatches, arg: &str) -> Result<String> {
    matches
        .get_one::<String>(arg)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("missing required argument: --{arg}"))
}

fn password(matches: &clap::ArgMatches) -> Result<SecretString> {
    // Passwords are taken verbatim; surrounding whitespace may be intentional.
    matches
        .get_one::<String>(ARG_PASSWORD)
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.clone()))
        .ok_or_else(|| anyhow!("missing required argument: --{ARG_PASSWORD}"))
}

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    match matches.subcommand() {
        Some((CMD_LOGIN, sub_m)) => Ok(Action::Login(login::Args {
            globals,
            email: required(sub_m, ARG_EMAIL)?,
            password: password(sub_m)?,
        })),
        Some((CMD_SIGNUP, sub_m)) => Ok(Action::Signup(signup::Args {
            globals,
            name: required(sub_m, ARG_NAME)?,
            email: required(sub_m, ARG_EMAIL)?,
            password: password(sub_m)?,
        })),
        Some((CMD_LOGOUT, _)) => Ok(Action::Logout(globals)),
        Some((CMD_WHOAMI, _)) => Ok(Action::Whoami(globals)),
        Some((CMD_STATUS, _)) => Ok(Action::Status(globals)),
        Some((CMD_ASK, sub_m)) => {
            let question = sub_m
                .get_many::<String>(ARG_QUESTION)
                .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            if question.trim().is_empty() {
                bail!("missing required argument: <{ARG_QUESTION}>");
            }

            Ok(Action::Ask(ask::Args {
                globals,
                question,
                language: sub_m
                    .get_one::<String>(ARG_LANGUAGE)
                    .cloned()
                    .unwrap_or_else(|| crate::api::DEFAULT_LANGUAGE.to_string()),
            }))
        }
        Some((name, _)) => bail!("unknown command: {name}"),
        None => bail!("no command given"),
    }
}
