pub mod logging;
pub mod session;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_PROVIDER_SIGNOUT_URL: &str = "provider-signout-url";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("civic")
        .about("Civic AI session client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_API_URL)
                .short('u')
                .long(ARG_API_URL)
                .help("Backend base URL")
                .default_value("http://localhost:8000")
                .env("CIVIC_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .short('s')
                .long(ARG_SESSION_FILE)
                .help("Where the session is stored (default: $HOME/.civic/session.json)")
                .env("CIVIC_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_SIGNOUT_URL)
                .long(ARG_PROVIDER_SIGNOUT_URL)
                .help("Identity provider sign-out endpoint, called on logout")
                .env("CIVIC_PROVIDER_SIGNOUT_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .short('t')
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .default_value("10")
                .env("CIVIC_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..=300)),
        );

    let command = session::with_subcommands(command);
    logging::with_args(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "civic");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Civic AI session client".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_login_args() {
        let matches = new().get_matches_from(vec![
            "civic",
            "--api-url",
            "https://civic.example",
            "login",
            "--email",
            "asha@example.com",
            "--password",
            "hunter2",
        ]);

        assert_eq!(
            matches.get_one::<String>(ARG_API_URL).cloned(),
            Some("https://civic.example".to_string())
        );
        let (name, sub_m) = matches.subcommand().unwrap();
        assert_eq!(name, session::CMD_LOGIN);
        assert_eq!(
            sub_m.get_one::<String>(session::ARG_EMAIL).cloned(),
            Some("asha@example.com".to_string())
        );
        assert_eq!(
            sub_m.get_one::<String>(session::ARG_PASSWORD).cloned(),
            Some("hunter2".to_string())
        );
    }

    #[test]
    fn test_globals_after_subcommand() {
        let matches = new().get_matches_from(vec!["civic", "whoami", "--timeout", "3"]);
        assert_eq!(matches.get_one::<u64>(ARG_TIMEOUT).copied(), Some(3));
    }

    #[test]
    fn test_timeout_range() {
        let result = new().try_get_matches_from(vec!["civic", "--timeout", "0", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subcommand_required() {
        let result = new().try_get_matches_from(vec!["civic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_ask_collects_words() {
        let matches = new().get_matches_from(vec!["civic", "ask", "What", "is", "PMAY?"]);
        let (_, sub_m) = matches.subcommand().unwrap();
        let words: Vec<&String> = sub_m
            .get_many::<String>(session::ARG_QUESTION)
            .map(Iterator::collect)
            .unwrap_or_default();
        assert_eq!(words.len(), 3);
        assert_eq!(
            sub_m.get_one::<String>(session::ARG_LANGUAGE).cloned(),
            Some("en".to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("CIVIC_API_URL", Some("https://api.civic.example")),
                ("CIVIC_SESSION_FILE", Some("/tmp/civic.json")),
                ("CIVIC_TIMEOUT", Some("30")),
                ("CIVIC_EMAIL", Some("asha@example.com")),
                ("CIVIC_PASSWORD", Some("hunter2")),
                ("CIVIC_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["civic", "login"]);
                assert_eq!(
                    matches.get_one::<String>(ARG_API_URL).cloned(),
                    Some("https://api.civic.example".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(ARG_SESSION_FILE).cloned(),
                    Some("/tmp/civic.json".to_string())
                );
                assert_eq!(matches.get_one::<u64>(ARG_TIMEOUT).copied(), Some(30));
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("CIVIC_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["civic", "status"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_usize {
            temp_env::with_vars([("CIVIC_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["civic".to_string(), "status".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
