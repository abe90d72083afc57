use clap::{Arg, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_SIGNUP: &str = "signup";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_STATUS: &str = "status";
pub const CMD_ASK: &str = "ask";

pub const ARG_NAME: &str = "name";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_QUESTION: &str = "question";
pub const ARG_LANGUAGE: &str = "language";

fn email() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Account email")
        .env("CIVIC_EMAIL")
        .required(true)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('P')
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("CIVIC_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in and store the session")
                .arg(email())
                .arg(password()),
        )
        .subcommand(
            Command::new(CMD_SIGNUP)
                .about("Create an account and store the session")
                .arg(
                    Arg::new(ARG_NAME)
                        .short('n')
                        .long(ARG_NAME)
                        .help("Display name")
                        .required(true),
                )
                .arg(email())
                .arg(password()),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the stored session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Validate the stored session with the backend"))
        .subcommand(Command::new(CMD_STATUS).about("Show the stored session without contacting the backend"))
        .subcommand(
            Command::new(CMD_ASK)
                .about("Ask the Civic AI a question")
                .arg(
                    Arg::new(ARG_QUESTION)
                        .help("Question text")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new(ARG_LANGUAGE)
                        .short('l')
                        .long(ARG_LANGUAGE)
                        .help("Answer language")
                        .env("CIVIC_LANGUAGE")
                        .default_value(crate::api::DEFAULT_LANGUAGE),
                ),
        )
}
