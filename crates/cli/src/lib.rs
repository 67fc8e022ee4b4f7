pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "coffeebot",
    about = "Coffeebot operator CLI",
    long_about = "Apply migrations, check readiness, inspect configuration and reset coffeebot data.",
    after_help = "Examples:\n  coffeebot doctor --json\n  coffeebot config\n  coffeebot reset --yes"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Delete every preference, order and test user row")]
    Reset {
        #[arg(long, help = "Confirm that all coffee data should be deleted")]
        yes: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Reset { yes } => commands::reset::run(yes),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
