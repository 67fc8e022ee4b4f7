use std::process::ExitCode;

fn main() -> ExitCode {
    coffeebot_cli::run()
}
