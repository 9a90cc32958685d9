use std::process::ExitCode;

fn main() -> ExitCode {
    lastfit_cli::run()
}
