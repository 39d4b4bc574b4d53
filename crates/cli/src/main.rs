use std::process::ExitCode;

fn main() -> ExitCode {
    focal_cli::run()
}
