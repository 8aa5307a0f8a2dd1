use std::process::ExitCode;

fn main() -> ExitCode {
    simfit_cli::run()
}
