use std::process::ExitCode;

fn main() -> ExitCode {
    match stashdrive::cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("stashdrive: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
