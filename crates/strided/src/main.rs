use std::process::ExitCode;

fn main() -> ExitCode {
    match strided::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("strided: {error}");
            ExitCode::FAILURE
        }
    }
}
