use std::process::ExitCode;

fn main() -> ExitCode {
    match schedmaster_core::run(std::env::args_os().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("schedmaster: {err:#}");
            ExitCode::FAILURE
        }
    }
}
