use std::process::ExitCode;

fn main() -> ExitCode {
    match pregnancy_triage_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Pregnancy triage assistant failed");
            ExitCode::FAILURE
        }
    }
}
