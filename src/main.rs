use std::process::ExitCode;

fn main() -> ExitCode {
    pharmaguard_lib::run()
}
