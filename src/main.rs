use std::process::ExitCode;

fn main() -> ExitCode {
    match restaurant_pos_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
