use std::process::ExitCode;

fn main() -> ExitCode {
    match seoul_sales_dashboard_lib::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
