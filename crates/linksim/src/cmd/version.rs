use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(format: OutputFormat) -> CliResult<i32> {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            })
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(SUCCESS)
}
