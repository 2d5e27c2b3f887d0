//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Print a fatal error and exit non-zero.
///
/// Human mode writes a styled message to stderr; JSON mode emits a
/// machine-readable error object on stdout so callers never have to parse
/// two streams. The full anyhow context chain is included either way.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        match serde_json::to_string_pretty(&body) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error: {err:#}"),
        }
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1);
}
