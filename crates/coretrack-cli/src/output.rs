use std::path::Path;

use coretrack_core::HoldingIndicator;

use crate::error::CliError;

/// Assemble the per-holding lines the report formatter consumes. The
/// rendered indicator (or the static note) is printed verbatim after the
/// holding identity.
pub fn assemble(results: &[HoldingIndicator]) -> String {
    let mut out = String::new();
    for item in results {
        out.push_str(&format!(
            "{} {}: {}\n",
            item.code,
            item.name,
            item.display_line()
        ));
    }
    out
}

pub fn render(results: &[HoldingIndicator], destination: Option<&Path>) -> Result<(), CliError> {
    let assembled = assemble(results);

    match destination {
        Some(path) => std::fs::write(path, assembled)
            .map_err(|error| CliError::Output(error.to_string())),
        None => {
            print!("{assembled}");
            Ok(())
        }
    }
}
