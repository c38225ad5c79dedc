//! Everything `ksreport` writes to stdout goes through here
#![allow(clippy::print_stdout)]

use serde::Serialize;

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> miette::Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("Failed to render output: {e}"))?;
    println!("{rendered}");
    Ok(())
}
