use super::{read_input, write_output};
use crate::tabular::{decode_from_delimited, table_to_json};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub fn run(
    input: Option<&Path>,
    delimiter: &str,
    has_header: bool,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_input(input)?;
    let table = decode_from_delimited(&text, delimiter, has_header)?;
    debug!(records = table.len(), has_header, "decoded delimited text");

    write_output(output, &table_to_json(&table)?)?;
    if let Some(path) = output.filter(|p| p.as_os_str() != "-") {
        println!("Wrote {} record(s) to {}", table.len(), path.display());
    }

    Ok(())
}
