pub mod add_text;
pub mod csv_to_json;
pub mod images_to_pdf;
pub mod json_to_csv;
pub mod merge;
pub mod number_pages;
pub mod pages;
pub mod protect;
pub mod qr;
pub mod remove_last_page;
pub mod rotate;
pub mod split;
pub mod unlock;
pub mod watermark;

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::Path;

fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str() == "-")
}

/// Read text from `path`, or from stdin when the path is absent or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if !is_stdio(path) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read {}", p.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Write text to `path`, or to stdout when the path is absent or `-`.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(p) if !is_stdio(path) => {
            std::fs::write(p, text).with_context(|| format!("Failed to write {}", p.display()))
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text).context("Failed to write stdout")
        }
    }
}
