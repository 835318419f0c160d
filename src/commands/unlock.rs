use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, password: &str, output: Q) -> Result<()> {
    let input = input.as_ref();
    let backend = LopdfBackend;
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read PDF: {}", input.display()))?;

    let mut doc = backend
        .unlock(&bytes, password)
        .with_context(|| format!("Failed to unlock PDF: {}", input.display()))?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Unlocked {} page(s) into {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}
