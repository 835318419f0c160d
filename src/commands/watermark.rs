use crate::pdf::tools::{watermark_document, Watermark};
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    watermark: &Watermark,
    output: Q,
) -> Result<()> {
    let backend = LopdfBackend;
    let mut doc = backend.open(&input)?;

    watermark_document(&backend, &mut doc, watermark)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Watermarked {} page(s) into {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}
