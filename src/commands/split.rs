use crate::pdf::tools::split_document;
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, pages: &str, output: Q) -> Result<()> {
    let backend = LopdfBackend;
    let doc = backend.open(&input)?;

    let mut new_doc = split_document(&backend, &doc, pages)?;
    let page_count = backend.page_count(&new_doc);
    backend.write(&mut new_doc, &output)?;

    println!(
        "Extracted {} page(s) to {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}
