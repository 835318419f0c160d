use crate::pdf::tools::remove_last_page;
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let backend = LopdfBackend;
    let mut doc = backend.open(&input)?;

    remove_last_page(&backend, &mut doc)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Removed the last page; {} page(s) left in {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}
