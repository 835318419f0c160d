use crate::pdf::tools::rotate_document;
use crate::pdf::{DocumentBackend, LopdfBackend, Rotation};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, rotation: Rotation, output: Q) -> Result<()> {
    let backend = LopdfBackend;
    let mut doc = backend.open(&input)?;

    rotate_document(&backend, &mut doc, rotation)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Rotated {} page(s) by {}° into {}",
        page_count,
        rotation.degrees(),
        output.as_ref().display()
    );

    Ok(())
}
