use crate::pdf::tools::{images_to_document, ImageLayout};
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    inputs: &[P],
    layout: ImageLayout,
    output: Q,
) -> Result<()> {
    let images = inputs
        .iter()
        .map(|input| {
            let input = input.as_ref();
            std::fs::read(input)
                .with_context(|| format!("Failed to read image: {}", input.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let backend = LopdfBackend;
    let mut doc = images_to_document(&backend, &images, layout)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Converted {} image(s) into {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}
