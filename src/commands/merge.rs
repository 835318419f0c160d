use crate::pdf::tools::merge_documents;
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let backend = LopdfBackend;
    let docs = inputs
        .iter()
        .map(|input| backend.open(input))
        .collect::<Result<Vec<_>>>()?;

    let mut merged = merge_documents(&backend, docs)?;
    let total_pages = backend.page_count(&merged);
    backend.write(&mut merged, &output)?;

    println!(
        "Merged {} files ({} pages) into {}",
        inputs.len(),
        total_pages,
        output.as_ref().display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf;

    #[test]
    fn test_merge_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        std::fs::write(&a, sample_pdf(2, "A")).unwrap();
        std::fs::write(&b, sample_pdf(3, "B")).unwrap();

        let out = dir.path().join("merged.pdf");
        run(&[&a, &b], &out).unwrap();
        assert_eq!(LopdfBackend.page_count(&LopdfBackend.open(&out).unwrap()), 5);
    }

    #[test]
    fn test_merge_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("merged.pdf");
        assert!(run(&[dir.path().join("missing.pdf")], &out).is_err());
        assert!(!out.exists());
    }
}
