use crate::pdf::backend::Protection;
use crate::pdf::tools::protect_document;
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    protection: &Protection,
    output: Q,
) -> Result<()> {
    let backend = LopdfBackend;
    let mut doc = backend.open(&input)?;

    protect_document(&backend, &mut doc, protection)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Protected {} page(s) into {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf;

    #[test]
    fn test_protect_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(2, "A")).unwrap();

        let out = dir.path().join("protected.pdf");
        run(&input, &Protection::new("secret"), &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.windows(8).any(|w| w == b"/Encrypt"));
        let doc = LopdfBackend.unlock(&bytes, "secret").unwrap();
        assert_eq!(LopdfBackend.page_count(&doc), 2);
    }

    #[test]
    fn test_protect_requires_password() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(1, "A")).unwrap();

        let out = dir.path().join("protected.pdf");
        assert!(run(&input, &Protection::new(""), &out).is_err());
        assert!(!out.exists());
    }
}
