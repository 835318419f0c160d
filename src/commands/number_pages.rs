use crate::pdf::tools::number_pages;
use crate::pdf::{DocumentBackend, LopdfBackend};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, format: &str, output: Q) -> Result<()> {
    let backend = LopdfBackend;
    let mut doc = backend.open(&input)?;

    number_pages(&backend, &mut doc, format)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, &output)?;

    println!(
        "Numbered {} page(s) into {}",
        page_count,
        output.as_ref().display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf;
    use crate::pdf::tools::DEFAULT_PAGE_NUMBER_FORMAT;

    #[test]
    fn test_number_pages_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(3, "A")).unwrap();

        let out = dir.path().join("numbered.pdf");
        run(&input, DEFAULT_PAGE_NUMBER_FORMAT, &out).unwrap();

        let doc = LopdfBackend.open(&out).unwrap();
        assert_eq!(LopdfBackend.page_count(&doc), 3);
        for (n, id) in doc.get_pages() {
            let content = doc.get_page_content(id).unwrap();
            let content = String::from_utf8_lossy(&content);
            assert!(content.contains(&format!("(Page {} of 3)", n)), "{content}");
            assert!(content.contains(&format!("A-Page-{}", n)));
        }
    }

    #[test]
    fn test_number_pages_custom_format() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(2, "A")).unwrap();

        let out = dir.path().join("numbered.pdf");
        run(&input, "{n}/{total}", &out).unwrap();

        let doc = LopdfBackend.open(&out).unwrap();
        let last = doc.get_pages()[&2];
        let content = doc.get_page_content(last).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(2/2)"));
    }

    #[test]
    fn test_number_pages_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("numbered.pdf");
        assert!(run(dir.path().join("missing.pdf"), DEFAULT_PAGE_NUMBER_FORMAT, &out).is_err());
        assert!(!out.exists());
    }
}
