use crate::pdf::tools::{add_text, TextStamp};
use crate::pdf::LopdfBackend;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, stamp: &TextStamp, output: Q) -> Result<()> {
    let backend = LopdfBackend;
    let mut doc = backend.open(&input)?;

    add_text(&backend, &mut doc, stamp)?;
    backend.write(&mut doc, &output)?;

    println!(
        "Added text to page {} into {}",
        stamp.page,
        output.as_ref().display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf;
    use crate::pdf::DocumentBackend;

    #[test]
    fn test_add_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(2, "A")).unwrap();

        let out = dir.path().join("edited.pdf");
        let mut stamp = TextStamp::new("Reviewed");
        stamp.page = 2;
        run(&input, &stamp, &out).unwrap();

        let doc = LopdfBackend.open(&out).unwrap();
        let pages = doc.get_pages();
        let second = doc.get_page_content(pages[&2]).unwrap();
        assert!(String::from_utf8_lossy(&second).contains("(Reviewed)"));
        let first = doc.get_page_content(pages[&1]).unwrap();
        assert!(!String::from_utf8_lossy(&first).contains("Reviewed"));
        assert_eq!(LopdfBackend.page_count(&doc), 2);
    }

    #[test]
    fn test_add_text_out_of_range_page() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(1, "A")).unwrap();

        let mut stamp = TextStamp::new("Reviewed");
        stamp.page = 4;
        let out = dir.path().join("edited.pdf");
        assert!(run(&input, &stamp, &out).is_err());
        assert!(!out.exists());
    }
}
