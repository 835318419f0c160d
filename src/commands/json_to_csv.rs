use super::{read_input, write_output};
use crate::tabular::json_to_delimited;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub fn run(input: Option<&Path>, delimiter: &str, output: Option<&Path>) -> Result<()> {
    let json = read_input(input)?;
    let csv = json_to_delimited(&json, delimiter)?;
    debug!(lines = csv.lines().count(), "encoded delimited text");

    write_output(output, &csv)?;
    if let Some(path) = output.filter(|p| p.as_os_str() != "-") {
        println!(
            "Wrote {} row(s) to {}",
            csv.lines().count().saturating_sub(1),
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.json");
        let output = dir.path().join("data.csv");
        std::fs::write(&input, r#"[{"id": 1, "name": "Ana"}, {"id": 2}]"#).unwrap();

        run(Some(&input), ";", Some(&output)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "\"id\";\"name\"\n\"1\";\"Ana\"\n\"2\";\"\""
        );
    }

    #[test]
    fn test_rejects_object_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.json");
        std::fs::write(&input, r#"{"id": 1}"#).unwrap();

        let err = run(Some(&input), ",", Some(&dir.path().join("out.csv"))).unwrap_err();
        assert_eq!(err.to_string(), "input must be a non-empty array of objects");
    }
}
