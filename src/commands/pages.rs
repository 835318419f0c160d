use crate::page_range::resolve_page_indices;
use anyhow::Result;

pub fn run(spec: &str, page_count: usize) -> Result<()> {
    let indices = resolve_page_indices(spec, page_count)?;
    let list: Vec<String> = indices.iter().map(ToString::to_string).collect();
    println!("{}", list.join(","));
    Ok(())
}
