use crate::qr::QrPayload;
use anyhow::Result;

pub fn run(payload: &QrPayload) -> Result<()> {
    match payload.encode() {
        Some(text) => println!("{}", text),
        None => anyhow::bail!("Nothing to encode"),
    }
    Ok(())
}
