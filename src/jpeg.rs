//! JPEG header inspection. Images are embedded in PDFs as-is with the
//! `DCTDecode` filter, so only the frame header is ever read.

use crate::error::{FormatError, FormatResult};

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP14: u8 = 0xEE;

/// Frame properties of a JPEG image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    /// 1 (gray), 3 (YCbCr/RGB) or 4 (CMYK)
    pub components: u8,
    pub bits_per_component: u8,
    /// Written by Adobe software; CMYK data from it is stored inverted
    pub adobe: bool,
}

impl JpegInfo {
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        if data.get(..2) != Some(&[0xFF, SOI][..]) {
            return Err(FormatError::new("not a JPEG image"));
        }

        let mut adobe = false;
        let mut pos = 2;
        loop {
            if data.get(pos) != Some(&0xFF) {
                return Err(truncated());
            }
            // Markers may be padded with any number of 0xFF fill bytes
            while data.get(pos) == Some(&0xFF) {
                pos += 1;
            }
            let marker = *data.get(pos).ok_or_else(truncated)?;
            pos += 1;

            match marker {
                0x01 | 0xD0..=0xD7 => continue,
                EOI | SOS => return Err(FormatError::new("JPEG has no frame header")),
                _ => {}
            }

            let length = usize::from(read_u16(data, pos)?);
            let segment = length
                .checked_sub(2)
                .and_then(|len| data.get(pos + 2..pos + 2 + len))
                .ok_or_else(truncated)?;

            if marker == APP14 && segment.starts_with(b"Adobe") {
                adobe = true;
            }

            if is_frame_marker(marker) {
                return Self::from_frame(segment, adobe);
            }
            pos += length;
        }
    }

    fn from_frame(segment: &[u8], adobe: bool) -> FormatResult<Self> {
        if segment.len() < 6 {
            return Err(truncated());
        }
        let bits_per_component = segment[0];
        let height = u32::from(read_u16(segment, 1)?);
        let width = u32::from(read_u16(segment, 3)?);
        let components = segment[5];

        if width == 0 || height == 0 {
            return Err(FormatError::new("JPEG has no image dimensions"));
        }
        if !matches!(components, 1 | 3 | 4) {
            return Err(FormatError::new(format!(
                "unsupported JPEG with {} colour components",
                components
            )));
        }
        Ok(JpegInfo {
            width,
            height,
            components,
            bits_per_component,
            adobe,
        })
    }

    /// PDF colour space name for the image samples.
    pub fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

/// Start-of-frame markers. C4 (DHT), C8 (JPG) and CC (DAC) share the range
/// but are not frames.
fn is_frame_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

fn read_u16(data: &[u8], pos: usize) -> FormatResult<u16> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(truncated)
}

fn truncated() -> FormatError {
    FormatError::new("truncated JPEG header")
}
