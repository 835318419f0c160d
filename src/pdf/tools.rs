//! PDF tools written against [`DocumentBackend`].

use super::backend::{
    DocumentBackend, ImagePage, PageSize, Protection, Rgb, Rotation, StandardFont, TextOverlay,
};
use crate::error::{FormatError, FormatResult};
use crate::jpeg::JpegInfo;
use crate::page_range::resolve_page_indices;
use anyhow::{bail, Result};
use clap::ValueEnum;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_PAGE_NUMBER_FORMAT: &str = "Page {n} of {total}";

const PAGE_NUMBER_SIZE: f32 = 12.0;
const PAGE_NUMBER_MARGIN: f32 = 50.0;
const PAGE_NUMBER_BASELINE: f32 = 30.0;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
        .expect("hex color pattern is valid")
});

/// Diagonal text stamped across the middle of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub size: f32,
    pub opacity: f32,
    pub color: Rgb,
}

impl Watermark {
    pub const DEFAULT_SIZE: f32 = 50.0;
    pub const DEFAULT_OPACITY: f32 = 0.2;

    pub fn new(text: impl Into<String>) -> Self {
        Watermark {
            text: text.into(),
            size: Self::DEFAULT_SIZE,
            opacity: Self::DEFAULT_OPACITY,
            color: Rgb {
                r: 0.95,
                g: 0.1,
                b: 0.1,
            },
        }
    }
}

/// Text placed on a single page, by default near its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStamp {
    pub text: String,
    /// 1-based page number
    pub page: usize,
    pub x: f32,
    /// Baseline height; `None` puts the text one margin below the top edge
    pub y: Option<f32>,
    pub size: f32,
    pub color: Rgb,
}

impl TextStamp {
    pub const DEFAULT_SIZE: f32 = 24.0;
    pub const MARGIN: f32 = 60.0;

    pub fn new(text: impl Into<String>) -> Self {
        TextStamp {
            text: text.into(),
            page: 1,
            x: Self::MARGIN,
            y: None,
            size: Self::DEFAULT_SIZE,
            color: Rgb {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            },
        }
    }
}

/// Page size used when converting images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ImageLayout {
    /// Page matches the image, one point per pixel
    #[default]
    Image,
    /// Image scaled to fit an A4 page and centred
    A4,
    /// Image scaled to fit a US Letter page and centred
    Letter,
}

/// Parse a `#rrggbb` colour.
pub fn parse_hex_color(s: &str) -> FormatResult<Rgb> {
    let caps = HEX_COLOR
        .captures(s.trim())
        .ok_or_else(|| FormatError::new(format!("invalid color: {}", s)))?;
    let channel = |i: usize| {
        u8::from_str_radix(&caps[i], 16)
            .map(|v| f32::from(v) / 255.0)
            .map_err(|_| FormatError::new(format!("invalid color: {}", s)))
    };
    Ok(Rgb {
        r: channel(1)?,
        g: channel(2)?,
        b: channel(3)?,
    })
}

/// Approximate advance width of `text` in points. Per-character widths
/// follow the Helvetica AFM metrics closely enough for layout.
pub fn text_width(text: &str, font: StandardFont, size: f32) -> f32 {
    let bold = font == StandardFont::HelveticaBold;
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' => 278,
            'i' | 'j' | 'l' => {
                if bold {
                    278
                } else {
                    222
                }
            }
            'f' | 't' | 'I' | '!' | '.' | ',' | ':' | ';' | '\'' | '|' | '/' => 278,
            'r' | '(' | ')' | '-' | '[' | ']' | '{' | '}' => 333,
            'm' | 'M' => 833,
            'w' => 722,
            'W' => 944,
            '0'..='9' => 556,
            'G' | 'O' | 'Q' => 778,
            'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'A' | 'B' | 'K' | 'V' | 'X' | 'Y' => 722,
            'F' | 'T' | 'Z' => 611,
            'J' | 'L' => 556,
            'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => {
                if bold {
                    556
                } else {
                    500
                }
            }
            c if c.is_uppercase() => 667,
            _ => {
                if bold {
                    611
                } else {
                    556
                }
            }
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Concatenate documents in order.
pub fn merge_documents<B: DocumentBackend>(
    backend: &B,
    docs: Vec<B::Document>,
) -> Result<B::Document> {
    if docs.is_empty() {
        bail!("No input files specified");
    }
    debug!(documents = docs.len(), "merging");
    backend.merge(docs)
}

/// New document holding the pages selected by a page range list such as
/// "1-3,5", in ascending order.
pub fn split_document<B: DocumentBackend>(
    backend: &B,
    doc: &B::Document,
    pages: &str,
) -> Result<B::Document> {
    let indices = resolve_page_indices(pages, backend.page_count(doc))?;
    debug!(?indices, "extracting pages");
    backend.copy_pages(doc, &indices)
}

/// Rotate every page clockwise by `rotation`, on top of its current rotation.
pub fn rotate_document<B: DocumentBackend>(
    backend: &B,
    doc: &mut B::Document,
    rotation: Rotation,
) -> Result<()> {
    for index in 0..backend.page_count(doc) {
        let current = backend.rotation(doc, index)?;
        let degrees = (current + rotation.degrees()).rem_euclid(360);
        backend.set_rotation(doc, index, degrees)?;
    }
    Ok(())
}

/// Stamp a watermark diagonally across the centre of every page.
pub fn watermark_document<B: DocumentBackend>(
    backend: &B,
    doc: &mut B::Document,
    watermark: &Watermark,
) -> Result<()> {
    if watermark.text.is_empty() {
        return Err(FormatError::new("watermark text is empty").into());
    }
    if watermark.size.is_nan() || watermark.size <= 0.0 {
        return Err(FormatError::new("watermark size must be positive").into());
    }
    if !watermark.opacity.is_finite() {
        return Err(FormatError::new("watermark opacity must be between 0 and 1").into());
    }

    let font = StandardFont::HelveticaBold;
    let width = text_width(&watermark.text, font, watermark.size);
    for index in 0..backend.page_count(doc) {
        let page = backend.page_size(doc, index)?;
        let overlay = TextOverlay {
            text: watermark.text.clone(),
            x: page.width / 2.0 - width / 2.0,
            y: page.height / 2.0 - watermark.size / 2.0,
            size: watermark.size,
            font,
            color: watermark.color,
            opacity: watermark.opacity.clamp(0.0, 1.0),
            rotation: 45.0,
        };
        backend.draw_text(doc, index, &overlay)?;
    }
    Ok(())
}

/// Expand `{n}` and `{total}` in a page number template.
pub fn page_label(template: &str, page: usize, total: usize) -> String {
    template
        .replace("{n}", &page.to_string())
        .replace("{total}", &total.to_string())
}

/// Write a page number in the bottom-right corner of every page.
pub fn number_pages<B: DocumentBackend>(
    backend: &B,
    doc: &mut B::Document,
    template: &str,
) -> Result<()> {
    let total = backend.page_count(doc);
    let font = StandardFont::Helvetica;
    for index in 0..total {
        let page = backend.page_size(doc, index)?;
        let text = page_label(template, index + 1, total);
        let width = text_width(&text, font, PAGE_NUMBER_SIZE);
        let overlay = TextOverlay {
            x: page.width - width - PAGE_NUMBER_MARGIN,
            y: PAGE_NUMBER_BASELINE,
            text,
            size: PAGE_NUMBER_SIZE,
            font,
            color: Rgb::gray(0.5),
            opacity: 1.0,
            rotation: 0.0,
        };
        backend.draw_text(doc, index, &overlay)?;
    }
    Ok(())
}

/// Draw a line of Helvetica text on one page.
pub fn add_text<B: DocumentBackend>(
    backend: &B,
    doc: &mut B::Document,
    stamp: &TextStamp,
) -> Result<()> {
    if stamp.text.is_empty() {
        return Err(FormatError::new("text is empty").into());
    }
    if !stamp.size.is_finite() || stamp.size <= 0.0 {
        return Err(FormatError::new("text size must be positive").into());
    }
    let count = backend.page_count(doc);
    if stamp.page == 0 || stamp.page > count {
        return Err(FormatError::new(format!(
            "page {} is out of range (1-{})",
            stamp.page, count
        ))
        .into());
    }

    let index = stamp.page - 1;
    let y = match stamp.y {
        Some(y) => y,
        None => backend.page_size(doc, index)?.height - TextStamp::MARGIN,
    };
    if !stamp.x.is_finite() || !y.is_finite() {
        return Err(FormatError::new("text position must be a number").into());
    }
    let overlay = TextOverlay {
        text: stamp.text.clone(),
        x: stamp.x,
        y,
        size: stamp.size,
        font: StandardFont::Helvetica,
        color: stamp.color,
        opacity: 1.0,
        rotation: 0.0,
    };
    backend.draw_text(doc, index, &overlay)
}

/// Where an image of `info`'s dimensions lands under `layout`.
pub fn image_page<'a>(
    data: &'a [u8],
    info: JpegInfo,
    layout: ImageLayout,
) -> ImagePage<'a> {
    let (width, height) = (info.width as f32, info.height as f32);
    let page = match layout {
        ImageLayout::Image => {
            return ImagePage {
                data,
                info,
                page: PageSize { width, height },
                x: 0.0,
                y: 0.0,
                width,
                height,
            }
        }
        ImageLayout::A4 => PageSize::A4,
        ImageLayout::Letter => PageSize::LETTER,
    };
    let scale = (page.width / width).min(page.height / height);
    let (drawn_width, drawn_height) = (width * scale, height * scale);
    ImagePage {
        data,
        info,
        page,
        x: (page.width - drawn_width) / 2.0,
        y: (page.height - drawn_height) / 2.0,
        width: drawn_width,
        height: drawn_height,
    }
}

/// New document with one page per JPEG image, in order.
pub fn images_to_document<B: DocumentBackend, D: AsRef<[u8]>>(
    backend: &B,
    images: &[D],
    layout: ImageLayout,
) -> Result<B::Document> {
    if images.is_empty() {
        bail!("No images to convert");
    }
    let pages = images
        .iter()
        .enumerate()
        .map(|(i, data)| {
            let data = data.as_ref();
            let info = JpegInfo::parse(data)
                .map_err(|e| FormatError::new(format!("image {}: {}", i + 1, e)))?;
            Ok(image_page(data, info, layout))
        })
        .collect::<FormatResult<Vec<_>>>()?;
    debug!(images = pages.len(), ?layout, "converting images");
    backend.image_document(&pages)
}

/// Encrypt the document with `protection`. An empty owner password falls
/// back to the user password.
pub fn protect_document<B: DocumentBackend>(
    backend: &B,
    doc: &mut B::Document,
    protection: &Protection,
) -> Result<()> {
    if protection.user_password.is_empty() {
        return Err(FormatError::new("password is empty").into());
    }
    if backend.is_protected(doc) {
        bail!("PDF is already password protected");
    }
    let mut protection = protection.clone();
    if protection.owner_password.is_empty() {
        protection.owner_password = protection.user_password.clone();
    }
    backend.protect(doc, &protection)
}

/// Drop the final page. The document must keep at least one page.
pub fn remove_last_page<B: DocumentBackend>(backend: &B, doc: &mut B::Document) -> Result<()> {
    let count = backend.page_count(doc);
    if count <= 1 {
        bail!("The PDF must have more than one page to remove the last one");
    }
    backend.remove_page(doc, count - 1)
}
