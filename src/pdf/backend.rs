use crate::jpeg::JpegInfo;
use anyhow::Result;
use clap::ValueEnum;

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };
}

/// Fill colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn gray(level: f32) -> Self {
        Rgb {
            r: level,
            g: level,
            b: level,
        }
    }
}

/// Standard-14 fonts usable without embedding a font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// A run of text drawn on top of a page's existing content.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: StandardFont,
    pub color: Rgb,
    pub opacity: f32,
    /// Counter-clockwise rotation around `(x, y)`, in degrees
    pub rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Rotation {
    /// 90° clockwise
    #[default]
    Right,
    /// 180°
    Down,
    /// 90° counter-clockwise
    Left,
}

impl Rotation {
    pub fn degrees(&self) -> i64 {
        match self {
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }
}

/// Password protection applied when a document is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protection {
    /// Needed to open the document
    pub user_password: String,
    /// Lifts the permission restrictions
    pub owner_password: String,
    pub allow_printing: bool,
    pub allow_copying: bool,
    pub allow_modifying: bool,
}

impl Protection {
    /// One password for opening and owning, with printing, copying and
    /// modifying all denied.
    pub fn new(password: impl Into<String>) -> Self {
        let password = password.into();
        Protection {
            owner_password: password.clone(),
            user_password: password,
            allow_printing: false,
            allow_copying: false,
            allow_modifying: false,
        }
    }
}

/// A JPEG drawn on a page of its own. `x`, `y`, `width` and `height`
/// place the image on the page, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePage<'a> {
    pub data: &'a [u8],
    pub info: JpegInfo,
    pub page: PageSize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Document engine the PDF tools are written against.
///
/// Pages are addressed by zero-based index. Implementations may assume
/// indices passed in are below [`DocumentBackend::page_count`].
pub trait DocumentBackend {
    type Document;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document>;

    fn save(&self, doc: &mut Self::Document) -> Result<Vec<u8>>;

    fn page_count(&self, doc: &Self::Document) -> usize;

    fn page_size(&self, doc: &Self::Document, index: usize) -> Result<PageSize>;

    /// Concatenate the pages of `docs` in order into one document.
    fn merge(&self, docs: Vec<Self::Document>) -> Result<Self::Document>;

    /// New document holding only the pages at `indices`, in document order.
    fn copy_pages(&self, doc: &Self::Document, indices: &[usize]) -> Result<Self::Document>;

    /// Current clockwise rotation of a page, in degrees.
    fn rotation(&self, doc: &Self::Document, index: usize) -> Result<i64>;

    fn set_rotation(&self, doc: &mut Self::Document, index: usize, degrees: i64) -> Result<()>;

    fn draw_text(&self, doc: &mut Self::Document, index: usize, overlay: &TextOverlay)
        -> Result<()>;

    fn remove_page(&self, doc: &mut Self::Document, index: usize) -> Result<()>;

    /// New document with one page per image.
    fn image_document(&self, pages: &[ImagePage<'_>]) -> Result<Self::Document>;

    fn is_protected(&self, doc: &Self::Document) -> bool;

    /// Encrypt the document so readers ask for a password.
    fn protect(&self, doc: &mut Self::Document, protection: &Protection) -> Result<()>;

    /// Load a password-protected document and strip its protection.
    fn unlock(&self, bytes: &[u8], password: &str) -> Result<Self::Document>;
}
