use crate::pdf::tools::{ImageLayout, TextStamp, Watermark, DEFAULT_PAGE_NUMBER_FORMAT};
use crate::pdf::Rotation;
use crate::qr::WifiSecurity;
use crate::tabular::DEFAULT_DELIMITER;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doctools")]
#[command(about = "File conversion and PDF tools with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server on stdin/stdout
    Mcp,

    /// Convert a JSON array of objects to CSV
    JsonToCsv {
        /// JSON file to read (stdin if omitted or "-")
        input: Option<PathBuf>,

        /// Field delimiter
        #[arg(short, long, default_value = DEFAULT_DELIMITER)]
        delimiter: String,

        /// Output file (stdout if omitted or "-")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert CSV to a JSON array
    CsvToJson {
        /// CSV file to read (stdin if omitted or "-")
        input: Option<PathBuf>,

        /// Field delimiter
        #[arg(short, long, default_value = DEFAULT_DELIMITER)]
        delimiter: String,

        /// Treat the first line as data instead of a header
        #[arg(long)]
        no_header: bool,

        /// Output file (stdout if omitted or "-")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the zero-based page indices a page range list selects
    Pages {
        /// Page ranges (e.g., "1-3,5")
        pages: String,

        /// Number of pages in the document
        #[arg(short, long)]
        count: usize,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files to merge
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,
    },

    /// Extract page ranges to a new PDF
    #[command(alias = "extract")]
    Split {
        /// PDF file to extract from
        path: PathBuf,

        /// Page ranges (e.g., "1-3,5")
        pages: String,

        /// Output file
        #[arg(short, long, default_value = "split.pdf")]
        output: PathBuf,
    },

    /// Rotate every page
    Rotate {
        /// PDF file to rotate
        path: PathBuf,

        /// Rotation to apply on top of the current one
        #[arg(short, long, value_enum, default_value_t = Rotation::Right)]
        angle: Rotation,

        /// Output file
        #[arg(short, long, default_value = "rotated.pdf")]
        output: PathBuf,
    },

    /// Stamp diagonal text across every page
    Watermark {
        /// PDF file to watermark
        path: PathBuf,

        /// Watermark text
        text: String,

        /// Font size in points
        #[arg(long, default_value_t = Watermark::DEFAULT_SIZE)]
        size: f32,

        /// Opacity between 0 and 1
        #[arg(long, default_value_t = Watermark::DEFAULT_OPACITY)]
        opacity: f32,

        /// Text colour as #rrggbb
        #[arg(long)]
        color: Option<String>,

        /// Output file
        #[arg(short, long, default_value = "watermarked.pdf")]
        output: PathBuf,
    },

    /// Write page numbers at the bottom of every page
    NumberPages {
        /// PDF file to number
        path: PathBuf,

        /// Label template; {n} is the page number and {total} the page count
        #[arg(short, long, default_value = DEFAULT_PAGE_NUMBER_FORMAT)]
        format: String,

        /// Output file
        #[arg(short, long, default_value = "numbered.pdf")]
        output: PathBuf,
    },

    /// Delete the last page of a PDF
    RemoveLastPage {
        /// PDF file to edit
        path: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "organized.pdf")]
        output: PathBuf,
    },

    /// Draw a line of text on one page
    AddText {
        /// PDF file to edit
        path: PathBuf,

        /// Text to draw
        text: String,

        /// Page to draw on (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Distance from the left edge in points
        #[arg(long, default_value_t = TextStamp::MARGIN)]
        x: f32,

        /// Baseline height in points (one margin below the top if omitted)
        #[arg(long)]
        y: Option<f32>,

        /// Font size in points
        #[arg(long, default_value_t = TextStamp::DEFAULT_SIZE)]
        size: f32,

        /// Text colour as #rrggbb
        #[arg(long)]
        color: Option<String>,

        /// Output file
        #[arg(short, long, default_value = "edited.pdf")]
        output: PathBuf,
    },

    /// Password-protect a PDF
    Protect {
        /// PDF file to protect
        path: PathBuf,

        /// Password needed to open the document
        password: String,

        /// Password that lifts the restrictions (same as the password if omitted)
        #[arg(long)]
        owner_password: Option<String>,

        /// Allow printing
        #[arg(long)]
        allow_print: bool,

        /// Allow copying text and images
        #[arg(long)]
        allow_copy: bool,

        /// Allow editing
        #[arg(long)]
        allow_modify: bool,

        /// Output file
        #[arg(short, long, default_value = "protected.pdf")]
        output: PathBuf,
    },

    /// Remove the password from a protected PDF
    Unlock {
        /// Protected PDF file
        path: PathBuf,

        /// Password of the document
        password: String,

        /// Output file
        #[arg(short, long, default_value = "unlocked.pdf")]
        output: PathBuf,
    },

    /// Combine JPEG images into a PDF, one page each
    #[command(alias = "images-to-pdf")]
    JpgToPdf {
        /// JPEG files in page order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Page size
        #[arg(short, long, value_enum, default_value_t = ImageLayout::Image)]
        layout: ImageLayout,

        /// Output file
        #[arg(short, long, default_value = "images.pdf")]
        output: PathBuf,
    },

    /// Print the text a QR code would encode
    Qr {
        #[command(subcommand)]
        payload: QrCommand,
    },
}

#[derive(Subcommand)]
pub enum QrCommand {
    /// Encode a URL
    Url { url: String },

    /// Encode free text
    Text { text: String },

    /// Encode Wi-Fi network credentials
    Wifi {
        /// Network name
        ssid: String,

        /// Network password
        #[arg(short, long, default_value = "")]
        password: String,

        /// Security type
        #[arg(short, long, value_enum, default_value_t = WifiSecurity::Wpa)]
        security: WifiSecurity,
    },
}
