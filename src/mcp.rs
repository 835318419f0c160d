use anyhow::{Context, Result};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::page_range::resolve_page_indices;
use crate::pdf::backend::Protection;
use crate::pdf::tools::{
    add_text, images_to_document, merge_documents, number_pages, parse_hex_color,
    protect_document, remove_last_page, rotate_document, split_document, watermark_document,
    ImageLayout, TextStamp, Watermark, DEFAULT_PAGE_NUMBER_FORMAT,
};
use clap::ValueEnum;
use crate::pdf::{DocumentBackend, LopdfBackend, Rotation};
use crate::tabular::{delimited_to_json, json_to_delimited, DEFAULT_DELIMITER};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JsonToCsvRequest {
    #[schemars(description = "JSON text holding a non-empty array of objects")]
    pub json: String,
    #[schemars(description = "Field delimiter (default: ',')")]
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CsvToJsonRequest {
    #[schemars(description = "Delimited text, one record per line")]
    pub csv: String,
    #[schemars(description = "Field delimiter (default: ',')")]
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[schemars(description = "Whether the first line is a header (default: true)")]
    #[serde(default = "default_true")]
    pub has_header: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolvePagesRequest {
    #[schemars(description = "Page ranges (e.g., '1-3,5')")]
    pub pages: String,
    #[schemars(description = "Number of pages in the document")]
    pub page_count: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "Paths of the PDF files to merge, in order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges (e.g., '1-3,5')")]
    pub pages: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfRotateRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Clockwise rotation in degrees: 90, 180 or 270 (default: 90)")]
    #[serde(default = "default_angle")]
    pub angle: i64,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfWatermarkRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Watermark text")]
    pub text: String,
    #[schemars(description = "Font size in points (default: 50)")]
    pub size: Option<f32>,
    #[schemars(description = "Opacity between 0 and 1 (default: 0.2)")]
    pub opacity: Option<f32>,
    #[schemars(description = "Text colour as #rrggbb")]
    pub color: Option<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfNumberPagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Label template with {n} and {total} (default: 'Page {n} of {total}')")]
    pub format: Option<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfRemoveLastPageRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfAddTextRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Text to draw")]
    pub text: String,
    #[schemars(description = "Page to draw on, 1-based (default: 1)")]
    pub page: Option<usize>,
    #[schemars(description = "Distance from the left edge in points (default: 60)")]
    pub x: Option<f32>,
    #[schemars(description = "Baseline height in points (default: 60 below the top edge)")]
    pub y: Option<f32>,
    #[schemars(description = "Font size in points (default: 24)")]
    pub size: Option<f32>,
    #[schemars(description = "Text colour as #rrggbb (default: red)")]
    pub color: Option<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfProtectRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Password needed to open the document")]
    pub password: String,
    #[schemars(description = "Password that lifts the restrictions (default: same as password)")]
    pub owner_password: Option<String>,
    #[schemars(description = "Allow printing (default: false)")]
    #[serde(default)]
    pub allow_printing: bool,
    #[schemars(description = "Allow copying text and images (default: false)")]
    #[serde(default)]
    pub allow_copying: bool,
    #[schemars(description = "Allow editing (default: false)")]
    #[serde(default)]
    pub allow_modifying: bool,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfUnlockRequest {
    #[schemars(description = "Path to the password-protected PDF file")]
    pub path: String,
    #[schemars(description = "Password of the document")]
    pub password: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JpgToPdfRequest {
    #[schemars(description = "Paths of the JPEG images, one page each, in order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Page size: 'image', 'a4' or 'letter' (default: 'image')")]
    pub layout: Option<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_true() -> bool {
    true
}

fn default_angle() -> i64 {
    90
}

fn rotation_from_degrees(angle: i64) -> Result<Rotation> {
    match angle.rem_euclid(360) {
        90 => Ok(Rotation::Right),
        180 => Ok(Rotation::Down),
        270 => Ok(Rotation::Left),
        _ => anyhow::bail!("Rotation must be 90, 180 or 270 degrees, got {}", angle),
    }
}

fn image_layout(name: Option<&str>) -> Result<ImageLayout> {
    match name {
        None => Ok(ImageLayout::default()),
        Some(name) => ImageLayout::from_str(name, true)
            .map_err(|_| anyhow::anyhow!("Layout must be image, a4 or letter, got {}", name)),
    }
}

/// Run a tool body, rendering failures the way the tools report them.
fn respond(result: Result<String>) -> String {
    result.unwrap_or_else(|e| format!("Error: {}", e))
}

/// Open `path`, apply `edit`, save to `output` and report the page count.
fn edit_pdf(
    path: &str,
    output: &str,
    edit: impl FnOnce(&LopdfBackend, &mut lopdf::Document) -> Result<()>,
) -> Result<String> {
    let backend = LopdfBackend;
    let mut doc = backend.open(path)?;
    edit(&backend, &mut doc)?;
    let page_count = backend.page_count(&doc);
    backend.write(&mut doc, output)?;
    to_json(&PdfOutputResult {
        output_path: output.to_string(),
        page_count,
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Debug, Clone)]
pub struct ToolsServer {
    tool_router: ToolRouter<Self>,
}

impl ToolsServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for ToolsServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl ToolsServer {
    #[tool(description = "Convert a JSON array of objects to CSV. Every cell is double-quoted.")]
    fn json_to_csv(&self, Parameters(req): Parameters<JsonToCsvRequest>) -> String {
        info!("json_to_csv");
        respond(json_to_delimited(&req.json, &req.delimiter).map_err(Into::into))
    }

    #[tool(description = "Convert delimited text to a JSON array of objects (with header) or arrays (without)")]
    fn csv_to_json(&self, Parameters(req): Parameters<CsvToJsonRequest>) -> String {
        info!(has_header = req.has_header, "csv_to_json");
        respond(delimited_to_json(&req.csv, &req.delimiter, req.has_header).map_err(Into::into))
    }

    #[tool(description = "Resolve a page range list like '1-3,5' into sorted zero-based page indices")]
    fn resolve_pages(&self, Parameters(req): Parameters<ResolvePagesRequest>) -> String {
        info!(pages = %req.pages, page_count = req.page_count, "resolve_pages");
        respond(
            resolve_page_indices(&req.pages, req.page_count)
                .map_err(Into::into)
                .and_then(|indices| to_json(&indices)),
        )
    }

    #[tool(description = "Merge PDF files in order into a new PDF")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        info!(inputs = req.inputs.len(), "pdf_merge");
        respond((|| -> Result<String> {
            let backend = LopdfBackend;
            let docs = req
                .inputs
                .iter()
                .map(|input| backend.open(input))
                .collect::<Result<Vec<_>>>()?;
            let mut merged = merge_documents(&backend, docs)?;
            let page_count = backend.page_count(&merged);
            backend.write(&mut merged, &req.output)?;
            to_json(&PdfOutputResult {
                output_path: req.output.clone(),
                page_count,
            })
        })())
    }

    #[tool(description = "Extract the pages selected by a page range list like '1-3,5' into a new PDF")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        info!(path = %req.path, pages = %req.pages, "pdf_split");
        respond((|| -> Result<String> {
            let backend = LopdfBackend;
            let doc = backend.open(&req.path)?;
            let mut new_doc = split_document(&backend, &doc, &req.pages)?;
            let page_count = backend.page_count(&new_doc);
            backend.write(&mut new_doc, &req.output)?;
            to_json(&PdfOutputResult {
                output_path: req.output.clone(),
                page_count,
            })
        })())
    }

    #[tool(description = "Rotate every page of a PDF clockwise by 90, 180 or 270 degrees")]
    fn pdf_rotate(&self, Parameters(req): Parameters<PdfRotateRequest>) -> String {
        info!(path = %req.path, angle = req.angle, "pdf_rotate");
        respond(rotation_from_degrees(req.angle).and_then(|rotation| {
            edit_pdf(&req.path, &req.output, |backend, doc| {
                rotate_document(backend, doc, rotation)
            })
        }))
    }

    #[tool(description = "Stamp diagonal watermark text across every page of a PDF")]
    fn pdf_watermark(&self, Parameters(req): Parameters<PdfWatermarkRequest>) -> String {
        info!(path = %req.path, "pdf_watermark");
        respond((|| -> Result<String> {
            let mut watermark = Watermark::new(req.text.clone());
            if let Some(size) = req.size {
                watermark.size = size;
            }
            if let Some(opacity) = req.opacity {
                watermark.opacity = opacity;
            }
            if let Some(color) = &req.color {
                watermark.color = parse_hex_color(color)?;
            }
            edit_pdf(&req.path, &req.output, |backend, doc| {
                watermark_document(backend, doc, &watermark)
            })
        })())
    }

    #[tool(description = "Write page numbers in the bottom-right corner of every page of a PDF")]
    fn pdf_number_pages(&self, Parameters(req): Parameters<PdfNumberPagesRequest>) -> String {
        info!(path = %req.path, "pdf_number_pages");
        let format = req
            .format
            .as_deref()
            .unwrap_or(DEFAULT_PAGE_NUMBER_FORMAT);
        respond(edit_pdf(&req.path, &req.output, |backend, doc| {
            number_pages(backend, doc, format)
        }))
    }

    #[tool(description = "Delete the last page of a PDF that has more than one page")]
    fn pdf_remove_last_page(
        &self,
        Parameters(req): Parameters<PdfRemoveLastPageRequest>,
    ) -> String {
        info!(path = %req.path, "pdf_remove_last_page");
        respond(edit_pdf(&req.path, &req.output, |backend, doc| {
            remove_last_page(backend, doc)
        }))
    }

    #[tool(description = "Draw a line of text on one page of a PDF, by default red Helvetica near the top-left of page 1")]
    fn pdf_add_text(&self, Parameters(req): Parameters<PdfAddTextRequest>) -> String {
        info!(path = %req.path, page = ?req.page, "pdf_add_text");
        respond((|| -> Result<String> {
            let mut stamp = TextStamp::new(req.text.clone());
            if let Some(page) = req.page {
                stamp.page = page;
            }
            if let Some(x) = req.x {
                stamp.x = x;
            }
            stamp.y = req.y;
            if let Some(size) = req.size {
                stamp.size = size;
            }
            if let Some(color) = &req.color {
                stamp.color = parse_hex_color(color)?;
            }
            edit_pdf(&req.path, &req.output, |backend, doc| {
                add_text(backend, doc, &stamp)
            })
        })())
    }

    #[tool(description = "Password-protect a PDF. Printing, copying and editing are denied unless allowed.")]
    fn pdf_protect(&self, Parameters(req): Parameters<PdfProtectRequest>) -> String {
        info!(path = %req.path, "pdf_protect");
        let mut protection = Protection::new(req.password.clone());
        if let Some(owner_password) = &req.owner_password {
            protection.owner_password = owner_password.clone();
        }
        protection.allow_printing = req.allow_printing;
        protection.allow_copying = req.allow_copying;
        protection.allow_modifying = req.allow_modifying;
        respond(edit_pdf(&req.path, &req.output, |backend, doc| {
            protect_document(backend, doc, &protection)
        }))
    }

    #[tool(description = "Remove the password from a protected PDF")]
    fn pdf_unlock(&self, Parameters(req): Parameters<PdfUnlockRequest>) -> String {
        info!(path = %req.path, "pdf_unlock");
        respond((|| -> Result<String> {
            let backend = LopdfBackend;
            let bytes = std::fs::read(&req.path)
                .with_context(|| format!("Failed to read PDF: {}", req.path))?;
            let mut doc = backend.unlock(&bytes, &req.password)?;
            let page_count = backend.page_count(&doc);
            backend.write(&mut doc, &req.output)?;
            to_json(&PdfOutputResult {
                output_path: req.output.clone(),
                page_count,
            })
        })())
    }

    #[tool(description = "Convert JPEG images into a PDF with one page per image")]
    fn jpg_to_pdf(&self, Parameters(req): Parameters<JpgToPdfRequest>) -> String {
        info!(inputs = req.inputs.len(), "jpg_to_pdf");
        respond((|| -> Result<String> {
            let layout = image_layout(req.layout.as_deref())?;
            let images = req
                .inputs
                .iter()
                .map(|input| {
                    std::fs::read(input).with_context(|| format!("Failed to read image: {}", input))
                })
                .collect::<Result<Vec<_>>>()?;
            let backend = LopdfBackend;
            let mut doc = images_to_document(&backend, &images, layout)?;
            let page_count = backend.page_count(&doc);
            backend.write(&mut doc, &req.output)?;
            to_json(&PdfOutputResult {
                output_path: req.output.clone(),
                page_count,
            })
        })())
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfOutputResult {
    pub output_path: String,
    pub page_count: usize,
}

#[tool_handler]
impl ServerHandler for ToolsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "File conversion and PDF tools. Use json_to_csv and csv_to_json to convert \
                 tabular data, resolve_pages to check a page range list, jpg_to_pdf to turn \
                 JPEG images into a PDF, and the pdf_* tools to merge, split, rotate, \
                 watermark, number, annotate, protect, unlock or trim PDF files on disk."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = ToolsServer::new();
    info!("Starting doctools MCP server v{}", env!("CARGO_PKG_VERSION"));

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
