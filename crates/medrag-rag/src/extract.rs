//! Text extraction from source files

use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;

use medrag_core::{Error, PageText, Result};

/// Source formats the processor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Docx,
    Text,
}

impl SourceKind {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<SourceKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "docx" => Some(SourceKind::Docx),
            "txt" | "md" => Some(SourceKind::Text),
            _ => None,
        }
    }
}

/// Whether the processor would pick up this file
pub fn is_supported(path: &Path) -> bool {
    SourceKind::from_path(path).is_some()
}

/// Extract the text of every page of a file.
///
/// DOCX and plain-text files are a single page. Blocking; run it off the
/// async executor.
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>> {
    let kind = SourceKind::from_path(path).ok_or_else(|| {
        Error::Extraction(format!("unsupported file type: {}", path.display()))
    })?;
    let bytes = std::fs::read(path)?;
    extract_pages_from_bytes(kind, &bytes)
}

pub fn extract_pages_from_bytes(kind: SourceKind, bytes: &[u8]) -> Result<Vec<PageText>> {
    let pages = match kind {
        SourceKind::Pdf => pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| Error::Extraction(format!("PDF extraction failed: {}", e)))?,
        SourceKind::Docx => vec![docx_text(bytes)?],
        SourceKind::Text => vec![String::from_utf8_lossy(bytes).into_owned()],
    };

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| PageText { page, text })
        .collect())
}

fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("not a DOCX archive: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Extraction(format!("DOCX has no document body: {}", e)))?
        .read_to_string(&mut xml)?;
    Ok(docx_xml_to_text(&xml))
}

/// Flatten WordprocessingML into plain text, one paragraph per line
pub(crate) fn docx_xml_to_text(xml: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

    let xml = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");
    let text = tag.replace_all(&xml, "");

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
