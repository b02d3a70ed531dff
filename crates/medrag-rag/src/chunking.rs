//! Fixed-size overlapping chunking

use medrag_core::{Chunk, IndexingConfig, PageText};

/// Split one page of a source file into overlapping chunks.
///
/// Spans are measured in characters. Each chunk's text is exactly the page
/// text between its `start` and `end` offsets; whitespace-only spans are
/// dropped.
pub fn chunk_page(source: &str, file_path: &str, page: &PageText, cfg: &IndexingConfig) -> Vec<Chunk> {
    let chars: Vec<char> = page.text.chars().collect();
    let len_chars = chars.len();
    let mut chunks = Vec::new();

    let span = |start: usize, end: usize, n: usize| Chunk {
        id: format!("{}#p{}c{}", source, page.page, n),
        text: chars[start..end].iter().collect(),
        source: source.to_string(),
        file_path: file_path.to_string(),
        page: page.page,
        start,
        end,
    };

    let size = cfg.chunk_size;
    if size == 0 {
        if !page.text.trim().is_empty() {
            chunks.push(span(0, len_chars, 0));
        }
        return chunks;
    }

    let mut overlap = cfg.chunk_overlap;
    if overlap >= size {
        overlap = size / 4;
    }

    let mut start = 0usize;
    while start < len_chars {
        let end = (start + size).min(len_chars);
        let chunk = span(start, end, chunks.len());
        if !chunk.text.trim().is_empty() {
            chunks.push(chunk);
        }
        if end == len_chars {
            break;
        }
        start = end - overlap;
    }

    chunks
}
