use super::types::{Chunker, TextChunk};

/// Widest UTF-8 character, in bytes.
const MIN_WINDOW_BYTES: usize = 4;

/// Heading-aware chunker for guideline documents.
/// Splits by Markdown headings first, then by paragraphs for large sections,
/// then by sentences for oversized paragraphs.
pub struct GuidelineChunker {
    max_chunk_chars: usize,
    min_chunk_chars: usize,
    overlap_chars: usize,
}

impl GuidelineChunker {
    pub fn new() -> Self {
        Self {
            max_chunk_chars: 2000,
            min_chunk_chars: 20,
            overlap_chars: 100,
        }
    }

    /// `max_chunk_chars` is raised to at least one UTF-8 character width.
    pub fn with_limits(max_chunk_chars: usize, overlap_chars: usize) -> Self {
        let max_chunk_chars = max_chunk_chars.max(MIN_WINDOW_BYTES);
        Self {
            max_chunk_chars,
            min_chunk_chars: 20,
            overlap_chars: overlap_chars.min(max_chunk_chars / 2),
        }
    }
}

impl Default for GuidelineChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for GuidelineChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();

        for section in split_by_headings(text) {
            if section.content.len() <= self.max_chunk_chars {
                chunks.push(TextChunk {
                    content: section.content,
                    chunk_index: 0,
                    section_title: section.title,
                    char_offset: section.offset,
                });
            } else {
                split_section(&section, self.max_chunk_chars, self.overlap_chars, &mut chunks);
            }
        }

        merge_tiny_chunks(&mut chunks, self.min_chunk_chars);
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.chunk_index = i;
        }
        chunks
    }
}

struct Section {
    title: Option<String>,
    content: String,
    offset: usize,
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=3).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn split_by_headings(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut title: Option<String> = None;
    let mut content = String::new();
    let mut offset = 0;
    let mut pos = 0;

    for line in text.lines() {
        if is_heading(line) {
            if !content.trim().is_empty() {
                sections.push(Section {
                    title: title.take(),
                    content: content.trim().to_string(),
                    offset,
                });
            }
            title = Some(line.trim_start_matches('#').trim().to_string());
            content.clear();
            offset = pos;
        } else {
            content.push_str(line);
            content.push('\n');
        }
        pos += line.len() + 1;
    }

    if !content.trim().is_empty() {
        sections.push(Section {
            title,
            content: content.trim().to_string(),
            offset,
        });
    }

    sections
}

/// Largest char boundary of `s` at or below `idx`.
fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Trailing slice of `s` at most `overlap` bytes long.
fn overlap_tail(s: &str, overlap: usize) -> &str {
    if s.len() <= overlap {
        return s;
    }
    let mut start = s.len() - overlap;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

fn split_section(section: &Section, max_chars: usize, overlap: usize, out: &mut Vec<TextChunk>) {
    let mut current = String::new();
    let mut offset = section.offset;

    for para in section.content.split("\n\n") {
        if current.len() + para.len() > max_chars && !current.trim().is_empty() {
            let content = current.trim().to_string();
            let tail = overlap_tail(&current, overlap).to_string();
            offset += current.len() - tail.len();
            out.push(TextChunk {
                content,
                chunk_index: 0,
                section_title: section.title.clone(),
                char_offset: offset,
            });
            current = tail;
        }

        if para.len() > max_chars {
            split_long_paragraph(para, &section.title, offset, max_chars, overlap, out);
            offset += para.len();
            current.clear();
        } else {
            current.push_str(para);
            current.push_str("\n\n");
        }
    }

    if !current.trim().is_empty() {
        out.push(TextChunk {
            content: current.trim().to_string(),
            chunk_index: 0,
            section_title: section.title.clone(),
            char_offset: offset,
        });
    }
}

fn split_long_paragraph(
    para: &str,
    title: &Option<String>,
    base_offset: usize,
    max_chars: usize,
    overlap: usize,
    out: &mut Vec<TextChunk>,
) {
    let mut start = 0;

    while start < para.len() {
        let end = floor_boundary(para, start + max_chars);

        // Prefer a sentence break in the last fifth of the window
        let mut break_at = if end < para.len() {
            let search_start = floor_boundary(para, start + max_chars * 4 / 5);
            para[search_start..end]
                .rfind(". ")
                .map(|pos| search_start + pos + 2)
                .unwrap_or(end)
        } else {
            end
        };
        if break_at <= start {
            // Window narrower than the next character
            break_at = start + para[start..].chars().next().map_or(0, char::len_utf8);
        }

        let piece = para[start..break_at].trim();
        if !piece.is_empty() {
            out.push(TextChunk {
                content: piece.to_string(),
                chunk_index: 0,
                section_title: title.clone(),
                char_offset: base_offset + start,
            });
        }

        if break_at >= para.len() {
            break;
        }

        let next = floor_boundary(para, break_at.saturating_sub(overlap));
        start = if next > start { next } else { break_at };
    }
}

fn merge_tiny_chunks(chunks: &mut Vec<TextChunk>, min_chars: usize) {
    let mut i = 0;
    while i < chunks.len() {
        if chunks[i].content.len() < min_chars && i + 1 < chunks.len() {
            let next = chunks.remove(i + 1);
            chunks[i].content.push_str("\n\n");
            chunks[i].content.push_str(&next.content);
        } else {
            i += 1;
        }
    }
}
