//! Reference corpus loading.
//!
//! Reads every regular file of the corpus directory into a [`Document`].
//! The format is detected from magic bytes, not extensions: PDFs go through
//! `pdf-extract`, anything that looks like UTF-8 text is read as-is, and the
//! rest is skipped with a warning.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Files above this size are skipped.
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Bytes inspected when deciding whether a file is text.
const TEXT_SNIFF_BYTES: usize = 8192;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Corpus path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("PDF parsing failed for {path}: {reason}")]
    PdfParsing { path: PathBuf, reason: String },

    #[error("No readable documents found in {0}")]
    NoDocuments(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Pdf,
    PlainText,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "plain_text",
            Self::Unsupported => "unsupported",
        }
    }
}

/// One loaded reference document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    /// File name relative to the corpus directory, used as the source label.
    pub source_name: String,
    pub path: PathBuf,
    pub category: FileCategory,
    pub text: String,
}

/// Detect a file's category from its first bytes.
pub fn detect_format(path: &Path) -> Result<FileCategory, CorpusError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_FILE_SIZE {
        return Ok(FileCategory::Unsupported);
    }

    let mut file = std::fs::File::open(path)?;
    let mut header = vec![0u8; TEXT_SNIFF_BYTES];
    let bytes_read = file.read(&mut header)?;
    header.truncate(bytes_read);

    if header.starts_with(b"%PDF") {
        return Ok(FileCategory::Pdf);
    }

    if is_likely_text(&header) {
        Ok(FileCategory::PlainText)
    } else {
        Ok(FileCategory::Unsupported)
    }
}

/// UTF-8 with no NUL bytes. A multi-byte character cut off by the sniff
/// window still counts as text.
fn is_likely_text(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return false;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Extract the text of one file according to its category.
pub fn extract_text(path: &Path, category: FileCategory) -> Result<Option<String>, CorpusError> {
    match category {
        FileCategory::PlainText => {
            let bytes = std::fs::read(path)?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        FileCategory::Pdf => {
            let bytes = std::fs::read(path)?;
            let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                CorpusError::PdfParsing {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Some(text))
        }
        FileCategory::Unsupported => Ok(None),
    }
}

/// Load every supported file under `dir`, sorted by relative path.
///
/// Hidden entries (leading `.`) are ignored. With `recursive`, sub-
/// directories are walked too. A file that cannot be read or parsed is
/// logged and skipped. Fails when the directory is missing or nothing
/// readable is found.
pub fn load_corpus(dir: &Path, recursive: bool) -> Result<Vec<Document>, CorpusError> {
    if !dir.exists() {
        return Err(CorpusError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(CorpusError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_files(dir, recursive, &mut files)?;
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let source_name = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();

        match load_document(path, source_name) {
            Ok(Some(doc)) => documents.push(doc),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable corpus file"),
        }
    }

    if documents.is_empty() {
        return Err(CorpusError::NoDocuments(dir.to_path_buf()));
    }

    tracing::info!(dir = %dir.display(), documents = documents.len(), "Corpus loaded");
    Ok(documents)
}

/// Read one file. `Ok(None)` means the file was skipped on purpose;
/// errors are per-file and never fatal to the corpus as a whole.
fn load_document(path: PathBuf, source_name: String) -> Result<Option<Document>, CorpusError> {
    let category = detect_format(&path)?;
    let Some(text) = extract_text(&path, category)? else {
        tracing::warn!(file = %source_name, "Skipping unsupported corpus file");
        return Ok(None);
    };

    if text.trim().is_empty() {
        tracing::warn!(file = %source_name, "Skipping corpus file with no text");
        return Ok(None);
    }

    tracing::debug!(
        file = %source_name,
        category = category.as_str(),
        chars = text.len(),
        "Loaded corpus document"
    );

    Ok(Some(Document {
        id: Uuid::new_v4(),
        source_name,
        path,
        category,
        text,
    }))
}

fn collect_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), CorpusError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if recursive {
                collect_files(&path, recursive, out)?;
            }
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
