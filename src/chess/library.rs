//! Chapter files on disk: `root/<level>/<chapter>.pgn[.zst]`.
//!
//! Retrieval never fails towards the engine. Missing directories, unreadable
//! files and broken compression are logged and come back as empty results.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zstd::stream::read::Decoder as ZstdDecoder;

use super::chapter::Chapter;
use super::error::StudyError;

const CHAPTER_PATTERNS: [&str; 2] = ["*.pgn", "*.pgn.zst"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    /// File name without the `.pgn` / `.pgn.zst` suffix.
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Level names (subdirectories of the root), sorted.
    pub fn levels(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list levels in '{}': {e}", self.root.display());
                return Vec::new();
            }
        };

        let mut levels: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().to_str().map(String::from))
            .collect();
        levels.sort();
        levels
    }

    /// Chapter files of one level, sorted by path.
    pub fn chapters(&self, level: &str) -> Vec<ChapterFile> {
        let dir = self.root.join(level);
        let escaped = glob::Pattern::escape(&dir.to_string_lossy());

        let mut paths: Vec<PathBuf> = Vec::new();
        for suffix in CHAPTER_PATTERNS {
            let pattern = format!("{escaped}/{suffix}");
            match glob::glob(&pattern) {
                Ok(entries) => paths.extend(entries.filter_map(|entry| entry.ok())),
                Err(e) => tracing::warn!("Invalid chapter pattern '{pattern}': {e}"),
            }
        }
        paths.sort();
        paths.dedup();

        paths
            .into_iter()
            .map(|path| ChapterFile {
                name: chapter_name(&path),
                path,
            })
            .collect()
    }

    /// File contents, zstd-decoded for `.zst` files. Empty on any failure.
    pub fn read(&self, path: &Path) -> String {
        match read_text(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{e}");
                String::new()
            }
        }
    }

    pub fn load(&self, path: &Path) -> Chapter {
        Chapter::parse(&self.read(path))
    }
}

fn chapter_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .strip_suffix(".zst")
        .unwrap_or(&file_name)
        .strip_suffix(".pgn")
        .map(String::from)
        .unwrap_or_else(|| file_name.clone())
}

fn open_input_stream(path: &Path) -> Result<Box<dyn Read>, StudyError> {
    let io_error = |source: io::Error| StudyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;

    match CompressionMode::for_path(path) {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as Box<dyn Read>)
            .map_err(io_error),
    }
}

/// Reads a whole chapter file. Invalid UTF-8 is replaced rather than rejected.
pub fn read_text(path: &Path) -> Result<String, StudyError> {
    let mut input = open_input_stream(path)?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|source| StudyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
