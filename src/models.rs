use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of scanning one document
///
/// Blocks only appear once they have at least one missing line, so a fully
/// commented block is never a key of `missing_by_block`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MissingByBlock")]
pub struct ScanResult {
    /// Total missing lines across all blocks
    total_missing: usize,

    /// Block start line (the opening fence) to missing line numbers, ascending
    missing_by_block: BTreeMap<usize, Vec<usize>>,
}

/// Serialized form of a result; the total is derived from the blocks
#[derive(Deserialize)]
struct MissingByBlock {
    missing_by_block: BTreeMap<usize, Vec<usize>>,
}

impl From<MissingByBlock> for ScanResult {
    fn from(raw: MissingByBlock) -> Self {
        let total_missing = raw.missing_by_block.values().map(Vec::len).sum();
        Self {
            total_missing,
            missing_by_block: raw.missing_by_block,
        }
    }
}

impl ScanResult {
    pub(crate) fn record_missing(&mut self, block_start: usize, line_number: usize) {
        self.missing_by_block
            .entry(block_start)
            .or_default()
            .push(line_number);
        self.total_missing += 1;
    }

    pub fn total_missing(&self) -> usize {
        self.total_missing
    }

    pub fn is_clean(&self) -> bool {
        self.total_missing == 0
    }

    /// Number of blocks with at least one missing line
    pub fn block_count(&self) -> usize {
        self.missing_by_block.len()
    }

    /// Blocks with missing lines in ascending start order
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.missing_by_block
            .iter()
            .map(|(start, lines)| (*start, lines.as_slice()))
    }

    pub fn missing_in(&self, block_start: usize) -> Option<&[usize]> {
        self.missing_by_block.get(&block_start).map(Vec::as_slice)
    }

    /// Get the blocks with the most missing lines
    ///
    /// Ties keep discovery order, which is ascending start line.
    pub fn top_blocks(&self, limit: usize) -> Vec<BlockSummary> {
        let mut summaries: Vec<BlockSummary> = self
            .blocks()
            .map(|(block_start, lines)| BlockSummary {
                block_start,
                missing: lines.len(),
            })
            .collect();

        // sort_by is stable
        summaries.sort_by(|a, b| b.missing.cmp(&a.missing));
        summaries.truncate(limit);
        summaries
    }
}

/// Missing-line count for a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub block_start: usize,
    pub missing: usize,
}

/// Scan result for one document on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAudit {
    pub path: PathBuf,
    pub result: ScanResult,
}

/// Complete report over every document that was scanned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Per-document results, sorted by path
    pub files: Vec<FileAudit>,

    /// Missing lines across every document
    pub total_missing: usize,

    /// Number of documents with at least one missing line
    pub files_with_missing: usize,

    /// Path that was scanned
    pub scan_path: PathBuf,

    /// When the scan was performed
    pub scan_time: DateTime<Utc>,
}

impl AuditReport {
    pub fn new(files: Vec<FileAudit>, scan_path: PathBuf) -> Self {
        let total_missing = files.iter().map(|f| f.result.total_missing()).sum();
        let files_with_missing = files.iter().filter(|f| !f.result.is_clean()).count();

        Self {
            files,
            total_missing,
            files_with_missing,
            scan_path,
            scan_time: Utc::now(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.total_missing == 0
    }
}

/// Configuration for fencecheck
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Fence tag that marks a code block to audit
    #[serde(default = "default_language")]
    pub language: String,

    /// Single-line comment marker of the audited language
    #[serde(default = "default_comment_marker")]
    pub comment_marker: String,

    /// Multi-line string delimiters, in search priority order
    #[serde(default = "default_string_delimiters")]
    pub string_delimiters: Vec<String>,

    /// Document extensions picked up when scanning a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directories to ignore during scanning
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            comment_marker: default_comment_marker(),
            string_delimiters: default_string_delimiters(),
            extensions: default_extensions(),
            ignored_dirs: default_ignored_dirs(),
        }
    }
}

impl Config {
    /// Reject settings the scanner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            bail!("language must not be empty");
        }
        if self.comment_marker.is_empty() {
            bail!("comment_marker must not be empty");
        }
        if self.string_delimiters.is_empty() {
            bail!("string_delimiters must list at least one delimiter");
        }
        if self.string_delimiters.iter().any(String::is_empty) {
            bail!("string_delimiters must not contain an empty delimiter");
        }
        Ok(())
    }
}

fn default_language() -> String {
    "python".to_string()
}

fn default_comment_marker() -> String {
    "#".to_string()
}

fn default_string_delimiters() -> Vec<String> {
    vec!["\"\"\"".to_string(), "'''".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

fn default_ignored_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        "target".to_string(),
        ".venv".to_string(),
        "venv".to_string(),
        "__pycache__".to_string(),
    ]
}
