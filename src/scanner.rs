use crate::error::{Result, ScanError};
use crate::models::{Config, FileAudit, ScanResult};
use ignore::WalkBuilder;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const FENCE: &str = "```";

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Language-specific constants the scanner matches against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    /// Fence tag to audit, lowercase
    pub language: String,

    /// Marker that makes a line count as commented
    pub comment_marker: String,

    /// Multi-line string delimiters; earlier entries win when several occur on a line
    pub string_delimiters: Vec<String>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ScannerSettings {
    fn from(config: &Config) -> Self {
        Self {
            language: config.language.trim().to_lowercase(),
            comment_marker: config.comment_marker.clone(),
            string_delimiters: config.string_delimiters.clone(),
        }
    }
}

/// Mutable state threaded through a single pass over a document
///
/// `block_start` is set exactly while inside a target-language fence and
/// `open_delimiter` exactly while inside an unterminated multi-line string.
#[derive(Debug, Default)]
struct ScanState<'a> {
    block_start: Option<usize>,
    open_delimiter: Option<&'a str>,
}

impl ScanState<'_> {
    fn enter_block(&mut self, line_number: usize) {
        self.block_start = Some(line_number);
        self.open_delimiter = None;
    }

    fn leave_block(&mut self) {
        self.block_start = None;
        self.open_delimiter = None;
    }
}

/// Flags lines of target-language code blocks that carry no comment
#[derive(Debug, Clone, Default)]
pub struct BlockCommentScanner {
    settings: ScannerSettings,
}

impl BlockCommentScanner {
    pub fn new(settings: ScannerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Scan a whole document held in memory
    pub fn scan_str(&self, text: &str) -> ScanResult {
        self.scan_lines(split_physical_lines(text))
    }

    /// Scan a document given as physical lines, numbered from 1
    pub fn scan_lines<'l, I>(&self, lines: I) -> ScanResult
    where
        I: IntoIterator<Item = &'l str>,
    {
        let mut state = ScanState::default();
        let mut result = ScanResult::default();

        for (idx, line) in lines.into_iter().enumerate() {
            let line_number = idx + 1;

            if let Some(tag) = line.strip_prefix(FENCE) {
                match state.block_start {
                    None => {
                        if self.is_target_language(tag) {
                            trace!("block opened at line {}", line_number);
                            state.enter_block(line_number);
                        }
                    }
                    Some(start) => {
                        trace!("block from line {} closed at line {}", start, line_number);
                        state.leave_block();
                    }
                }
                continue;
            }

            let Some(block_start) = state.block_start else {
                continue;
            };

            if self.is_missing_comment(line, &mut state) {
                result.record_missing(block_start, line_number);
            }
        }

        result
    }

    fn is_target_language(&self, tag: &str) -> bool {
        tag.trim().to_lowercase() == self.settings.language
    }

    /// Classify one line inside an open block, updating string tracking
    fn is_missing_comment<'a>(&'a self, line: &str, state: &mut ScanState<'a>) -> bool {
        let marker = self.settings.comment_marker.as_str();

        if line.trim().is_empty() {
            return false;
        }
        if line.trim_start().starts_with(marker) {
            return false;
        }

        // Lines touched by a multi-line string are never flagged
        match state.open_delimiter {
            Some(delim) => {
                if is_odd_count(line, delim) {
                    state.open_delimiter = None;
                }
                return false;
            }
            None => {
                if let Some(delim) = self.first_delimiter(line) {
                    if is_odd_count(line, delim) {
                        state.open_delimiter = Some(delim);
                    }
                    return false;
                }
            }
        }

        !line.contains(marker)
    }

    fn first_delimiter(&self, line: &str) -> Option<&str> {
        self.settings
            .string_delimiters
            .iter()
            .map(String::as_str)
            .find(|delim| line.contains(delim))
    }

    /// Read and scan a single document from disk
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        if !path.exists() {
            return Err(ScanError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = fs::read_to_string(path).map_err(|source| ScanError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let result = self.scan_str(&text);
        debug!(
            "{}: {} missing in {} block(s)",
            path.display(),
            result.total_missing(),
            result.block_count()
        );

        Ok(result)
    }
}

/// Split text into physical lines
///
/// Breaks on `\n`, `\r`, `\r\n` (one break), vertical tab, form feed,
/// `\x1c`..`\x1e`, NEL and the Unicode line/paragraph separators. A
/// trailing break does not produce an empty final line.
pub fn split_physical_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }

        lines.push(&text[start..idx]);
        let mut end = idx + ch.len_utf8();
        if ch == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
            chars.next();
            end += 1;
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_odd_count(line: &str, delim: &str) -> bool {
    line.matches(delim).count() % 2 == 1
}

/// Scan a document, or every matching document below a directory
///
/// An explicitly named file that cannot be read is an error. Unreadable
/// files found while walking a directory are logged and skipped.
pub fn scan_path(path: &Path, config: &Config) -> Result<Vec<FileAudit>> {
    let scanner = BlockCommentScanner::new(ScannerSettings::from(config));

    if !path.exists() {
        return Err(ScanError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    if !path.is_dir() {
        let result = scanner.scan_file(path)?;
        return Ok(vec![FileAudit {
            path: path.to_path_buf(),
            result,
        }]);
    }

    let documents = collect_documents(path, config);
    debug!("Found {} document(s) under {}", documents.len(), path.display());

    let mut audits: Vec<FileAudit> = documents
        .par_iter()
        .filter_map(|doc| match scanner.scan_file(doc) {
            Ok(result) => Some(FileAudit {
                path: doc.clone(),
                result,
            }),
            Err(err) => {
                warn!("Skipping {}: {}", doc.display(), err);
                None
            }
        })
        .collect();

    audits.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(audits)
}

/// Walk a directory for documents with one of the configured extensions
fn collect_documents(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut walker = WalkBuilder::new(root);
    walker.standard_filters(true); // Respect .gitignore

    let ignored_dirs = config.ignored_dirs.clone();
    walker.filter_entry(move |entry| {
        let name = entry.file_name().to_str().unwrap_or("");
        !ignored_dirs.iter().any(|ignored| ignored == name)
    });

    let mut documents = Vec::new();
    for result in walker.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Walk error: {}", err);
                continue;
            }
        };

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        if !has_document_extension(entry.path(), &config.extensions) {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if metadata.len() > MAX_FILE_SIZE {
                debug!("Skipping {}: larger than 10MB", entry.path().display());
                continue;
            }
        }

        documents.push(entry.into_path());
    }

    documents
}

fn has_document_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn scan(text: &str) -> ScanResult {
        BlockCommentScanner::default().scan_str(text)
    }

    fn blocks(result: &ScanResult) -> Vec<(usize, Vec<usize>)> {
        result
            .blocks()
            .map(|(start, lines)| (start, lines.to_vec()))
            .collect()
    }

    #[test]
    fn test_flags_uncommented_line() {
        let doc = "text\n```python\nx = 1\ny = 2  # ok\n```\n";
        let result = scan(doc);

        assert_eq!(result.total_missing(), 1);
        assert_eq!(blocks(&result), vec![(2, vec![3])]);
    }

    #[test]
    fn test_no_target_blocks() {
        let doc = "# Title\n\nSome prose.\n\n```\nx = 1\n```\n";
        let result = scan(doc);

        assert_eq!(result.total_missing(), 0);
        assert_eq!(result.block_count(), 0);
        assert!(scan("").is_clean());
    }

    #[test]
    fn test_other_language_fence_is_ignored() {
        let doc = "```go\nfmt.Println(1)\nx := 2\n```\n";
        let result = scan(doc);

        assert!(result.is_clean());
        assert_eq!(result.block_count(), 0);
    }

    #[test]
    fn test_fully_commented_block_has_no_key() {
        let doc = "```python\nx = 1  # one\n# just a note\ny = 2 # two\n```\n";
        let result = scan(doc);

        assert!(result.is_clean());
        assert_eq!(result.missing_in(1), None);
    }

    #[test]
    fn test_every_plain_line_is_flagged() {
        let doc = "```python\na = 1\n\nb = 2\n   \nc = a + b\n```\n";
        let result = scan(doc);

        assert_eq!(result.total_missing(), 3);
        assert_eq!(blocks(&result), vec![(1, vec![2, 4, 6])]);
    }

    #[test]
    fn test_multi_line_string_is_exempt() {
        let doc = "```python\ns = \"\"\"start\nend\"\"\"\nprint(s)\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![4])]);
    }

    #[test]
    fn test_string_interior_lines_are_exempt() {
        let doc = "```python\ndef f():\n    '''\n    Docstring body\n    more text\n    '''\n    return 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![2, 7])]);
    }

    #[test]
    fn test_single_line_string_is_exempt() {
        let doc = "```python\nx = \"\"\"inline\"\"\"\ny = 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![3])]);
    }

    #[test]
    fn test_double_quote_delimiter_takes_priority() {
        // Both delimiters on line 2: the double-quote one opens the string,
        // so the lone ''' on line 3 does not close it.
        let doc = "```python\na = ''' + \"\"\"\nb = '''\nc = \"\"\"\nd = 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![5])]);
    }

    #[test]
    fn test_even_count_inside_string_keeps_it_open() {
        let doc = "```python\ns = \"\"\"\n\"\"\" \"\"\"\nstill inside\n\"\"\"\nx = 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![6])]);
    }

    #[test]
    fn test_comment_line_inside_string_does_not_close_it() {
        let doc = "```python\ns = \"\"\"\n# \"\"\"\nstill inside\n\"\"\"\nx = 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![6])]);
    }

    #[test]
    fn test_closing_fence_resets_string_state() {
        let doc = "```python\ns = \"\"\"never closed\n```\n\n```python\nx = 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(5, vec![6])]);
    }

    #[test]
    fn test_any_fence_closes_block() {
        let doc = "```python\nx = 1\n```text\nplain words\n```python\ny = 2\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![2]), (5, vec![6])]);
        assert_eq!(result.total_missing(), 2);
    }

    #[test]
    fn test_language_tag_is_trimmed_and_case_insensitive() {
        let doc = "```  Python  \nx = 1\n```\n";
        assert_eq!(blocks(&scan(doc)), vec![(1, vec![2])]);

        let doc = "```python3\nx = 1\n```\n";
        assert!(scan(doc).is_clean());
    }

    #[test]
    fn test_unterminated_block_still_reports() {
        let doc = "intro\n```python\nx = 1\ny = 2";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(2, vec![3, 4])]);
    }

    #[test]
    fn test_unterminated_string_stops_flagging() {
        let doc = "```python\nx = 1\ns = '''\ny = 2\nz = 3";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![2])]);
    }

    #[test]
    fn test_cr_only_line_endings() {
        let doc = "```python\rx = 1\ry = 2  # ok\r```\r";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![2])]);
    }

    #[test]
    fn test_form_feed_counts_as_line_break() {
        let doc = "intro\x0cpage\n```python\nx = 1\n```\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(3, vec![4])]);
    }

    #[test]
    fn test_split_physical_lines() {
        assert!(split_physical_lines("").is_empty());
        assert_eq!(split_physical_lines("a\n"), vec!["a"]);
        assert_eq!(split_physical_lines("a\r\n\r\nb"), vec!["a", "", "b"]);
        assert_eq!(split_physical_lines("a\rb\n\rc"), vec!["a", "b", "", "c"]);
        assert_eq!(
            split_physical_lines("a\x0bb\u{85}c\u{2028}d\u{2029}e\x1cf"),
            vec!["a", "b", "c", "d", "e", "f"]
        );
        assert_eq!(split_physical_lines("no break"), vec!["no break"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = "```python\r\nx = 1\r\n\r\ny = 2 # c\r\n```\r\n";
        let result = scan(doc);

        assert_eq!(blocks(&result), vec![(1, vec![2])]);
    }

    #[test]
    fn test_scan_is_repeatable() {
        let doc = "```python\nx = 1\n'''\ndoc\n'''\ny = 2\n```\n";
        let scanner = BlockCommentScanner::default();

        assert_eq!(scanner.scan_str(doc), scanner.scan_str(doc));
    }

    #[test]
    fn test_custom_settings() {
        let scanner = BlockCommentScanner::new(ScannerSettings {
            language: "rust".to_string(),
            comment_marker: "//".to_string(),
            string_delimiters: vec!["r#\"".to_string()],
        });
        let doc = "```python\nx = 1\n```\n```rust\nlet a = 1; // one\nlet b = 2;\n# not a comment\n```\n";
        let result = scanner.scan_str(doc);

        assert_eq!(blocks(&result), vec![(4, vec![6, 7])]);
    }

    #[test]
    fn test_scan_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("guide.md");

        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(b"```python\nx = 1\n```\n").unwrap();

        let result = BlockCommentScanner::default().scan_file(&file_path).unwrap();
        assert_eq!(blocks(&result), vec![(1, vec![2])]);
    }

    #[test]
    fn test_scan_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = BlockCommentScanner::default();

        let missing = temp_dir.path().join("absent.md");
        assert!(matches!(
            scanner.scan_file(&missing),
            Err(ScanError::InputNotFound { .. })
        ));

        let binary = temp_dir.path().join("binary.md");
        fs::write(&binary, [0xffu8, 0xfe, 0x00, 0x80]).unwrap();
        assert!(matches!(
            scanner.scan_file(&binary),
            Err(ScanError::InputUnreadable { .. })
        ));
    }

    #[test]
    fn test_scan_path_walks_documents() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("README.md"), "```python\nx = 1\n```\n").unwrap();
        fs::write(root.join("docs/guide.MARKDOWN"), "```python\na = 1\nb = 2\n```\n").unwrap();
        fs::write(root.join("docs/notes.txt"), "```python\nx = 1\n```\n").unwrap();
        fs::write(root.join("node_modules/dep.md"), "```python\nx = 1\n```\n").unwrap();

        let audits = scan_path(root, &Config::default()).unwrap();
        let paths: Vec<PathBuf> = audits.iter().map(|a| a.path.clone()).collect();

        assert_eq!(
            paths,
            vec![root.join("README.md"), root.join("docs/guide.MARKDOWN")]
        );
        assert_eq!(audits[0].result.total_missing(), 1);
        assert_eq!(audits[1].result.total_missing(), 2);
    }

    #[test]
    fn test_scan_path_single_file_and_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("notes.txt");
        fs::write(&file_path, "```python\nx = 1\n```\n").unwrap();

        // Explicit files are scanned regardless of extension
        let audits = scan_path(&file_path, &Config::default()).unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].result.total_missing(), 1);

        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            scan_path(&missing, &Config::default()),
            Err(ScanError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_has_document_extension() {
        let extensions = vec!["md".to_string(), "markdown".to_string()];
        assert!(has_document_extension(Path::new("a.md"), &extensions));
        assert!(has_document_extension(Path::new("a.MD"), &extensions));
        assert!(!has_document_extension(Path::new("a.rs"), &extensions));
        assert!(!has_document_extension(Path::new("README"), &extensions));
    }
}
