//! fencecheck - find uncommented lines in Markdown code samples
//!
//! Scans fenced code blocks tagged with a target language (Python by
//! default) and reports every source line that carries no comment marker.
//! Blank lines, full-line comments and lines inside multi-line string
//! literals are exempt.
//!
//! # Example
//!
//! ```rust
//! use fencecheck::BlockCommentScanner;
//!
//! let doc = "text\n```python\nx = 1\ny = 2  # ok\n```\n";
//! let result = BlockCommentScanner::default().scan_str(doc);
//!
//! assert_eq!(result.total_missing(), 1);
//! assert_eq!(result.missing_in(2), Some(&[3][..]));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use error::ScanError;
pub use models::{AuditReport, BlockSummary, Config, FileAudit, ScanResult};
pub use scanner::{BlockCommentScanner, ScannerSettings};
