//! Source location mapping for CFG blocks

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source location for a CFG block or statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path (relative to crate root or absolute)
    pub file_path: PathBuf,
    /// Byte offset of the start
    pub byte_start: usize,
    /// Byte offset of the end
    pub byte_end: usize,
    /// Line number (1-indexed)
    pub start_line: usize,
    /// Column number (1-indexed, in UTF-8 characters)
    pub start_column: usize,
    /// End line number
    pub end_line: usize,
    /// End column number
    pub end_column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(
        file_path: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            byte_start,
            byte_end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Convert byte offsets to line/column
    ///
    /// This is a simplified implementation. For production use,
    /// you'd want to cache line endings and handle edge cases.
    pub fn from_bytes(file_path: impl Into<PathBuf>, source: &str, byte_start: usize, byte_end: usize) -> Self {
        let (start_line, start_col) = byte_to_line_column(source, byte_start);
        let (end_line, end_col) = byte_to_line_column(source, byte_end);

        Self {
            file_path: file_path.into(),
            byte_start,
            byte_end,
            start_line,
            start_column: start_col,
            end_line,
            end_column: end_col,
        }
    }

    /// Get a human-readable description
    pub fn display(&self) -> String {
        format!(
            "{}:{}:{}-{}:{}",
            self.file_path.display(),
            self.start_line,
            self.start_column,
            self.end_line,
            self.end_column
        )
    }

    /// Check if this location overlaps with another
    pub fn overlaps(&self, other: &SourceLocation) -> bool {
        if self.file_path != other.file_path {
            return false;
        }
        // Overlap if ranges intersect
        self.byte_start < other.byte_end && self.byte_end > other.byte_start
    }

    /// Create a source location from byte ranges, with optional source for line/column.
    ///
    /// If source is provided, computes line/column from byte offsets.
    /// If source is None, line/column fields are set to 0 (lazy computation).
    ///
    /// This is useful when reconstructing SourceLocation from database where
    /// the source file may not be available.
    pub fn from_bytes_with_source(
        file_path: impl Into<PathBuf>,
        source: Option<&str>,
        byte_start: usize,
        byte_end: usize,
    ) -> Self {
        let file_path = file_path.into();

        if let Some(src) = source {
            // Compute line/column from source
            let (start_line, start_col) = byte_to_line_column(src, byte_start);
            let (end_line, end_col) = byte_to_line_column(src, byte_end);
            Self {
                file_path,
                byte_start,
                byte_end,
                start_line,
                start_column: start_col,
                end_line,
                end_column: end_col,
            }
        } else {
            // No source available - line/column will be 0
            // Display will fall back to byte ranges
            Self {
                file_path,
                byte_start,
                byte_end,
                start_line: 0,
                start_column: 0,
                end_line: 0,
                end_column: 0,
            }
        }
    }

    /// Get a human-readable description (fallback to byte ranges if line/column unavailable)
    pub fn display_or_bytes(&self) -> String {
        if self.start_line > 0 {
            self.display()
        } else {
            format!(
                "{}:bytes{}-{}",
                self.file_path.display(),
                self.byte_start,
                self.byte_end
            )
        }
    }
}

/// Convert byte offset to line and column (1-indexed)
fn byte_to_line_column(source: &str, byte_offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    let mut current_byte = 0;

    for ch in source.chars() {
        if current_byte >= byte_offset {
            break;
        }

        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }

        current_byte += ch.len_utf8();
    }

    (line, column)
}
