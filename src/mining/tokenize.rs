//! Shell-word splitting of single log lines

use super::error::{MinerError, Result};

/// Splits a line into tokens following POSIX shell quoting rules.
///
/// Fails with [`MinerError::Tokenization`] carrying the offending line when the
/// quoting cannot be resolved.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    shlex::split(line.trim()).ok_or_else(|| MinerError::Tokenization {
        line: line.to_string(),
        reason: "Unbalanced quoting or trailing escape".to_string(),
    })
}

/// Like [`split_line`], but yields an empty sequence for malformed lines.
///
/// Used when probing lines that are not guaranteed to be command lines.
pub fn split_line_lenient(line: &str) -> Vec<String> {
    split_line(line).unwrap_or_default()
}
