//! Splitting a command line into its tool and two complementary token sets

use super::error::{MinerError, Result};
use super::filter::TokenFilter;
use super::tokenize::split_line;

/// Result of sorting one command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedLine {
    /// First token: the invoked tool
    pub head: String,
    /// Remaining tokens the sort filter keeps
    pub kept: Vec<String>,
    /// Remaining tokens the sort filter drops
    pub dropped: Vec<String>,
}

/// Tokenizes `line`, strips line-specific noise from everything after the
/// head with `clean`, and partitions the rest with `sort` applied both plainly
/// and negated. The head is returned verbatim.
pub fn sort_line(
    line: &str,
    clean: &dyn TokenFilter,
    sort: &dyn TokenFilter,
) -> Result<SortedLine> {
    let tokens = split_line(line)?;
    let (head, rest) = tokens
        .split_first()
        .ok_or_else(|| MinerError::NoTokens(line.to_string()))?;
    let rest = clean.apply(rest, false);

    Ok(SortedLine {
        head: head.clone(),
        kept: sort.apply(&rest, false),
        dropped: sort.apply(&rest, true),
    })
}
