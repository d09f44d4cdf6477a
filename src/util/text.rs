//! Rendering helpers for diagnostic output

use std::collections::BTreeMap;
use std::fmt::Display;

/// Joins `items` with `separator`, also placing it in front of the first item
pub fn prefixed_join<S: AsRef<str>>(separator: &str, items: &[S]) -> String {
    items.iter().fold(String::new(), |mut joined, item| {
        joined.push_str(separator);
        joined.push_str(item.as_ref());
        joined
    })
}

/// Renders a mapping of keys to lines as an indented tree, one entry per line
pub fn string_dictionary_of_list<K: Display>(
    mapping: &BTreeMap<K, Vec<String>>,
    base_indent: usize,
) -> String {
    let joiner = format!("\n{}", "\t".repeat(base_indent));
    let nested = format!("{}\t", joiner);
    let entries: Vec<String> = mapping
        .iter()
        .map(|(key, lines)| format!("{}{}", key, prefixed_join(&nested, lines)))
        .collect();
    prefixed_join(&joiner, &entries)
}
