//! Natural ordering of materialized paths.
//!
//! Paths are strings like `1.10.3`, so a plain `ORDER BY path` puts `1.10` before
//! `1.2`. Two regex passes make the lexicographic order match the numeric one:
//!
//! 1. every run of digits that starts a segment gets 20 zeros prepended;
//! 2. every zero-prefixed run longer than 20 digits is cut back to its last 20.
//!
//! Each numeric segment ends up exactly 20 characters wide, which is enough for any
//! unsigned 64-bit key.

use log::debug;
use regex::Regex;

use super::errors::GrammarError;
use super::ExpressionGrammar;
use crate::hierarchy_catalog::SegmentKind;

pub const NATURAL_PAD_WIDTH: usize = 20;

/// How a backend's `REGEXP_REPLACE` refers to capture groups in the replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSyntax {
    /// `$1` (MySQL, ICU)
    Dollar,
    /// `\1` (MariaDB and SingleStore, PCRE)
    Backslash,
    /// `${1}` (the `regex` crate)
    Braced,
}

impl CaptureSyntax {
    fn group(&self, index: usize) -> String {
        match self {
            CaptureSyntax::Dollar => format!("${}", index),
            CaptureSyntax::Backslash => format!("\\{}", index),
            CaptureSyntax::Braced => format!("${{{}}}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalOrderPatterns {
    pub pad_pattern: String,
    pub pad_replacement: String,
    pub strip_pattern: String,
    pub strip_replacement: String,
}

pub fn natural_order_patterns(separator: &str, syntax: CaptureSyntax) -> NaturalOrderPatterns {
    let separator = regex::escape(separator);
    NaturalOrderPatterns {
        pad_pattern: format!("(^|{})([0-9]+)", separator),
        pad_replacement: format!(
            "{}{}{}",
            syntax.group(1),
            "0".repeat(NATURAL_PAD_WIDTH),
            syntax.group(2)
        ),
        strip_pattern: format!("0+([0-9]{{{}}})({}|$)", NATURAL_PAD_WIDTH, separator),
        strip_replacement: format!("{}{}", syntax.group(1), syntax.group(2)),
    }
}

/// `REGEXP_REPLACE(REGEXP_REPLACE(path, ...), ...) ASC` for integer keys, `path ASC`
/// otherwise.
pub fn compile_natural_order<G: ExpressionGrammar + ?Sized>(
    grammar: &G,
    path: &str,
    separator: &str,
    kind: SegmentKind,
    syntax: CaptureSyntax,
) -> String {
    if !kind.is_integer() {
        return format!("{} ASC", grammar.wrap(path));
    }

    let patterns = natural_order_patterns(separator, syntax);
    format!(
        "REGEXP_REPLACE(REGEXP_REPLACE({}, {}, {}), {}, {}) ASC",
        grammar.wrap(path),
        grammar.quote_string(&patterns.pad_pattern),
        grammar.quote_string(&patterns.pad_replacement),
        grammar.quote_string(&patterns.strip_pattern),
        grammar.quote_string(&patterns.strip_replacement),
    )
}

/// Plain `path ASC` for backends without `REGEXP_REPLACE`.
pub fn compile_lexicographic_order<G: ExpressionGrammar + ?Sized>(
    grammar: &G,
    path: &str,
    kind: SegmentKind,
) -> String {
    if kind.is_integer() {
        debug!(
            "{} has no regexp_replace, ordering '{}' lexicographically; use natural_sort_key on fetched rows",
            grammar.driver(),
            path
        );
    }
    format!("{} ASC", grammar.wrap(path))
}

/// The two passes compiled once, for sorting rows after they are fetched.
#[derive(Debug, Clone)]
pub struct NaturalSortKey {
    pad: Regex,
    strip: Regex,
    patterns: NaturalOrderPatterns,
}

impl NaturalSortKey {
    pub fn new(separator: &str) -> Result<Self, GrammarError> {
        let patterns = natural_order_patterns(separator, CaptureSyntax::Braced);
        Ok(Self {
            pad: Regex::new(&patterns.pad_pattern)?,
            strip: Regex::new(&patterns.strip_pattern)?,
            patterns,
        })
    }

    pub fn key(&self, path: &str) -> String {
        let padded = self
            .pad
            .replace_all(path, self.patterns.pad_replacement.as_str());
        self.strip
            .replace_all(&padded, self.patterns.strip_replacement.as_str())
            .into_owned()
    }
}

/// Same two passes as the SQL form, for a single path.
///
/// # Examples
/// ```
/// use adjacency_cte::sql_grammar::natural_order::natural_sort_key;
/// assert!(natural_sort_key("1.2", ".").unwrap() < natural_sort_key("1.10", ".").unwrap());
/// ```
pub fn natural_sort_key(path: &str, separator: &str) -> Result<String, GrammarError> {
    Ok(NaturalSortKey::new(separator)?.key(path))
}
