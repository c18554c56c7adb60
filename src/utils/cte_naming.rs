//! Naming utilities for recursive expressions and self-join aliases.
//!
//! Every reserved alias goes through these functions so the place that creates a name
//! and the place that rewrites it always agree.
//!
//! ## Naming Convention
//! - Expression names are plain identifiers, default `adjacency_cte`
//! - Self-join aliases: `adjacency_reserved_{uuid_simple}`
//!
//! Examples:
//! - `reserved_table_hash()` → `"adjacency_reserved_3f2b...c1"`
//! - `replace_table_hash("x.id > 0", "x", "adjacency_cte")` → `"adjacency_cte.id > 0"`

use regex::Regex;

pub const DEFAULT_EXPRESSION_NAME: &str = "adjacency_cte";
pub const RESERVED_HASH_PREFIX: &str = "adjacency_reserved_";

/// Generate a fresh alias for the hierarchy table inside a self-relation subquery.
///
/// # Examples
/// ```
/// use adjacency_cte::utils::cte_naming::reserved_table_hash;
///
/// let hash = reserved_table_hash();
/// assert!(hash.starts_with("adjacency_reserved_"));
/// assert_eq!(hash.len(), "adjacency_reserved_".len() + 32);
/// ```
pub fn reserved_table_hash() -> String {
    format!("{}{}", RESERVED_HASH_PREFIX, uuid::Uuid::new_v4().simple())
}

/// Rewrite whole-word references to `hash` so they point at `expression` instead.
///
/// Running it twice changes nothing: after the first pass no reference to `hash` is
/// left.
///
/// # Examples
/// ```
/// use adjacency_cte::utils::cte_naming::replace_table_hash;
///
/// assert_eq!(
///     replace_table_hash("SUM(h1.price)", "h1", "adjacency_cte"),
///     "SUM(adjacency_cte.price)"
/// );
/// // "h10" is a different identifier
/// assert_eq!(replace_table_hash("h10.price", "h1", "adjacency_cte"), "h10.price");
/// ```
pub fn replace_table_hash(sql: &str, hash: &str, expression: &str) -> String {
    if hash.is_empty() {
        return sql.to_string();
    }
    let pattern = format!(r"\b{}\b", regex::escape(hash));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(sql, regex::NoExpand(expression)).into_owned(),
        // an escaped literal always compiles; keep the input if it somehow does not
        Err(_) => sql.to_string(),
    }
}
