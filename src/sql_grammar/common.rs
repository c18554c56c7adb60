//! Identifier and literal helpers shared by every dialect

/// Wraps a possibly qualified, possibly aliased identifier segment by segment.
///
/// `*` is left alone so `table.*` keeps working, and `expr as alias` wraps both sides.
///
/// # Examples
/// ```
/// use adjacency_cte::sql_grammar::common::{wrap_identifier, wrap_with};
/// let quote = |s: &str| wrap_with(s, '"', '"');
/// assert_eq!(wrap_identifier("nodes.*", &quote), "\"nodes\".*");
/// assert_eq!(wrap_identifier("nodes as n", &quote), "\"nodes\" AS \"n\"");
/// ```
pub fn wrap_identifier(value: &str, wrap_segment: &dyn Fn(&str) -> String) -> String {
    if let Some((expression, alias)) = split_alias(value) {
        return format!(
            "{} AS {}",
            wrap_identifier(expression, wrap_segment),
            wrap_segment(alias)
        );
    }

    value
        .split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                wrap_segment(segment)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn split_alias(value: &str) -> Option<(&str, &str)> {
    // ASCII lowering keeps byte offsets valid for `value`
    let lower = value.to_ascii_lowercase();
    let position = lower.find(" as ")?;
    Some((value[..position].trim(), value[position + 4..].trim()))
}

/// Surrounds `segment` with `open`/`close`, doubling any embedded `close`.
pub fn wrap_with(segment: &str, open: char, close: char) -> String {
    let escaped = segment.replace(close, &close.to_string().repeat(2));
    format!("{}{}{}", open, escaped, close)
}

/// Standard SQL string literal
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Last segment of a qualified name: `adjacency_cte.path` → `path`
pub fn alias_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
