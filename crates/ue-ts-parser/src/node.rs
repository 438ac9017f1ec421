//! Small helpers for reading tree-sitter nodes.

use tree_sitter::Node;

/// Returns the source text covered by `node`.
#[inline]
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// Returns the 1-based line of `node`.
#[inline]
pub(crate) fn node_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Strips one layer of matching quotes from a string literal.
///
/// Handles single, double, and backtick quotes and unescapes `\'`, `\"`, and `\\`.
pub(crate) fn unquote(text: &str) -> String {
    let trimmed = text.trim();
    let inner = ['\'', '"', '`']
        .into_iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(trimmed);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('\'' | '"' | '\\' | '`')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Peels wrappers that do not change an expression's value:
/// parentheses, `as` casts, `satisfies`, and non-null assertions.
pub(crate) fn unwrap_expression(mut node: Node<'_>) -> Node<'_> {
    loop {
        match node.kind() {
            "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression" => match node.named_child(0) {
                Some(inner) => node = inner,
                None => return node,
            },
            _ => return node,
        }
    }
}

/// Iterates the named, non-comment children of `node`.
pub(crate) fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count())
        .filter_map(move |i| node.named_child(i))
        .filter(|child| child.kind() != "comment")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_variants() {
        assert_eq!(unquote("'open'"), "open");
        assert_eq!(unquote("\"closed\""), "closed");
        assert_eq!(unquote("`tmpl`"), "tmpl");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote(r"'a\nb'"), r"a\nb");
    }
}
