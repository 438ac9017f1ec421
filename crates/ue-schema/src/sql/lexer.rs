//! Lexical helpers for SQL schema text.
//!
//! Everything here is quote aware: single-quoted literals, double-quoted
//! identifiers, and dollar-quoted bodies (`$$ ... $$`, `$fn$ ... $fn$`) are
//! never split, stripped, or tokenized internally.

/// One lexical token with its byte span in the tokenized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Keyword, unquoted identifier, or number.
    Word(String),
    /// Double-quoted identifier, quotes removed.
    Ident(String),
    /// Single- or dollar-quoted literal, quotes removed.
    Str(String),
    /// Balanced parenthesized group, outer parentheses removed.
    Group(String),
    /// Any other single character.
    Punct(char),
}

impl Token {
    /// Case-insensitive keyword test.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Returns the identifier this token names, folding unquoted names to lowercase.
    pub fn identifier(&self) -> Option<String> {
        match &self.kind {
            TokenKind::Word(w) => Some(w.to_ascii_lowercase()),
            TokenKind::Ident(i) => Some(i.clone()),
            _ => None,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// If a quoted region starts at `start`, returns the index just past it.
///
/// Unterminated regions run to the end of the input.
fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = *bytes.get(start)?;
    match quote {
        b'\'' | b'"' => {
            let mut i = start + 1;
            while i < bytes.len() {
                if bytes[i] == quote {
                    if bytes.get(i + 1) == Some(&quote) {
                        i += 2;
                        continue;
                    }
                    return Some(i + 1);
                }
                i += 1;
            }
            Some(bytes.len())
        }
        b'$' => {
            if start > 0 && is_word_byte(bytes[start - 1]) {
                return None;
            }
            let mut j = start + 1;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            if bytes.get(j) != Some(&b'$') || bytes[start + 1..j].first().is_some_and(u8::is_ascii_digit) {
                return None;
            }
            let tag = &bytes[start..=j];
            let body_start = j + 1;
            Some(
                bytes[body_start..]
                    .windows(tag.len())
                    .position(|w| w == tag)
                    .map_or(bytes.len(), |pos| body_start + pos + tag.len()),
            )
        }
        _ => None,
    }
}

/// Removes `--` line comments and `/* */` block comments.
pub(crate) fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut segment = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = quoted_end(bytes, i) {
            i = end;
            continue;
        }
        if bytes[i] == b'-' && bytes.get(i + 1) == Some(&b'-') {
            out.push_str(&text[segment..i]);
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            segment = i;
            continue;
        }
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            out.push_str(&text[segment..i]);
            out.push(' ');
            i = bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |pos| i + 2 + pos + 2);
            segment = i;
            continue;
        }
        i += 1;
    }
    out.push_str(&text[segment.min(text.len())..]);
    out
}

/// Splits `text` on `separator` where it is outside quotes and brackets.
///
/// Pieces are trimmed; empty pieces are dropped.
pub(crate) fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut segment = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = quoted_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b if b == separator && depth == 0 => {
                pieces.push(text[segment..i].trim());
                segment = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    pieces.push(text[segment.min(text.len())..].trim());
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Splits a script into statements on top-level semicolons.
pub(crate) fn split_statements(text: &str) -> Vec<&str> {
    split_top_level(text, b';')
}

/// Returns the contents of the parenthesized group opening at `open` and the
/// index just past its closing parenthesis.
pub(crate) fn balanced_group(text: &str, open: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(end) = quoted_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[open + 1..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Finds the first occurrence of `needle` outside quotes and brackets.
pub(crate) fn find_top_level(text: &str, needle: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = needle.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = quoted_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(needle) => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Tokenizes a column definition or constraint clause.
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let kind = if let Some(end) = quoted_end(bytes, i) {
            i = end;
            let raw = &text[start..end];
            match b {
                b'\'' => TokenKind::Str(unquote_with(raw, '\'')),
                b'"' => TokenKind::Ident(unquote_with(raw, '"')),
                _ => TokenKind::Str(dollar_body(raw).to_owned()),
            }
        } else if b == b'(' {
            match balanced_group(text, i) {
                Some((inner, end)) => {
                    i = end;
                    TokenKind::Group(inner.to_owned())
                }
                None => {
                    i = bytes.len();
                    TokenKind::Group(text[start + 1..].to_owned())
                }
            }
        } else if is_word_byte(b) {
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            TokenKind::Word(text[start..i].to_owned())
        } else {
            i += 1;
            TokenKind::Punct(char::from(b))
        };

        tokens.push(Token {
            kind,
            start,
            end: i,
        });
    }

    tokens
}

/// Extracts every single-quoted literal from `text`, in order.
pub(crate) fn string_literals(text: &str) -> Vec<String> {
    tokenize_flat(text)
        .into_iter()
        .filter_map(|t| match t.kind {
            TokenKind::Str(s) => Some(s),
            _ => None,
        })
        .collect()
}

/// Tokenizes `text`, descending into parenthesized groups.
fn tokenize_flat(text: &str) -> Vec<Token> {
    tokenize(text)
        .into_iter()
        .flat_map(|t| match &t.kind {
            TokenKind::Group(inner) => tokenize_flat(inner),
            _ => vec![t],
        })
        .collect()
}

fn unquote_with(raw: &str, quote: char) -> String {
    let inner = raw.strip_prefix(quote).unwrap_or(raw);
    let inner = inner.strip_suffix(quote).unwrap_or(inner);
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

fn dollar_body(raw: &str) -> &str {
    let Some(tag_end) = raw[1..].find('$') else {
        return raw;
    };
    let tag = &raw[..tag_end + 2];
    let body = &raw[tag.len()..];
    body.strip_suffix(tag).unwrap_or(body)
}
