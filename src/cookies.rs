//! Session-affinity cookies kept between requests to the provider.
//!
//! Only `name=value` pairs are tracked; attributes (`Path`, `Expires`, ...) are ignored because the jar
//! lives exactly as long as one login session.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Last write wins.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Merge every cookie defined by one raw `Set-Cookie` header value.
    pub fn merge_set_cookie(&mut self, header: &str) {
        for (name, value) in parse_set_cookie(header) {
            self.insert(name, value);
        }
    }

    /// Value for the `Cookie` request header, `None` when the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parse a `Set-Cookie` header value into `(name, value)` pairs.
///
/// Some servers fold several cookies into one header separated by commas. A comma only starts a new
/// cookie when the text after it looks like `name=`; the comma inside `Expires=Wed, 21 Oct 2015 ...`
/// is followed by a date and stays part of the current cookie, as does any comma inside a quoted value.
pub fn parse_set_cookie(header: &str) -> Vec<(String, String)> {
    split_cookie_definitions(header)
        .into_iter()
        .filter_map(|definition| {
            let pair = definition.split(';').next().unwrap_or_default();
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if !is_cookie_name(name) {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn split_cookie_definitions(header: &str) -> Vec<&str> {
    let mut definitions = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (idx, ch) in header.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted && starts_cookie_definition(&header[idx + 1..]) => {
                definitions.push(&header[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    definitions.push(&header[start..]);
    definitions
        .into_iter()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect()
}

fn starts_cookie_definition(rest: &str) -> bool {
    let head = rest.split([';', ',']).next().unwrap_or_default();
    match head.split_once('=') {
        Some((name, _)) => is_cookie_name(name.trim()),
        None => false,
    }
}

// RFC 6265 token: no separators, whitespace or control characters.
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_graphic()
                && !matches!(
                    c,
                    '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '=' | '{' | '}'
                )
        })
}
