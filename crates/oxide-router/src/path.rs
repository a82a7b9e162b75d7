//! Path pattern matching.

use regex::Regex;
use std::collections::HashMap;

use crate::error::{Result, RouterError};
use crate::request::PathParams;

/// Lexical constraint on a placeholder segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `:name` - any non-empty segment.
    Token,
    /// `:name(int)` - one or more ASCII digits.
    Int,
    /// `:name(string)` - alphanumeric characters, `_` and `-`.
    Str,
    /// `*name` - the remainder of the path, slashes included.
    Rest,
}

impl ParamKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(Self::Int),
            "string" => Some(Self::Str),
            _ => None,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            Self::Token => "([^/]+)",
            Self::Int => "([0-9]+)",
            Self::Str => r"([\p{Alphabetic}\p{N}_-]+)",
            Self::Rest => "(.+)",
        }
    }

    /// Returns whether `value` satisfies this kind's grammar.
    pub fn accepts(self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Self::Token => !value.contains('/'),
            Self::Int => value.bytes().all(|b| b.is_ascii_digit()),
            Self::Str => value
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-'),
            Self::Rest => true,
        }
    }
}

/// A segment in a path pattern.
#[derive(Debug, Clone)]
pub enum PathSegment {
    /// A literal string segment.
    Literal(String),
    /// A placeholder segment (e.g., `:id(int)`).
    Param(String, ParamKind),
}

/// A compiled path pattern for matching URLs.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original pattern string.
    pattern: String,
    /// Parsed segments.
    segments: Vec<PathSegment>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Parameter names in order.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Parses a path pattern string.
    ///
    /// Pattern syntax:
    /// - `/users` - Literal path
    /// - `/users/:id` - Placeholder matching any segment
    /// - `/users/:id(int)` - Placeholder matching digits only
    /// - `/users/:name(string)` - Placeholder matching alphanumerics, `_` and `-`
    /// - `/files/*path` - Wildcard (matches rest of path, must be last)
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_router::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/posts/:id(int)/comments/:slug").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/first").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("slug"), Some("first"));
    /// assert!(pattern.match_path("/posts/abc/comments/first").is_none());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] for an unterminated or unknown
    /// type tag, an empty or duplicated placeholder name, or a wildcard that
    /// is not the last segment.
    pub fn parse(pattern: &str) -> Result<Self> {
        if !pattern.starts_with('/') {
            return Err(RouterError::invalid_pattern(pattern, "must start with `/`"));
        }

        let mut segments = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut regex_str = String::from("^");
        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

        for (i, part) in parts.iter().enumerate() {
            regex_str.push('/');

            let placeholder = if let Some(rest) = part.strip_prefix(':') {
                Some(parse_placeholder(pattern, rest)?)
            } else if let Some(name) = part.strip_prefix('*') {
                if i + 1 != parts.len() {
                    return Err(RouterError::invalid_pattern(
                        pattern,
                        "wildcard must be the last segment",
                    ));
                }
                Some((name.to_string(), ParamKind::Rest))
            } else {
                None
            };

            match placeholder {
                Some((name, kind)) => {
                    if !is_valid_name(&name) {
                        return Err(RouterError::invalid_pattern(
                            pattern,
                            format!("invalid placeholder name `{name}`"),
                        ));
                    }
                    if param_names.contains(&name) {
                        return Err(RouterError::invalid_pattern(
                            pattern,
                            format!("duplicate placeholder `{name}`"),
                        ));
                    }
                    regex_str.push_str(kind.regex());
                    param_names.push(name.clone());
                    segments.push(PathSegment::Param(name, kind));
                }
                None => {
                    regex_str.push_str(&regex::escape(part));
                    segments.push(PathSegment::Literal((*part).to_string()));
                }
            }
        }

        regex_str.push_str("/?$");

        let regex = Regex::new(&regex_str)
            .map_err(|e| RouterError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            regex,
            param_names,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// `path` must already be decoded; captured values are returned as is.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;

        let mut params = PathParams::new();

        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }

        Some(params)
    }

    /// Returns the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the parameter names.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Generates a path from parameters.
    ///
    /// Returns `None` if a parameter is missing or does not satisfy the
    /// placeholder's type.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use oxide_router::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/posts/:id(int)").unwrap();
    /// let params: HashMap<String, String> =
    ///     [("id".to_string(), "123".to_string())]
    ///     .into_iter()
    ///     .collect();
    /// let path = pattern.reverse(&params).unwrap();
    /// assert_eq!(path, "/posts/123");
    /// ```
    pub fn reverse(&self, params: &HashMap<String, String>) -> Option<String> {
        let mut path = String::new();

        for segment in &self.segments {
            path.push('/');
            match segment {
                PathSegment::Literal(s) => path.push_str(s),
                PathSegment::Param(name, kind) => {
                    let value = params.get(name)?;
                    if !kind.accepts(value) {
                        return None;
                    }
                    path.push_str(value);
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        Some(path)
    }
}

/// Splits `name(type)` into its name and kind.
fn parse_placeholder(pattern: &str, raw: &str) -> Result<(String, ParamKind)> {
    let Some(open) = raw.find('(') else {
        return Ok((raw.to_string(), ParamKind::Token));
    };
    let Some(tag) = raw[open + 1..].strip_suffix(')') else {
        return Err(RouterError::invalid_pattern(
            pattern,
            format!("unterminated placeholder `:{raw}`"),
        ));
    };
    let kind = ParamKind::from_tag(tag).ok_or_else(|| {
        RouterError::invalid_pattern(pattern, format!("unknown placeholder type `{tag}`"))
    })?;
    Ok((raw[..open].to_string(), kind))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Percent-decodes a request path.
///
/// Encoded separators become real ones, so the result must be passed through
/// [`normalize_path`] before matching. Invalid UTF-8 is replaced lossily.
///
/// ```
/// use oxide_router::{decode_path, normalize_path};
///
/// assert_eq!(decode_path("/user/%37"), "/user/7");
/// assert_eq!(normalize_path(&decode_path("/a/%2e%2e%2Fetc")), "/etc");
/// ```
pub fn decode_path(path: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
}

/// Canonicalizes a request path.
///
/// Removes empty, `.` and `..` segments. A trailing slash on the input is
/// kept, and the root path is always `/`.
///
/// ```
/// use oxide_router::normalize_path;
///
/// assert_eq!(normalize_path("/a//b/./c/../d"), "/a/b/d");
/// assert_eq!(normalize_path("/users/"), "/users/");
/// assert_eq!(normalize_path("/../"), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    let mut result = String::with_capacity(path.len() + 1);
    for part in &stack {
        result.push('/');
        result.push_str(part);
    }
    if result.is_empty() {
        return "/".to_string();
    }
    if path.ends_with('/') {
        result.push('/');
    }
    result
}
