//! MIME type to format mapping and content sniffing.

use std::collections::HashMap;
use std::path::Path;

/// Content type used when a response has none.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Maps MIME types to the format token used for template lookup.
#[derive(Debug, Clone)]
pub struct MimeFormats {
    formats: HashMap<String, String>,
}

impl Default for MimeFormats {
    fn default() -> Self {
        let formats = [
            ("application/json", "json"),
            ("application/xml", "xml"),
            ("text/html", "html"),
            ("text/plain", "txt"),
        ]
        .into_iter()
        .map(|(mime, format)| (mime.to_string(), format.to_string()))
        .collect();
        Self { formats }
    }
}

impl MimeFormats {
    /// Creates an empty table.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Returns the format for a content type. Parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn get(&self, content_type: &str) -> Option<&str> {
        self.formats
            .get(&essence(content_type))
            .map(String::as_str)
    }

    /// Adds or replaces a mapping.
    pub fn set(&mut self, mime: impl AsRef<str>, format: impl Into<String>) {
        self.formats.insert(essence(mime.as_ref()), format.into());
    }

    /// Removes a mapping.
    pub fn remove(&mut self, mime: &str) -> Option<String> {
        self.formats.remove(&essence(mime))
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Guesses a content type from a file extension.
pub fn from_extension(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Guesses a content type from the leading bytes of a body.
pub fn sniff(body: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
    ];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| body.starts_with(sig)) {
        return mime;
    }
    if std::str::from_utf8(body).is_ok() {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}
