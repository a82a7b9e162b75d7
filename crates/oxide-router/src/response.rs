//! HTTP response type.

use std::collections::HashMap;

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a new response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Creates a plain-text response carrying the reason phrase of `status`.
    ///
    /// This is the last-resort response of the dispatcher; building it
    /// cannot fail.
    pub fn plain_error(status: u16) -> Self {
        Self::new(status)
            .header("Content-Type", "text/plain")
            .body(status_text(status))
    }

    /// Sets a header, replacing any previous value with the same name.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(key, value);
        self
    }

    /// Sets a header in place, replacing any previous value with the same name.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value.into());
    }

    /// Gets a header value, ignoring case.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("Content-Type")
    }

    /// Sets the status code.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Returns the status text for the current status code.
    pub fn status_text(&self) -> &'static str {
        status_text(self.status)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

/// Returns the standard reason phrase for an HTTP status code.
///
/// Codes without a registered phrase yield `"Unknown"`.
pub fn status_text(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_error() {
        let res = Response::plain_error(500);
        assert_eq!(res.status, 500);
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(res.body_string(), Some("Internal Server Error".to_string()));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut res = Response::ok().header("content-type", "text/html");
        res.set_header("Content-Type", "application/json");
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.content_type(), Some("application/json"));
    }

    #[test]
    fn test_response_builder() {
        let res = Response::ok().header("X-Custom", "value").body("Hello");

        assert_eq!(res.status, 200);
        assert_eq!(res.get_header("x-custom"), Some("value"));
        assert_eq!(res.body_string(), Some("Hello".to_string()));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(404), "Not Found");
        assert_eq!(status_text(302), "Found");
        assert_eq!(Response::new(301).status_text(), "Moved Permanently");
    }

    #[test]
    fn test_status_text_covers_registered_codes() {
        assert_eq!(status_text(402), "Payment Required");
        assert_eq!(status_text(412), "Precondition Failed");
        assert_eq!(status_text(418), "I'm a teapot");
        assert_eq!(status_text(451), "Unavailable For Legal Reasons");
        assert_eq!(status_text(599), "Unknown");
        assert_eq!(status_text(42), "Unknown");
    }
}
