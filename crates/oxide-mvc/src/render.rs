//! Render directives returned by controllers.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Root element used by [`Render::xml`].
pub const DEFAULT_XML_ROOT: &str = "response";

/// What a controller wants written to the response.
///
/// Each request yields exactly one `Render`, consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    /// Render a template. `name` overrides the handler name, `data` is merged
    /// into the context data.
    Template {
        name: Option<String>,
        data: Option<Value>,
    },
    /// Encode the payload as JSON.
    Json(Value),
    /// Encode the payload as XML under `root`.
    Xml { root: String, payload: Value },
    /// Write the bytes verbatim.
    Text(Vec<u8>),
    /// Send a file from the resource set, the public directory or an
    /// absolute path.
    File(String),
    /// Redirect with 301 when `permanent`, 302 otherwise.
    Redirect { url: String, permanent: bool },
    /// Render an error page for `status`.
    Error { status: u16, data: Option<Value> },
}

impl Render {
    /// Renders the handler's own template with the current context data.
    pub const fn template() -> Self {
        Self::Template {
            name: None,
            data: None,
        }
    }

    /// Renders the handler's own template with additional data.
    ///
    /// # Errors
    ///
    /// Fails when `data` cannot be converted to a JSON value.
    pub fn template_with<T: Serialize>(data: &T) -> Result<Self> {
        Ok(Self::Template {
            name: None,
            data: Some(serde_json::to_value(data)?),
        })
    }

    /// Renders a named template instead of the handler's own.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Template {
            name: Some(name.into()),
            data: None,
        }
    }

    /// Renders `data` as JSON.
    ///
    /// # Errors
    ///
    /// Fails when `data` cannot be converted to a JSON value.
    pub fn json<T: Serialize>(data: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(data)?))
    }

    /// Renders `data` as XML under a `<response>` root.
    ///
    /// # Errors
    ///
    /// Fails when `data` cannot be converted to a JSON value.
    pub fn xml<T: Serialize>(data: &T) -> Result<Self> {
        Ok(Self::Xml {
            root: DEFAULT_XML_ROOT.to_string(),
            payload: serde_json::to_value(data)?,
        })
    }

    /// Renders plain text.
    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self::Text(body.into())
    }

    /// Sends a file.
    pub fn file(path: impl Into<String>) -> Self {
        Self::File(path.into())
    }

    /// Redirects temporarily (302).
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect {
            url: url.into(),
            permanent: false,
        }
    }

    /// Redirects permanently (301).
    pub fn redirect_permanent(url: impl Into<String>) -> Self {
        Self::Redirect {
            url: url.into(),
            permanent: true,
        }
    }

    /// Renders the error page for `status`.
    pub const fn error(status: u16) -> Self {
        Self::Error { status, data: None }
    }
}
