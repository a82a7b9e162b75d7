//! Application-scope configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::session::SessionConfig;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:9100";

/// Default maximum request body size (10 MiB).
pub const DEFAULT_MAX_CLIENT_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Directory under [`Config::app_path`] that holds static files.
pub const STATIC_DIR: &str = "public";

/// Application configuration, read-only once the application is built.
///
/// Can be built with the setters below or deserialized; missing fields take
/// their defaults.
///
/// ```
/// use oxide_mvc::Config;
///
/// let config: Config = serde_json::from_str(r#"{"app_name": "blog"}"#).unwrap();
/// assert_eq!(config.addr, "127.0.0.1:9100");
/// assert_eq!(config.app_name, "blog");
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address.
    pub addr: String,
    /// Application name, used as the template namespace.
    pub app_name: String,
    /// Application root; static files live in `<app_path>/public`.
    pub app_path: PathBuf,
    /// Layout applied to templates unless a controller changes it.
    pub default_layout: Option<String>,
    /// Maximum request body size in bytes.
    pub max_client_body_size: usize,
    /// Session settings, required by [`crate::SessionMiddleware`].
    #[serde(skip)]
    pub session: Option<SessionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            app_name: "app".to_string(),
            app_path: PathBuf::from("."),
            default_layout: None,
            max_client_body_size: DEFAULT_MAX_CLIENT_BODY_SIZE,
            session: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_name", &self.app_name)
            .field("app_path", &self.app_path)
            .field("default_layout", &self.default_layout)
            .field("max_client_body_size", &self.max_client_body_size)
            .field("session", &self.session.as_ref().map(|s| &s.cookie_name))
            .finish()
    }
}

impl Config {
    /// Creates a configuration for the named application.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Sets the listen address.
    #[must_use]
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Sets the application root.
    #[must_use]
    pub fn app_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.app_path = path.into();
        self
    }

    /// Sets the default layout.
    #[must_use]
    pub fn default_layout(mut self, layout: impl Into<String>) -> Self {
        self.default_layout = Some(layout.into());
        self
    }

    /// Sets the maximum request body size.
    #[must_use]
    pub fn max_client_body_size(mut self, size: usize) -> Self {
        self.max_client_body_size = size;
        self
    }

    /// Sets the session configuration.
    #[must_use]
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    /// Returns the static file root.
    pub fn static_dir(&self) -> PathBuf {
        self.app_path.join(STATIC_DIR)
    }

    /// Replaces unset or invalid values with their defaults.
    pub(crate) fn apply_defaults(&mut self) {
        if self.addr.is_empty() {
            self.addr = DEFAULT_ADDR.to_string();
        }
        if self.max_client_body_size < 1 {
            self.max_client_body_size = DEFAULT_MAX_CLIENT_BODY_SIZE;
        }
    }
}
