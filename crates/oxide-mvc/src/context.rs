//! Per-request context.

use std::time::{Duration, Instant};

use oxide_router::{Method, Params, PathParams, Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::Application;
use crate::error::{MvcError, Result};
use crate::mime::DEFAULT_CONTENT_TYPE;
use crate::multipart::{self, UploadedFile};
use crate::session::Session;

/// State of one request, owned by the dispatcher for the request's lifetime
/// and lent to middleware, the controller and the renderer in turn.
pub struct Context<'a> {
    app: &'a Application,
    /// Handler name, used for template lookup.
    pub name: String,
    /// Layout wrapped around templates; starts as the configured default.
    pub layout: Option<String>,
    /// The inbound request.
    pub request: Request,
    /// The outbound response being built.
    pub response: Response,
    /// Data exposed to templates.
    pub data: Value,
    /// Path, body and query parameters, in that order.
    pub params: Params,
    /// Typed placeholder values from the matched route.
    pub path_params: PathParams,
    /// File parts of a `multipart/form-data` body.
    pub files: Vec<UploadedFile>,
    /// Session loaded by [`crate::SessionMiddleware`].
    pub session: Option<Session>,
    started: Instant,
}

impl<'a> Context<'a> {
    /// Builds the context for a matched request.
    ///
    /// # Errors
    ///
    /// Returns [`MvcError::BodyTooLarge`] when the body exceeds the configured
    /// maximum, or [`MvcError::Multipart`] for a malformed multipart body.
    pub(crate) fn new(
        app: &'a Application,
        name: impl Into<String>,
        request: Request,
        path_params: PathParams,
    ) -> Result<Self> {
        let limit = app.config().max_client_body_size;
        if request.body.len() > limit {
            return Err(MvcError::BodyTooLarge { limit });
        }

        let mut params = Params::new();
        let mut files = Vec::new();
        params.extend_path(&path_params);
        if request.method.has_form_body() {
            if request.is_form() {
                params.extend(&Params::from_urlencoded(&request.body));
            } else if let Some(content_type) =
                request.get_header("Content-Type").filter(|_| request.is_multipart())
            {
                let form = multipart::decode(content_type, &request.body)?;
                params.extend(&form.fields);
                files = form.files;
            }
        }
        params.extend(&request.query);

        Ok(Self {
            app,
            name: name.into(),
            layout: app.config().default_layout.clone(),
            request,
            response: Response::ok(),
            data: Value::Object(Map::new()),
            params,
            path_params,
            files,
            session: None,
            started: Instant::now(),
        })
    }

    /// Builds a bare context for rendering outside a matched route.
    pub(crate) fn detached(app: &'a Application, name: impl Into<String>, request: Request) -> Self {
        Self {
            app,
            name: name.into(),
            layout: app.config().default_layout.clone(),
            request,
            response: Response::ok(),
            data: Value::Object(Map::new()),
            params: Params::new(),
            path_params: PathParams::new(),
            files: Vec::new(),
            session: None,
            started: Instant::now(),
        }
    }

    /// Returns the owning application.
    pub const fn app(&self) -> &'a Application {
        self.app
    }

    /// Returns the request method.
    pub const fn method(&self) -> Method {
        self.request.method
    }

    /// Returns the time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Merges `data` into the data bag. Objects are merged key by key; any
    /// other value replaces the bag.
    pub fn set_data(&mut self, data: Value) {
        match (&mut self.data, data) {
            (Value::Object(bag), Value::Object(incoming)) => bag.extend(incoming),
            (bag, other) => *bag = other,
        }
    }

    /// Inserts one value into the data bag, turning it into an object first
    /// if needed.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be converted to a JSON value.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }
        if let Value::Object(bag) = &mut self.data {
            bag.insert(key.into(), value);
        }
        Ok(())
    }

    /// Returns the response content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.response.content_type()
    }

    /// Sets the response content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.response.set_header("Content-Type", content_type);
    }

    /// Sets the response content type unless one is already set.
    pub fn set_content_type_if_missing(&mut self, content_type: &str) {
        if self.content_type().is_none() {
            self.set_content_type(content_type);
        }
    }

    /// Resolves the output format from the content type, defaulting the
    /// content type to `text/html`.
    ///
    /// # Errors
    ///
    /// Returns [`MvcError::UnknownContentType`] when the content type has no
    /// format mapping.
    pub fn format(&mut self) -> Result<String> {
        self.set_content_type_if_missing(DEFAULT_CONTENT_TYPE);
        let content_type = self.content_type().unwrap_or(DEFAULT_CONTENT_TYPE);
        self.app
            .mime_formats()
            .get(content_type)
            .map(str::to_string)
            .ok_or_else(|| MvcError::UnknownContentType(content_type.to_string()))
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: u16) {
        self.response.status = status;
    }

    /// Builds the environment passed to templates: request details plus the
    /// data bag's keys at the top level. Data keys shadow the details.
    pub(crate) fn template_env(&self, format: &str) -> Value {
        let mut params = Map::new();
        for (key, value) in self.params.iter() {
            params
                .entry(key)
                .or_insert_with(|| Value::String(value.to_string()));
        }
        let mut env = Map::new();
        env.insert("data".to_string(), self.data.clone());
        env.insert("name".to_string(), Value::String(self.name.clone()));
        env.insert("format".to_string(), Value::String(format.to_string()));
        env.insert("params".to_string(), Value::Object(params));
        if let Value::Object(bag) = &self.data {
            env.extend(bag.clone());
        }
        Value::Object(env)
    }

    /// Consumes the context, returning the response.
    pub fn into_response(self) -> Response {
        self.response
    }
}
