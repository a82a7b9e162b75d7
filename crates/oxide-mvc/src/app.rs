//! The application aggregate and its builder.

use std::collections::HashMap;

use oxide_router::{RouteTable, RouteTableBuilder};
use tracing::info;

use crate::config::Config;
use crate::context::Context;
use crate::controller::Controller;
use crate::error::{MvcError, Result};
use crate::middleware::Middleware;
use crate::mime::MimeFormats;
use crate::render::Render;
use crate::resource::ResourceSet;
use crate::template::{TemplateSet, Templates};

/// Boxed controller stored in the route table.
pub type BoxController = Box<dyn Controller>;

/// Everything a request needs that outlives it: configuration, routes,
/// middleware, templates and resources.
///
/// Read-only once built; share it across tasks behind an `Arc`.
pub struct Application {
    config: Config,
    routes: RouteTable<BoxController>,
    middleware: Vec<Box<dyn Middleware>>,
    templates: Box<dyn TemplateSet>,
    resources: ResourceSet,
    mime_formats: MimeFormats,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware.len())
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Starts building an application.
    pub fn builder(config: Config) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the route table.
    pub const fn routes(&self) -> &RouteTable<BoxController> {
        &self.routes
    }

    /// Returns the middleware in registration order.
    pub fn middleware(&self) -> &[Box<dyn Middleware>] {
        &self.middleware
    }

    /// Returns the template set.
    pub fn templates(&self) -> &dyn TemplateSet {
        self.templates.as_ref()
    }

    /// Returns the embedded resources.
    pub const fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Returns the MIME type to format table.
    pub const fn mime_formats(&self) -> &MimeFormats {
        &self.mime_formats
    }

    /// Builds the URL of a named route.
    ///
    /// # Errors
    ///
    /// Fails for an unknown route or parameters that do not fit its pattern.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Ok(self.routes.url_for(name, &params)?)
    }
}

/// Collects routes, middleware, templates and resources, then validates them
/// in [`ApplicationBuilder::build`].
///
/// ```
/// use oxide_mvc::{AccessLog, Application, Config, Context, Render, Result};
///
/// fn root(_: &mut Context<'_>) -> Result<Render> {
///     Ok(Render::text("hello"))
/// }
///
/// let app = Application::builder(Config::new("blog"))
///     .route("root", "/", root)
///     .middleware(AccessLog)
///     .build()
///     .unwrap();
/// assert_eq!(app.routes().len(), 1);
/// ```
pub struct ApplicationBuilder {
    config: Config,
    routes: RouteTableBuilder<BoxController>,
    middleware: Vec<Box<dyn Middleware>>,
    templates: Box<dyn TemplateSet>,
    resources: ResourceSet,
    mime_formats: MimeFormats,
}

impl ApplicationBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            routes: RouteTable::builder(),
            middleware: Vec::new(),
            templates: Box::new(Templates::new()),
            resources: ResourceSet::new(),
            mime_formats: MimeFormats::default(),
        }
    }

    /// Registers a controller. Routes are matched in registration order.
    #[must_use]
    pub fn route(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        controller: impl Controller + 'static,
    ) -> Self {
        let methods = controller.methods().to_vec();
        self.routes = self
            .routes
            .route_methods(name, &methods, pattern, Box::new(controller));
        self
    }

    /// Registers a closure answering `GET` and `HEAD`.
    #[must_use]
    pub fn action<F>(self, name: impl Into<String>, pattern: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<Render> + Send + Sync + 'static,
    {
        self.route(name, pattern, action)
    }

    /// Appends a middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Sets the template set.
    #[must_use]
    pub fn templates(mut self, templates: impl TemplateSet + 'static) -> Self {
        self.templates = Box::new(templates);
        self
    }

    /// Sets the embedded resources.
    #[must_use]
    pub fn resources(mut self, resources: ResourceSet) -> Self {
        self.resources = resources;
        self
    }

    /// Maps a MIME type to a format.
    #[must_use]
    pub fn mime_format(mut self, mime: &str, format: impl Into<String>) -> Self {
        self.mime_formats.set(mime, format);
        self
    }

    /// Replaces the MIME type to format table.
    #[must_use]
    pub fn mime_formats(mut self, formats: MimeFormats) -> Self {
        self.mime_formats = formats;
        self
    }

    /// Validates the configuration and builds the application.
    ///
    /// # Errors
    ///
    /// Fails on a malformed route pattern, a duplicate route name, an invalid
    /// session configuration, or session middleware without one.
    pub fn build(self) -> Result<Application> {
        let mut config = self.config;
        config.apply_defaults();

        match &config.session {
            Some(session) => session.validate()?,
            None if self.middleware.iter().any(|m| m.uses_sessions()) => {
                return Err(MvcError::Session(
                    "session middleware is registered but no session is configured".into(),
                ));
            }
            None => {}
        }

        let routes = self.routes.build()?;
        info!(
            app = %config.app_name,
            routes = routes.len(),
            middleware = self.middleware.len(),
            "Application built"
        );

        Ok(Application {
            config,
            routes,
            middleware: self.middleware,
            templates: self.templates,
            resources: self.resources,
            mime_formats: self.mime_formats,
        })
    }
}
