//! # oxide-mvc
//!
//! Request dispatch and rendering on top of [`oxide_router`].
//!
//! An [`Application`] owns the route table, middleware, templates and
//! configuration. For each request it:
//!
//! 1. resolves the route (unmatched paths get the 404 page);
//! 2. builds a [`Context`] with the request, merged parameters and the
//!    default layout;
//! 3. runs every middleware's `before` hook, then the [`Controller`];
//! 4. runs every middleware's `after` hook in the same order, even when the
//!    previous steps failed;
//! 5. renders the returned [`Render`] directive, or the 500 page on failure.
//!
//! Panics in middleware, controllers and rendering are caught per request and
//! logged with a backtrace.
//!
//! ## Example
//!
//! ```
//! use oxide_mvc::{Application, Config, Context, Render, Request, Result, Templates};
//!
//! fn user(ctx: &mut Context<'_>) -> Result<Render> {
//!     let id: i64 = ctx.path_params.parse("id").unwrap_or_default();
//!     ctx.insert("id", &id)?;
//!     Ok(Render::template())
//! }
//!
//! let mut templates = Templates::new();
//! templates.add("blog", "user", "html", "user {{ id }}").unwrap();
//!
//! let app = Application::builder(Config::new("blog"))
//!     .route("user", "/user/:id(int)", user)
//!     .templates(templates)
//!     .build()
//!     .unwrap();
//!
//! let response = app.handle(Request::get("/user/7"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body_string().unwrap(), "user 7");
//!
//! let response = app.handle(Request::get("/missing"));
//! assert_eq!(response.status, 404);
//! ```

mod app;
mod config;
mod context;
mod controller;
mod dispatcher;
mod error;
mod middleware;
mod mime;
mod multipart;
mod render;
mod renderer;
mod resource;
pub mod server;
mod session;
mod template;

pub use app::{Application, ApplicationBuilder, BoxController};
pub use config::{Config, DEFAULT_ADDR, DEFAULT_MAX_CLIENT_BODY_SIZE, STATIC_DIR};
pub use context::Context;
pub use controller::{Controller, WithMethods};
pub use error::{MvcError, Result};
pub use middleware::{AccessLog, Middleware};
pub use mime::{MimeFormats, DEFAULT_CONTENT_TYPE};
pub use multipart::UploadedFile;
pub use oxide_router::{Method, Params, PathParams, Request, Response};
pub use render::{Render, DEFAULT_XML_ROOT};
pub use renderer::Renderer;
pub use resource::ResourceSet;
pub use session::{MemoryStore, Session, SessionConfig, SessionMiddleware, SessionStore};
pub use template::{Template, TemplateSet, Templates};
