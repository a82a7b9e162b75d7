//! # oxide-router
//!
//! URL routing for the oxide MVC stack.
//!
//! This crate provides:
//! - Path patterns with named, optionally typed placeholders
//! - An ordered, immutable route table with first-match resolution
//! - Path normalization
//! - Request/response value types and multi-valued parameters
//! - Named routes for reverse URL lookup
//!
//! ## Quick Start
//!
//! ```
//! use oxide_router::{Method, RouteTable};
//!
//! let table = RouteTable::builder()
//!     .route("root", "/", "index")
//!     .route("user", "/user/:id(int)", "show_user")
//!     .route("user_by_name", "/user/:name(string)", "show_user_by_name")
//!     .build()
//!     .unwrap();
//!
//! let matched = table.resolve(Method::Get, "/user/7").unwrap();
//! assert_eq!(matched.route.name(), "user");
//! assert_eq!(matched.params.get("id"), Some("7"));
//! ```
//!
//! ## Placeholders
//!
//! | Syntax | Matches |
//! |---|---|
//! | `:name` | any non-empty segment |
//! | `:name(int)` | ASCII digits |
//! | `:name(string)` | word characters and `-` |
//! | `*name` | the rest of the path |
//!
//! Overlapping patterns are resolved by registration order: the first route
//! whose pattern and placeholder types match wins.

mod error;
mod params;
mod path;
mod request;
mod response;
mod router;

pub use error::{Result, RouterError};
pub use params::Params;
pub use path::{decode_path, normalize_path, ParamKind, PathPattern};
pub use request::{Method, PathParams, Request};
pub use response::{status_text, Response};
pub use router::{Route, RouteMatch, RouteTable, RouteTableBuilder};
