//! The controller contract.

use oxide_router::Method;

use crate::context::Context;
use crate::error::Result;
use crate::render::Render;

/// Handles requests for one route.
///
/// Functions of the form `fn(&mut Context<'_>) -> Result<Render>` are
/// controllers answering `GET` and `HEAD`.
pub trait Controller: Send + Sync {
    /// Methods this controller answers. An empty slice answers every method.
    fn methods(&self) -> &[Method] {
        &[Method::Get, Method::Head]
    }

    /// Handles one request. The context carries path parameters, merged
    /// parameters and the session.
    ///
    /// # Errors
    ///
    /// An error is logged and answered with a 500.
    fn handle(&self, ctx: &mut Context<'_>) -> Result<Render>;
}

impl<F> Controller for F
where
    F: Fn(&mut Context<'_>) -> Result<Render> + Send + Sync,
{
    fn handle(&self, ctx: &mut Context<'_>) -> Result<Render> {
        self(ctx)
    }
}

/// Restricts a controller to a set of methods.
///
/// ```
/// use oxide_mvc::{Context, Controller, Method, Render, WithMethods};
///
/// fn create(_: &mut Context<'_>) -> oxide_mvc::Result<Render> {
///     Ok(Render::redirect("/"))
/// }
///
/// let create = WithMethods::new(&[Method::Post], create);
/// assert_eq!(create.methods(), &[Method::Post]);
/// ```
pub struct WithMethods<C> {
    methods: Vec<Method>,
    inner: C,
}

impl<C: Controller> WithMethods<C> {
    /// Wraps `inner`, answering only `methods`.
    pub fn new(methods: &[Method], inner: C) -> Self {
        Self {
            methods: methods.to_vec(),
            inner,
        }
    }
}

impl<C: Controller> Controller for WithMethods<C> {
    fn methods(&self) -> &[Method] {
        &self.methods
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<Render> {
        self.inner.handle(ctx)
    }
}
