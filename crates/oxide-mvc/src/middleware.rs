//! Middleware hooks around the controller.

use tracing::info;

use crate::app::Application;
use crate::context::Context;
use crate::error::Result;

/// Hooks run around every matched request.
///
/// `before` hooks run in registration order ahead of the controller. `after`
/// hooks run in the same order once the controller returns, and also when a
/// `before` hook or the controller failed. An error from either hook turns
/// the response into a 500.
pub trait Middleware: Send + Sync {
    /// Called before the controller.
    ///
    /// # Errors
    ///
    /// Any error aborts the remaining `before` hooks and the controller.
    fn before(&self, app: &Application, ctx: &mut Context<'_>) -> Result<()>;

    /// Called after the controller.
    ///
    /// # Errors
    ///
    /// Any error turns the response into a 500; the remaining `after` hooks
    /// still run.
    fn after(&self, app: &Application, ctx: &mut Context<'_>) -> Result<()>;

    /// Whether this middleware needs [`crate::Config::session`].
    fn uses_sessions(&self) -> bool {
        false
    }
}

/// Logs each request's method, path, handler and duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLog;

impl Middleware for AccessLog {
    fn before(&self, _app: &Application, ctx: &mut Context<'_>) -> Result<()> {
        info!(
            method = %ctx.request.method,
            path = %ctx.request.path,
            handler = %ctx.name,
            "-->"
        );
        Ok(())
    }

    fn after(&self, _app: &Application, ctx: &mut Context<'_>) -> Result<()> {
        info!(
            method = %ctx.request.method,
            path = %ctx.request.path,
            handler = %ctx.name,
            elapsed = ?ctx.elapsed(),
            "<--"
        );
        Ok(())
    }
}
