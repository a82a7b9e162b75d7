//! Request dispatch: resolve, construct, run middleware and the controller,
//! render.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};

use oxide_router::{Request, Response};
use tracing::{debug, error};

use crate::app::Application;
use crate::context::Context;
use crate::controller::Controller;
use crate::render::Render;
use crate::renderer::Renderer;

impl Application {
    /// Handles one request and returns its response.
    ///
    /// Never panics and never fails: an unmatched path yields the 404 page,
    /// and a failure or panic in middleware, the controller or the renderer
    /// yields the 500 page. Every middleware's `after` hook runs exactly once
    /// for a matched request, in registration order, whatever happened
    /// before it.
    pub fn handle(&self, request: Request) -> Response {
        debug!(method = %request.method, path = %request.path, "Dispatching request");

        let matched = match self.routes().resolve(request.method, &request.path) {
            Ok(matched) => matched,
            Err(err) => {
                debug!(error = %err, "No route matched");
                return self.reject(request, 404);
            }
        };
        let route = matched.route;

        let fallback = Request::new(request.method, request.path.clone());
        let mut ctx = match Context::new(self, route.name(), request, matched.params) {
            Ok(ctx) => ctx,
            Err(err) => {
                error!(handler = %route.name(), error = %err, "Failed to construct context");
                return self.reject(fallback, 500);
            }
        };

        let render = self.run(&mut ctx, route.handler().as_ref());
        let response = self.render(ctx, render);
        debug!(status = response.status, "Request finished");
        response
    }

    /// Runs the `before` hooks and the controller, then every `after` hook.
    /// Returns `None` when anything failed.
    fn run(&self, ctx: &mut Context<'_>, controller: &dyn Controller) -> Option<Render> {
        let mut faults = Vec::new();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            for middleware in self.middleware() {
                middleware.before(self, ctx)?;
            }
            controller.handle(ctx)
        }));
        let render = match outcome {
            Ok(Ok(render)) => Some(render),
            Ok(Err(err)) => {
                faults.push(err.to_string());
                None
            }
            Err(panic) => {
                faults.push(panic_message(panic.as_ref()));
                None
            }
        };

        for middleware in self.middleware() {
            match catch_unwind(AssertUnwindSafe(|| middleware.after(self, ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => faults.push(err.to_string()),
                Err(panic) => faults.push(panic_message(panic.as_ref())),
            }
        }

        if faults.is_empty() {
            return render;
        }
        let message = faults.join("; ");
        let backtrace = Backtrace::capture();
        error!(
            handler = %ctx.name,
            error = %message,
            backtrace = %backtrace,
            "Request failed"
        );
        None
    }

    /// Renders `render`, or the 500 page when it is `None` or rendering
    /// fails.
    fn render(&self, mut ctx: Context<'_>, render: Option<Render>) -> Response {
        let rendered = render.map(|render| {
            catch_unwind(AssertUnwindSafe(|| Renderer::execute(&mut ctx, render)))
        });

        match rendered {
            Some(Ok(Ok(()))) => return ctx.into_response(),
            Some(Ok(Err(err))) => {
                error!(handler = %ctx.name, error = %err, "Render failed");
            }
            Some(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                let backtrace = Backtrace::capture();
                error!(
                    handler = %ctx.name,
                    error = %message,
                    backtrace = %backtrace,
                    "Render panicked"
                );
            }
            None => {}
        }

        ctx.response.body.clear();
        if catch_unwind(AssertUnwindSafe(|| Renderer::render_error(&mut ctx, 500, None))).is_err() {
            return Response::plain_error(500);
        }
        ctx.into_response()
    }

    /// Answers `request` with the error page for `status` without running
    /// middleware or a controller.
    pub(crate) fn reject(&self, request: Request, status: u16) -> Response {
        let mut ctx = Context::detached(self, format!("errors/{status}"), request);
        match catch_unwind(AssertUnwindSafe(|| Renderer::render_error(&mut ctx, status, None))) {
            Ok(()) => ctx.into_response(),
            Err(_) => Response::plain_error(status),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send + 'static)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic".to_string()
    }
}
