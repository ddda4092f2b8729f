//! Radix-tree request router with a middleware stack.
//!
//! One tree per HTTP method. O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps every route, outermost first.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::context::HttpContext;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxFuture, Endpoint, HandlerResult, Middleware, Next};
use crate::response::Response;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: Routes,
    layers: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Routes::default(), layers: Vec::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use wiretap::{Method, Request, Response, Router};
    /// # async fn get_echo(_: Request) -> Response { Response::text("") }
    /// # async fn post_echo(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/echo/{id}", get_echo)
    ///     .on(Method::POST, "/echo",      post_echo);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .trees
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Wrap every route in `middleware`. The first layer added is the
    /// outermost: it sees the call first and the response last.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl Endpoint for Router {
    fn call<'a>(&'a self, cx: &'a mut HttpContext) -> BoxFuture<'a, HandlerResult> {
        Next::new(&self.routes, &self.layers).run(cx)
    }
}

/// The route table on its own, without middleware.
#[derive(Default)]
struct Routes {
    trees: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Routes {
    fn lookup(&self, method: &Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.trees.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    fn matches_other_method(&self, method: &Method, path: &str) -> bool {
        self.trees
            .iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok())
    }

    async fn route(&self, cx: &mut HttpContext) -> HandlerResult {
        let method = cx.request().method().clone();
        let path = cx.request().path().to_owned();

        let response = match self.lookup(&method, &path) {
            Some((handler, params)) => {
                let req = cx.request_mut().detach(params);
                handler.call(req).await?
            }
            None if self.matches_other_method(&method, &path) => {
                Response::status(StatusCode::METHOD_NOT_ALLOWED)
            }
            None => Response::status(StatusCode::NOT_FOUND),
        };

        response.write_into(cx.response_mut()).await?;
        Ok(())
    }
}

impl Endpoint for Routes {
    fn call<'a>(&'a self, cx: &'a mut HttpContext) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.route(cx))
    }
}
