//! The routing table: an explicit, immutable mapping from
//! (method, exact path) pairs to handlers. Built by the caller before the
//! server starts and never mutated afterwards.

use crate::error::{ServerError, ServerResult};
use crate::http::{Method, Request, Response};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;

/// A unit of logic that produces a response for a matched request.
///
/// Blanket-implemented for async fns and closures of the shape
/// `Fn(Request) -> impl Future<Output = ServerResult<Response>>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, ServerResult<Response>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServerResult<Response>> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, ServerResult<Response>> {
        Box::pin((self)(req))
    }
}

pub(crate) struct Route {
    handler: Box<dyn Handler>,
}

pub struct Router {
    routes: HashMap<String, HashMap<Method, Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Registers a handler for an exact (method, path) pair.
    ///
    /// Matching is on the exact path string. No path parameters, no
    /// prefix matching, no trailing-slash normalization.
    pub fn route<H>(&mut self, method: Method, path: &str, handler: H) -> &mut Self
    where
        H: Handler,
    {
        self.routes.entry(path.to_owned()).or_default().insert(
            method,
            Route {
                handler: Box::new(handler),
            },
        );
        self
    }

    /// Registers a GET route handler
    pub fn get<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::GET, path, handler)
    }

    /// Registers a POST route handler
    pub fn post<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::POST, path, handler)
    }

    /// Registers a PUT route handler
    pub fn put<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::PUT, path, handler)
    }

    /// Registers a DELETE route handler
    pub fn delete<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::DELETE, path, handler)
    }

    /// Routes a request to its handler, or produces the default routing
    /// error: `NotFound` for an unmatched path, `MethodNotAllowed` with
    /// the registered methods for a matched path.
    pub(crate) async fn dispatch(&self, req: Request) -> ServerResult<Response> {
        let route = self.lookup(req.method, &req.path)?;
        route.handler.call(req).await
    }

    fn lookup(&self, method: Method, path: &str) -> ServerResult<&Route> {
        let routes = self.routes.get(path).ok_or(ServerError::NotFound)?;
        routes.get(&method).ok_or_else(|| {
            let mut allowed: Vec<Method> = routes.keys().copied().collect();
            allowed.sort();
            ServerError::MethodNotAllowed { allowed }
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hello(_req: Request) -> ServerResult<Response> {
        let mut res = Response::new(200);
        res.body("Hello world");
        Ok(res)
    }

    fn request(method: Method, path: &str) -> Request {
        Request {
            method,
            path: path.to_string(),
            headers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn dispatches_matching_method_and_path() {
        let mut router = Router::new();
        router.get("/", hello);

        let response = router.dispatch(request(Method::GET, "/")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Hello world");
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        let mut router = Router::new();
        router.get("/", hello);

        let err = router
            .dispatch(request(Method::GET, "/missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound));
    }

    #[tokio::test]
    async fn paths_match_exactly() {
        let mut router = Router::new();
        router.get("/", hello);

        for path in ["//", "/.", "/index.html", ""] {
            let err = router.dispatch(request(Method::GET, path)).await.unwrap_err();
            assert!(matches!(err, ServerError::NotFound), "path {:?}", path);
        }
    }

    #[tokio::test]
    async fn wrong_method_reports_allowed_methods() {
        let mut router = Router::new();
        router.get("/", hello);
        router.post("/", hello);

        let err = router
            .dispatch(request(Method::DELETE, "/"))
            .await
            .unwrap_err();
        match err {
            ServerError::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn closure_handlers_are_accepted() {
        let mut router = Router::new();
        router.put("/item", |req: Request| async move {
            let mut res = Response::new(200);
            res.body(&req.path);
            Ok::<Response, ServerError>(res)
        });

        let response = router
            .dispatch(request(Method::PUT, "/item"))
            .await
            .unwrap();
        assert_eq!(response.body, "/item");
    }
}
