//! # Hellod
//!
//! A minimal async HTTP/1.1 server that answers `GET /` with a fixed
//! greeting.
//!
//! The routing table is built explicitly by the caller and handed to the
//! server at bind time, so there is no ambient global state: construct a
//! [`Router`], register handlers, bind, serve.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hellod::{Request, Response, Router, Server, ServerResult};
//!
//! async fn hello(_req: Request) -> ServerResult<Response> {
//!     let mut res = Response::new(200);
//!     res.body("Hello world");
//!     Ok(res)
//! }
//!
//! #[tokio::main]
//! async fn main() -> ServerResult<()> {
//!     let mut router = Router::new();
//!     router.get("/", hello);
//!
//!     let server = Server::bind("0.0.0.0:8080", router).await?;
//!     server.serve().await
//! }
//! ```
//!
//! Unmatched paths receive the default `404` response and a matched path
//! with an unregistered method receives `405` with an `Allow` header. A
//! failed bind surfaces as [`ServerError::BindError`] instead of a crash,
//! leaving the retry decision to the caller.

pub mod error;
pub mod http;
pub mod router;
pub mod server;

pub use error::{ServerError, ServerResult};
pub use http::{Method, Request, Response};
pub use router::Router;
pub use server::Server;
