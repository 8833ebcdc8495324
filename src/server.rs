//! The listener and per-connection plumbing: accept, parse one request,
//! dispatch through the router, write one response, close.

use crate::error::{ServerError, ServerResult};
use crate::http::{reason_phrase, Method, Request, Response};
use crate::router::Router;
use futures::FutureExt;
use std::collections::HashMap;
use std::io::Error;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// A bound listening socket together with the routing configuration it
/// serves. The router is fixed once the server is constructed.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// A failed bind (port already in use, unparseable or unavailable
    /// address) is returned as [`ServerError::BindError`] so the caller
    /// decides whether to retry, back off, or give up.
    ///
    /// ```rust,no_run
    /// # use hellod::{Router, Server};
    /// # async fn start() -> Result<(), hellod::ServerError> {
    /// let server = Server::bind("0.0.0.0:8080", Router::new()).await?;
    /// server.serve().await
    /// # }
    /// ```
    pub async fn bind(addr: &str, router: Router) -> ServerResult<Server> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::BindError {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Server {
            listener,
            router: Arc::new(router),
        })
    }

    /// The address the listener is bound to. Useful when binding port 0.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the process is terminated. Each
    /// connection is handled on its own task; accept errors are logged
    /// and the loop keeps going.
    pub async fn serve(self) -> ServerResult<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let router = Arc::clone(&self.router);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(router, stream).await {
                            warn!("connection error from {}: {}", peer, err);
                        }
                    });
                }
                Err(err) => warn!("accept failed: {}", err),
            }
        }
    }
}

/// Serves a single request on the stream and closes it. Parse failures
/// get the default 400 rejection, routing misses the default 404/405,
/// and a panicking handler is caught and turned into a 500 so the rest
/// of the server keeps serving.
async fn handle_connection<S>(router: Arc<Router>, mut stream: S) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(&mut stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    if request_line.trim().is_empty() {
        return Ok(());
    }

    let response = match parse_request(&mut reader, &request_line).await {
        Ok(req) => {
            debug!("{} {}", req.method, req.path);
            respond(&router, req).await
        }
        Err(err) => Response::error(err),
    };

    let mut message = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status,
        reason_phrase(response.status)
    );
    for (name, value) in &response.headers {
        message += &format!("{}: {}\r\n", name, value);
    }
    message += &format!("Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now()));
    message += "Connection: close\r\n";
    message += &format!("Content-Length: {}\r\n\r\n{}", response.body.len(), response.body);
    stream.write_all(message.as_bytes()).await?;
    Ok(())
}

async fn respond(router: &Router, req: Request) -> Response {
    let outcome = AssertUnwindSafe(router.dispatch(req)).catch_unwind().await;
    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => Response::error(err),
        Err(panic) => {
            let msg = if let Some(msg) = panic.downcast_ref::<&str>() {
                msg.to_string()
            } else if let Some(msg) = panic.downcast_ref::<String>() {
                msg.clone()
            } else {
                "Unknown panic".to_string()
            };
            Response::error(ServerError::PanicError(msg))
        }
    }
}

/// Reads the head of one request. Only the request line and headers are
/// consumed; any body on the connection is left unread.
async fn parse_request<R>(reader: &mut R, request_line: &str) -> ServerResult<Request>
where
    R: AsyncBufRead + Unpin,
{
    let mut parts = request_line.trim().split_whitespace();
    let method_token = parts
        .next()
        .ok_or_else(|| ServerError::BadRequest("Missing method".to_string()))?;
    let target = parts
        .next()
        .ok_or_else(|| ServerError::BadRequest("Missing request target".to_string()))?;
    let method = Method::parse(method_token).ok_or_else(|| {
        ServerError::BadRequest(format!("Unsupported method: {}", method_token))
    })?;

    // The query component is stripped, not consumed
    let path = match target.split_once('?') {
        Some((path, _)) => path,
        None => target,
    }
    .to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        if line.trim().is_empty() {
            break;
        }

        if let Some((key, value)) = line.trim().split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Ok(Request {
        method,
        path,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    async fn hello(_req: Request) -> ServerResult<Response> {
        let mut res = Response::new(200);
        res.body("Hello world");
        Ok(res)
    }

    async fn boom(_req: Request) -> ServerResult<Response> {
        panic!("handler blew up");
    }

    fn test_router() -> Arc<Router> {
        let mut router = Router::new();
        router.get("/", hello);
        router.get("/boom", boom);
        Arc::new(router)
    }

    async fn roundtrip(raw: &str) -> String {
        let (mut client, server_side) = duplex(4096);
        let task = tokio::spawn(handle_connection(test_router(), server_side));

        client.write_all(raw.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        task.await.unwrap().unwrap();
        response
    }

    #[tokio::test]
    async fn serves_the_greeting() {
        let response = roundtrip("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
        assert!(response.contains("Content-Length: 11\r\n"));
        assert!(response.ends_with("\r\n\r\nHello world"));
    }

    #[tokio::test]
    async fn strips_the_query_before_routing() {
        let response = roundtrip("GET /?name=world HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    }

    #[tokio::test]
    async fn unknown_path_gets_404() {
        let response = roundtrip("GET /nope HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"), "{response}");
    }

    #[tokio::test]
    async fn wrong_method_gets_405_with_allow() {
        let response = roundtrip("POST / HTTP/1.1\r\n\r\n").await;
        assert!(
            response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"),
            "{response}"
        );
        assert!(response.contains("Allow: GET\r\n"));
    }

    #[tokio::test]
    async fn unknown_method_token_gets_400() {
        let response = roundtrip("FROB / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
    }

    #[tokio::test]
    async fn truncated_request_line_gets_400() {
        let response = roundtrip("garbage\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
    }

    #[tokio::test]
    async fn empty_connection_is_closed_quietly() {
        let response = roundtrip("").await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn handler_panic_becomes_500() {
        let response = roundtrip("GET /boom HTTP/1.1\r\n\r\n").await;
        assert!(
            response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"),
            "{response}"
        );
    }
}
