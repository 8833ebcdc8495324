use crate::http::Method;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ServerError {
    BindError { addr: String, source: io::Error },
    IoError(io::Error),
    BadRequest(String),
    NotFound,
    MethodNotAllowed { allowed: Vec<Method> },
    InternalError(String),
    PanicError(String),
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) => 400,
            ServerError::NotFound => 404,
            ServerError::MethodNotAllowed { .. } => 405,
            ServerError::BindError { .. }
            | ServerError::IoError(_)
            | ServerError::InternalError(_)
            | ServerError::PanicError(_) => 500,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::BindError { addr, source } => {
                write!(f, "Failed to bind {}: {}", addr, source)
            }
            ServerError::IoError(err) => write!(f, "IO error: {}", err),
            ServerError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ServerError::NotFound => write!(f, "Not found"),
            ServerError::MethodNotAllowed { .. } => write!(f, "Method not allowed"),
            ServerError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ServerError::PanicError(msg) => write!(f, "Panic: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::BindError { source, .. } => Some(source),
            ServerError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        ServerError::IoError(err)
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
