use jsonrpsee::core::RegisterMethodError;
use std::{
    io::{self, ErrorKind},
    net::SocketAddr,
};

/// Rpc server kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    /// Http.
    Http(SocketAddr),
    /// Websocket.
    WS(SocketAddr),
    /// WS and http on the same port
    WsHttp(SocketAddr),
}

impl ServerKind {
    /// Returns the socket address of the server.
    pub const fn socket_address(&self) -> SocketAddr {
        match self {
            Self::Http(addr) | Self::WS(addr) | Self::WsHttp(addr) => *addr,
        }
    }
}

impl std::fmt::Display for ServerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(addr) => write!(f, "{addr} (HTTP-RPC server)"),
            Self::WS(addr) => write!(f, "{addr} (WS-RPC server)"),
            Self::WsHttp(addr) => write!(f, "{addr} (WS-HTTP-RPC server)"),
        }
    }
}

/// Rpc Errors.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Thrown during server start.
    #[error("Failed to start {kind}: {error}")]
    ServerError {
        /// Server kind.
        kind: ServerKind,
        /// IO error.
        error: io::Error,
    },
    /// Address already in use.
    #[error("address {kind} is already in use (os error 98). Choose a different port using {}", .kind.flags())]
    AddressAlreadyInUse {
        /// Server kind.
        kind: ServerKind,
        /// IO error.
        error: io::Error,
    },
    /// Http and WS server configured on the same port but with different modules.
    #[error("{0}")]
    WsHttpSamePortError(#[from] WsHttpSamePortError),
    /// Two services registered the same method.
    #[error(transparent)]
    RegisterMethod(#[from] RegisterMethodError),
}

impl RpcError {
    /// Converts an [`io::Error`] raised while binding the server into an [`RpcError`].
    pub fn server_error(io_error: io::Error, kind: ServerKind) -> Self {
        if io_error.kind() == ErrorKind::AddrInUse {
            return Self::AddressAlreadyInUse { kind, error: io_error }
        }
        Self::ServerError { kind, error: io_error }
    }
}

impl ServerKind {
    /// The command line flags that configure this server's port.
    const fn flags(&self) -> &'static str {
        match self {
            Self::Http(_) => "--http.port",
            Self::WS(_) => "--ws.port",
            Self::WsHttp(_) => "--ws.port and --http.port",
        }
    }
}

/// Errors when trying to launch ws and http server on the same port.
#[derive(Debug, thiserror::Error)]
#[error(
    "http and ws server on the same port {addr} must serve the same modules: http {http}, ws {ws}"
)]
pub struct WsHttpSamePortError {
    /// The shared address
    pub addr: SocketAddr,
    /// Modules of the http server
    pub http: String,
    /// Modules of the ws server
    pub ws: String,
}
