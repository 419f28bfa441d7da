//! # Multisig RPC
//!
//! Request/response surface of the multisig coordinator. Every call takes a
//! camelCase JSON body with hex-encoded binary fields and returns either a
//! response body or an [`RpcError`] carrying a code and an HTTP-style status.
//!
//! The handler is transport-agnostic: callers route `(method, params)` pairs
//! to [`RpcHandler::handle`] or call the typed methods directly.

pub mod error;
pub mod handler;
pub mod messages;

pub use error::{RpcError, RpcResult};
pub use handler::RpcHandler;
pub use messages::methods;
