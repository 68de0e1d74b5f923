//! Environment, request and response descriptors
//!
//! Descriptors turn transport-specific objects into the plain context maps
//! the buffered logger merges into every entry. A request descriptor also
//! supplies the session/request correlation pair that ends buffering.

pub mod cli;
pub mod environment;
pub mod http;
pub mod response;

use crate::core::LogContext;
use std::fmt;

pub use self::cli::{CliRequest, CommandLayout};
pub use self::environment::{AppEnv, CLI_SAPI};
pub use self::http::{HttpRequest, RequestId, SessionId};
pub use self::response::HttpResponse;

/// Maximum number of characters of a query or argument list kept in a signature
pub const SIGNATURE_TAIL_LIMIT: usize = 45;

/// Process identity merged into every dispatched entry
pub trait EnvironmentDescriptor: fmt::Debug + Send + Sync {
    /// `app`, `ver`, `env` and `sapi`, followed by any extension arguments
    fn arguments(&self) -> LogContext;
}

/// Inbound unit of work (an HTTP request or a CLI invocation)
pub trait RequestDescriptor: fmt::Debug + Send + Sync {
    /// Session id, empty when unknown
    fn session_id(&self) -> &str;

    /// Request id, empty when unknown
    fn request_id(&self) -> &str;

    /// Arguments included in the request summary event
    fn summary_arguments(&self) -> LogContext;

    /// Short human readable form of the request
    fn signature(&self) -> String;
}

/// Outcome of a unit of work
pub trait ResponseDescriptor: fmt::Debug + Send + Sync {
    fn summary_arguments(&self) -> LogContext;
}

/// Append `tail` to `head`, cutting it at [`SIGNATURE_TAIL_LIMIT`] characters
pub(crate) fn signature_with_tail(head: String, separator: char, tail: &str) -> String {
    if tail.is_empty() {
        return head;
    }

    let mut signature = head;
    signature.push(separator);

    match tail.char_indices().nth(SIGNATURE_TAIL_LIMIT) {
        Some((cut, _)) => {
            signature.push_str(&tail[..cut]);
            signature.push_str("...");
        }
        None => signature.push_str(tail),
    }

    signature
}
