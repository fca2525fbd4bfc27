//! Chat message handling: classify inbound text, run it against the store and
//! render a localized reply.

pub mod inbound;
pub mod parse;
pub mod router;
pub mod transport;
pub mod worker;

pub use inbound::{Body, Inbound, Reply};
pub use parse::{parse_entry, ParseError};
pub use router::{AccessPolicy, MessageRouter};
pub use transport::ReplySender;
