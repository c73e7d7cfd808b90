//! Terminal host for the todo client core: executes the core's requests
//! over HTTP with ureq.

pub mod transport;

pub use transport::UreqTransport;
