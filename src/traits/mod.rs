//! Trait abstractions for dependency injection.
//!
//! Sessions talk to the backend through [`StreamTransport`] so tests can
//! substitute scripted byte streams for a live HTTP connection.

mod transport;

pub use transport::{ByteStream, StreamTransport};
