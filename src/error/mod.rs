//! Error types for the stream core.
//!
//! The only taxonomy the core owns is [`StreamError`]: everything that can
//! go wrong between the first byte of a stream and its terminal snapshot.
//! Transport-level failures raised before a stream is established live on
//! the client in [`crate::atelier::AtelierError`].

mod stream;

pub use stream::StreamError;
