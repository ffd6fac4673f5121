//! Edge discovery for freshly ingested entries.

mod builder;

pub use builder::{ConnectError, ConnectionBuilder};
