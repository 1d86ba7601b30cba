//! Transports an adapter can execute against.
//!
//! Each adapter owns exactly one transport; the adapter dispatches on the
//! variant with an exhaustive match, so adding a transport is a compile error
//! everywhere it is not yet handled.

pub mod auth;
pub mod chunked;
pub mod driver;
pub mod http;

pub use auth::AuthProvider;
pub use chunked::{ChunkSource, ChunkStream};
pub use driver::{DriverConnection, DriverRows};
pub use http::{build_client, HttpChunkSource, HttpEndpoint, HttpStatementApi};

use crate::fetch::FetchDriver;
use sqlbridge_commons::Result;
use std::fmt;

/// Transport family of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Synchronous driver returning row cursors
    Driver,
    /// HTTP endpoint streaming delimited text in chunks
    ChunkedHttp,
    /// HTTP statement API with polling, partitions or pages
    PagedHttp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Driver => write!(f, "driver"),
            TransportKind::ChunkedHttp => write!(f, "chunked_http"),
            TransportKind::PagedHttp => write!(f, "paged_http"),
        }
    }
}

pub enum Transport {
    Driver(Box<dyn DriverConnection>),
    ChunkedHttp(Box<dyn ChunkSource>),
    PagedHttp(FetchDriver),
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport({})", self.kind())
    }
}

impl Transport {
    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::Driver(_) => TransportKind::Driver,
            Transport::ChunkedHttp(_) => TransportKind::ChunkedHttp,
            Transport::PagedHttp(_) => TransportKind::PagedHttp,
        }
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            Transport::Driver(connection) => connection.close(),
            Transport::ChunkedHttp(source) => source.close(),
            Transport::PagedHttp(driver) => driver.close(),
        }
    }
}
