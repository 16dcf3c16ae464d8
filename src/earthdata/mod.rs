//! Imagery service client module
//!
//! Everything that talks to (or stands in for) the remote imagery service:
//!
//! - `client.rs`: HTTP client, authentication, wire decoding
//! - `provider/`: the [`ImageryProvider`] seam plus remote/in-memory impls
//! - `raster.rs`: regions, bands, source images
//! - `export.rs`: server-side video export tasks
//! - `error.rs`: error types

pub mod client;
pub mod error;
pub mod export;
pub mod provider;
pub mod raster;

// Re-exports for convenience
pub use client::EarthdataClient;
pub use error::{EarthdataError, Result};
pub use provider::{ImageryProvider, MemoryCollection, RemoteCollection};
pub use raster::{Band, RasterImage, Region};
