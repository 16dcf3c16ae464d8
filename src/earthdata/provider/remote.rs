//! RemoteCollection - ImageryProvider over the imagery service
//!
//! Binds an [`EarthdataClient`] to one image collection id (for example
//! `COPERNICUS/S5P/NRTI/L3_CO`). The client is shared behind an `Arc` so
//! one authenticated session serves every window query of a run.

use std::sync::Arc;

use async_trait::async_trait;

use crate::compositor::window::TimeRange;
use crate::earthdata::client::EarthdataClient;
use crate::earthdata::error::Result;
use crate::earthdata::raster::{RasterImage, Region};

use super::ImageryProvider;

/// Production provider: one collection of the remote imagery service.
#[derive(Clone)]
pub struct RemoteCollection {
    client: Arc<EarthdataClient>,
    collection: String,
}

impl RemoteCollection {
    pub fn new(client: Arc<EarthdataClient>, collection: impl Into<String>) -> Self {
        RemoteCollection {
            client,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn client(&self) -> &Arc<EarthdataClient> {
        &self.client
    }
}

#[async_trait]
impl ImageryProvider for RemoteCollection {
    async fn query(
        &self,
        region: &Region,
        range: &TimeRange,
        bands: &[String],
    ) -> Result<Vec<RasterImage>> {
        self.client
            .query_images(&self.collection, region, range, bands)
            .await
    }
}
