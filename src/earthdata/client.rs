//! Core HTTP client for the imagery service
//!
//! The service exposes an Earth-Engine-style JSON API scoped to a project:
//! `POST {base}/v1/projects/{project}/images:query` returns the source
//! images of a collection for a region, date range, and band selection,
//! with pixel grids shipped as base64-encoded little-endian f64.
//!
//! The client owns transport policy (TLS, timeout, bearer auth); callers
//! create it once, share it behind an `Arc`, and reuse it across windows.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compositor::window::TimeRange;

use super::error::{EarthdataError, Result};
use super::raster::{Band, RasterImage, Region};

/// Default per-request timeout. The core defines no timeouts of its own;
/// this is transport policy and can be overridden at construction.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Main imagery service client
#[derive(Debug)]
pub struct EarthdataClient {
    http: reqwest::Client,
    base_uri: String,
    project: String,
    token: String,
}

impl EarthdataClient {
    /// Create a new client for the given endpoint, token, and project.
    pub fn connect(endpoint: impl Into<String>, token: impl Into<String>, project: impl Into<String>) -> Result<Self> {
        Self::connect_with_timeout(endpoint, token, project, DEFAULT_TIMEOUT)
    }

    /// Like [`EarthdataClient::connect`] with an explicit request timeout.
    pub fn connect_with_timeout(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        project: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(EarthdataError::Config(format!(
                "invalid endpoint '{}': expected an http(s) URI",
                endpoint
            )));
        }
        let token = token.into();
        if token.is_empty() {
            return Err(EarthdataError::Auth("empty access token".to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(EarthdataClient {
            http,
            base_uri: endpoint.trim_end_matches('/').to_string(),
            project: project.into(),
            token,
        })
    }

    /// Create a new client from environment variables.
    ///
    /// Required:
    /// - `EARTHDATA_URI`: service endpoint, e.g. `https://earthdata.example.com`
    /// - `EARTHDATA_TOKEN`: bearer token
    /// - `EARTHDATA_PROJECT`: project identifier the queries are billed to
    pub fn from_env() -> Result<Self> {
        let uri = std::env::var("EARTHDATA_URI")
            .map_err(|_| EarthdataError::Config("EARTHDATA_URI not set".to_string()))?;
        let token = std::env::var("EARTHDATA_TOKEN")
            .map_err(|_| EarthdataError::Config("EARTHDATA_TOKEN not set".to_string()))?;
        let project = std::env::var("EARTHDATA_PROJECT")
            .map_err(|_| EarthdataError::Config("EARTHDATA_PROJECT not set".to_string()))?;
        Self::connect(uri, token, project)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Verify the endpoint and credentials with a cheap project lookup.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/v1/projects/{}", self.base_uri, self.project);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("x-request-id", Uuid::new_v4().to_string())
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Query all source images of `collection` for the region, date range,
    /// and band selection. The date range is half-open: `[start, end)`.
    pub async fn query_images(
        &self,
        collection: &str,
        region: &Region,
        range: &TimeRange,
        bands: &[String],
    ) -> Result<Vec<RasterImage>> {
        let request = QueryRequest {
            collection: collection.to_string(),
            region: region.clone(),
            start_date: range.start.format("%Y-%m-%d").to_string(),
            end_date: range.end.format("%Y-%m-%d").to_string(),
            bands: bands.to_vec(),
        };
        let response: QueryResponse = self
            .post_json(&format!("projects/{}/images:query", self.project), &request)
            .await?;

        let mut images = Vec::with_capacity(response.images.len());
        for wire in response.images {
            images.push(wire.decode()?);
        }
        Ok(images)
    }

    /// Fetch the boundary polylines of a vector dataset (for example
    /// `USDOS/LSIB_SIMPLE/2017`) clipped to a region. Used for the border
    /// overlay of animation frames; drawing happens client-side.
    pub async fn query_boundaries(
        &self,
        dataset: &str,
        region: &Region,
    ) -> Result<Vec<Vec<[f64; 2]>>> {
        let request = BoundaryRequest {
            dataset: dataset.to_string(),
            region: region.clone(),
        };
        let response: BoundaryResponse = self
            .post_json(&format!("projects/{}/tables:query", self.project), &request)
            .await?;
        Ok(response
            .features
            .into_iter()
            .map(|f| f.geometry)
            .collect())
    }

    /// POST a JSON body to `{base}/v1/{path}` and decode a JSON response.
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/v1/{}", self.base_uri, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("x-request-id", Uuid::new_v4().to_string())
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// GET `{base}/v1/{path}` and decode a JSON response.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/v1/{}", self.base_uri, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("x-request-id", Uuid::new_v4().to_string())
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(EarthdataError::Auth(format!("{}: {}", status, body)));
        }
        Ok(response.error_for_status()?)
    }
}

/// Wire request for `images:query`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    collection: String,
    region: Region,
    start_date: String,
    end_date: String,
    bands: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    images: Vec<WireImage>,
}

/// Wire request for `tables:query`.
#[derive(Debug, Clone, Serialize)]
struct BoundaryRequest {
    dataset: String,
    region: Region,
}

#[derive(Debug, Deserialize)]
struct BoundaryResponse {
    #[serde(default)]
    features: Vec<BoundaryFeature>,
}

#[derive(Debug, Deserialize)]
struct BoundaryFeature {
    /// Polyline vertices as (lon, lat) pairs.
    geometry: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireImage {
    id: String,
    time_start_ms: i64,
    width: u32,
    height: u32,
    bands: Vec<WireBand>,
}

#[derive(Debug, Deserialize)]
struct WireBand {
    name: String,
    data: String,
}

impl WireImage {
    fn decode(self) -> Result<RasterImage> {
        let mut bands = Vec::with_capacity(self.bands.len());
        for wire in self.bands {
            bands.push(Band::from_base64(wire.name, self.width, self.height, &wire.data)?);
        }
        Ok(RasterImage::new(self.id, self.time_start_ms, bands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_rejects_bad_endpoint() {
        let err = EarthdataClient::connect("earthdata.example.com", "token", "proj").unwrap_err();
        assert!(matches!(err, EarthdataError::Config(_)));
    }

    #[test]
    fn connect_rejects_empty_token() {
        let err = EarthdataClient::connect("https://earthdata.example.com", "", "proj").unwrap_err();
        assert!(matches!(err, EarthdataError::Auth(_)));
    }

    #[test]
    fn connect_strips_trailing_slash() {
        let client =
            EarthdataClient::connect("https://earthdata.example.com/", "token", "proj").unwrap();
        assert_eq!(client.base_uri, "https://earthdata.example.com");
        assert_eq!(client.project(), "proj");
    }

    #[test]
    fn wire_image_decodes_bands() {
        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD.encode(
            [1.0f64, 2.0]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect::<Vec<u8>>(),
        );
        let wire = WireImage {
            id: "img".to_string(),
            time_start_ms: 0,
            width: 2,
            height: 1,
            bands: vec![WireBand {
                name: "co".to_string(),
                data,
            }],
        };
        let image = wire.decode().unwrap();
        assert_eq!(image.band("co").unwrap().values, vec![1.0, 2.0]);
    }
}
