//! HTTP client for a Google-style geocoding endpoint.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use nestwatch_common::{Config, Coordinate};

use crate::traits::{Geocoded, Geocoder};

pub struct HttpGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGeocoder {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.geocoder_url, config.geocoder_api_key.as_deref())
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Geocoded> {
        let mut request = self.client.get(&self.endpoint).query(&[("address", address)]);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("geocoding endpoint returned status {status}");
        }

        let body: GeocodeResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => {
                let first = body
                    .results
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("OK geocode response with no results"))?;
                // A political-boundary match resolves an area, not an address.
                let approximate = first.types.iter().any(|t| t == "political");
                Ok(Geocoded::Match {
                    location: Coordinate {
                        lat: first.geometry.location.lat,
                        lng: first.geometry.location.lng,
                    },
                    approximate,
                })
            }
            "OVER_QUERY_LIMIT" => Ok(Geocoded::QuotaExceeded),
            "ZERO_RESULTS" => Ok(Geocoded::ZeroResults),
            "REQUEST_DENIED" => Ok(Geocoded::Denied),
            other => anyhow::bail!("unexpected geocoder status: {other}"),
        }
    }
}
