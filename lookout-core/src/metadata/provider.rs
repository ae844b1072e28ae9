//! Metadata providers: production HTTP relay client and simulation.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{MetadataError, MetadataResult, StreamMetadata};
use crate::config::MetadataConfig;

/// Source of per-stream technical metadata.
///
/// Implementations may return fewer entries than requested; callers must
/// tolerate absent metadata and may retry with the same or a changed name
/// set at any time.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetches metadata for the named streams.
    ///
    /// # Errors
    ///
    /// - `MetadataError` - The provider as a whole is unreachable. Per-stream
    ///   failures are not errors; those entries are simply absent from the
    ///   returned map.
    async fn fetch_metadata(
        &self,
        names: &HashSet<String>,
    ) -> MetadataResult<HashMap<String, StreamMetadata>>;
}

/// Production provider querying the restream relay's streams API.
pub struct HttpMetadataProvider {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMetadataProvider {
    /// Creates a provider for the relay rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// - `MetadataError::InvalidEndpoint` - `base_url` cannot be extended
    ///   with the streams API path
    /// - `MetadataError::Request` - The HTTP client cannot be constructed
    pub fn new(base_url: &Url, config: &MetadataConfig) -> MetadataResult<Self> {
        let endpoint = base_url.join("api/streams")?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    async fn fetch_one(&self, stream: &str) -> MetadataResult<StreamMetadata> {
        let mut endpoint = self.endpoint.clone();
        endpoint.query_pairs_mut().append_pair("src", stream);

        let response = self.client.get(endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::RelayStatus {
                stream: stream.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| MetadataError::MalformedPayload {
            stream: stream.to_string(),
            source,
        })
    }
}

#[async_trait]
impl MetadataProvider for HttpMetadataProvider {
    async fn fetch_metadata(
        &self,
        names: &HashSet<String>,
    ) -> MetadataResult<HashMap<String, StreamMetadata>> {
        let fetches = names.iter().map(|name| async move {
            let result = self.fetch_one(name).await;
            (name, result)
        });

        let mut metadata = HashMap::new();
        for (name, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(entry) => {
                    metadata.insert(name.clone(), entry);
                }
                // A stream the relay cannot describe degrades to "no audio",
                // it must never fail the batch.
                Err(error) => {
                    tracing::warn!("metadata fetch for stream '{name}' failed: {error}");
                }
            }
        }

        Ok(metadata)
    }
}

/// In-memory provider for tests and offline development.
///
/// Knows a fixed set of streams; requests for other names come back empty,
/// matching a relay that has no producer for them yet. An optional artificial
/// delay makes deferred-arrival behavior observable in tests.
#[derive(Default)]
pub struct SimulationMetadataProvider {
    streams: HashMap<String, StreamMetadata>,
    delay: Option<Duration>,
    unavailable: bool,
}

impl SimulationMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a known stream.
    #[must_use]
    pub fn with_stream(mut self, name: impl Into<String>, metadata: StreamMetadata) -> Self {
        self.streams.insert(name.into(), metadata);
        self
    }

    /// Delays every fetch by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every fetch fail, simulating an unreachable relay.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl MetadataProvider for SimulationMetadataProvider {
    async fn fetch_metadata(
        &self,
        names: &HashSet<String>,
    ) -> MetadataResult<HashMap<String, StreamMetadata>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable {
            return Err(MetadataError::Unavailable {
                reason: "simulated relay outage".to_string(),
            });
        }

        Ok(names
            .iter()
            .filter_map(|name| {
                self.streams
                    .get(name)
                    .map(|metadata| (name.clone(), metadata.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ProducerMetadata;

    fn audio_metadata(codec: &str) -> StreamMetadata {
        StreamMetadata {
            producers: vec![ProducerMetadata {
                url: None,
                medias: vec![format!("audio, recvonly, {codec}")],
            }],
        }
    }

    fn names(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_simulation_returns_partial_results() {
        let provider = SimulationMetadataProvider::new()
            .with_stream("front_sub", audio_metadata("AAC"));

        let metadata = provider
            .fetch_metadata(&names(&["front_sub", "back_sub"]))
            .await
            .expect("simulation fetch succeeds");

        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("front_sub"));
        assert!(!metadata.contains_key("back_sub"));
    }

    #[tokio::test]
    async fn test_simulation_unavailable_fails_whole_batch() {
        let provider = SimulationMetadataProvider::new().unavailable();

        let result = provider.fetch_metadata(&names(&["front_sub"])).await;
        assert!(matches!(result, Err(MetadataError::Unavailable { .. })));
    }

    #[test]
    fn test_http_provider_endpoint_construction() {
        let base = Url::parse("http://127.0.0.1:1984/").expect("valid base url");
        let provider = HttpMetadataProvider::new(&base, &MetadataConfig::default())
            .expect("provider construction succeeds");

        assert_eq!(provider.endpoint.as_str(), "http://127.0.0.1:1984/api/streams");
    }
}
