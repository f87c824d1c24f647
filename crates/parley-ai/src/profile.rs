//! Backend profiles and the routing table that resolves them by key

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// A named configuration describing how to reach and call the inference
/// backend. Immutable once resolved; many profiles may coexist so different
/// keys can route to different models or endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendProfile {
    /// Base URL of the backend
    pub endpoint: String,
    /// Route appended to the endpoint
    #[serde(default = "default_route")]
    pub route: String,
    /// Hard call-level deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Model id sent on every request
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Context window size in tokens
    #[serde(default = "default_context_window")]
    pub context_window: u32,
    /// Whether responses stream over SSE
    #[serde(default)]
    pub streaming: bool,
    /// Optional response-format hint passed through to the backend
    #[serde(default)]
    pub response_format: Option<String>,
}

fn default_route() -> String {
    "/responses".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_context_window() -> u32 {
    128_000
}

impl BackendProfile {
    /// The profile's call deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full request URL
    pub fn url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), self.route)
    }
}

/// Routing table from configuration key to backend profile. Populated once
/// at process start and static for the process lifetime, so no caching or
/// locking is needed.
#[derive(Debug, Clone, Default)]
pub struct ProfileRouter {
    profiles: HashMap<String, BackendProfile>,
}

impl ProfileRouter {
    /// Build a router over a fixed set of profiles
    pub fn new(profiles: HashMap<String, BackendProfile>) -> Self {
        Self { profiles }
    }

    /// Resolve a configuration key to its profile. Pure lookup; fails with
    /// `UnknownProfile` when the key has no match.
    pub fn resolve(&self, key: &str) -> Result<&BackendProfile> {
        self.profiles
            .get(key)
            .ok_or_else(|| Error::UnknownProfile(key.to_string()))
    }

    /// All configured profile keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> BackendProfile {
        BackendProfile {
            endpoint: "https://backend.test/v1".to_string(),
            route: "/responses".to_string(),
            timeout_secs: 30,
            model: "gpt-test".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(1024),
            context_window: 128_000,
            streaming: true,
            response_format: None,
        }
    }

    #[test]
    fn test_resolve_known_key() {
        let router = ProfileRouter::new(HashMap::from([("default".to_string(), sample_profile())]));
        let profile = router.resolve("default").unwrap();
        assert_eq!(profile.model, "gpt-test");
        assert!(profile.streaming);
    }

    #[test]
    fn test_resolve_unknown_key() {
        let router = ProfileRouter::new(HashMap::from([("default".to_string(), sample_profile())]));
        let err = router.resolve("exam-grader").unwrap_err();
        assert!(matches!(err, Error::UnknownProfile(key) if key == "exam-grader"));
    }

    #[test]
    fn test_url_joins_endpoint_and_route() {
        let mut profile = sample_profile();
        profile.endpoint = "https://backend.test/v1/".to_string();
        assert_eq!(profile.url(), "https://backend.test/v1/responses");
    }

    #[test]
    fn test_profile_from_toml_with_defaults() {
        let profile: BackendProfile = toml::from_str(
            r#"
            endpoint = "https://backend.test/v1"
            model = "gpt-test"
            "#,
        )
        .unwrap();
        assert_eq!(profile.route, "/responses");
        assert_eq!(profile.timeout_secs, 120);
        assert!(!profile.streaming);
        assert!(profile.temperature.is_none());
    }
}
