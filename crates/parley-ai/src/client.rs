//! HTTP client for the inference backend

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};

use crate::error::{Error, Result};
use crate::profile::BackendProfile;
use crate::stream::TransportStream;
use crate::types::{InboundResponse, OutboundRequest};

/// Environment variable consulted for the backend API key
pub const API_KEY_ENV_VAR: &str = "PARLEY_API_KEY";

/// Sentinel frame closing a streamed response
pub const STREAM_TERMINATOR: &str = "[DONE]";

/// The call surface the orchestration layer depends on. `InferenceClient`
/// is the production implementation; tests substitute stubs.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue a non-streaming call and return the decoded response
    async fn send(
        &self,
        request: &OutboundRequest,
        profile: &BackendProfile,
    ) -> Result<InboundResponse>;

    /// Open a streaming call, exposing the raw frame stream to the
    /// streaming reader without buffering it
    async fn open_stream(
        &self,
        request: &OutboundRequest,
        profile: &BackendProfile,
    ) -> Result<TransportStream>;
}

/// Client issuing the HTTP call described by a request and a resolved
/// profile. Holds no session state across calls; continuation is carried
/// explicitly in the request, never in a client-side session.
#[derive(Debug)]
pub struct InferenceClient {
    client: reqwest::Client,
    api_key: String,
}

impl InferenceClient {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create from the `PARLEY_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV_VAR).map_err(|_| {
            Error::unavailable(None, format!("no API key: {API_KEY_ENV_VAR} is not set"))
        })?;
        Ok(Self::new(api_key))
    }

    fn request_builder(
        &self,
        request: &OutboundRequest,
        profile: &BackendProfile,
        streaming: bool,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(profile.url())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&wire_body(request, profile, streaming))
    }
}

/// Merge the profile's generation parameters and the stream flag into the
/// wire request. The mapper owns model, input, and the continuation handle;
/// everything else comes from the profile.
fn wire_body(
    request: &OutboundRequest,
    profile: &BackendProfile,
    streaming: bool,
) -> OutboundRequest {
    let mut body = request.clone();
    body.stream = streaming.then_some(true);
    body.temperature = profile.temperature;
    body.max_output_tokens = profile.max_tokens;
    body.response_format = profile.response_format.clone();
    body
}

fn classify_send_error(e: reqwest::Error, profile: &BackendProfile) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            limit_secs: profile.timeout_secs,
        }
    } else {
        Error::unavailable(e.status().map(|s| s.as_u16()), e.to_string())
    }
}

/// Classify a connect-phase streaming failure. Non-2xx and transport
/// failures before the first frame are availability problems, not stream
/// corruption.
fn classify_connect_error(e: reqwest_eventsource::Error, profile: &BackendProfile) -> Error {
    match e {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => Error::unavailable(
            Some(status.as_u16()),
            format!("backend returned {status}"),
        ),
        reqwest_eventsource::Error::InvalidContentType(value, _) => Error::unavailable(
            None,
            format!("backend returned non-SSE content type {value:?}"),
        ),
        reqwest_eventsource::Error::Transport(te) => classify_send_error(te, profile),
        other => Error::unavailable(None, other.to_string()),
    }
}

#[async_trait]
impl Backend for InferenceClient {
    /// The profile's timeout is applied as a hard request deadline; on
    /// expiry the attempt is abandoned, not retried.
    async fn send(
        &self,
        request: &OutboundRequest,
        profile: &BackendProfile,
    ) -> Result<InboundResponse> {
        let response = self
            .request_builder(request, profile, false)
            .timeout(profile.timeout())
            .send()
            .await
            .map_err(|e| classify_send_error(e, profile))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "backend call failed");
            return Err(Error::unavailable(Some(status.as_u16()), message));
        }

        response
            .json::<InboundResponse>()
            .await
            .map_err(|e| Error::MalformedResponse(format!("undecodable response body: {e}")))
    }

    async fn open_stream(
        &self,
        request: &OutboundRequest,
        profile: &BackendProfile,
    ) -> Result<TransportStream> {
        let builder = self.request_builder(request, profile, true);
        let mut source = EventSource::new(builder)
            .map_err(|e| Error::unavailable(None, format!("failed to open event source: {e}")))?;

        // Drive the connect phase here so connection failures surface as
        // BackendUnavailable rather than mid-stream corruption.
        let mut pending = None;
        match source.next().await {
            Some(Ok(Event::Open)) => {}
            Some(Ok(Event::Message(message))) => pending = Some(message.data),
            Some(Err(e)) => {
                source.close();
                return Err(classify_connect_error(e, profile));
            }
            None => {
                return Err(Error::unavailable(None, "stream closed before connecting"));
            }
        }

        let frames = stream! {
            if let Some(data) = pending {
                if data != STREAM_TERMINATOR {
                    yield Ok(data);
                }
            }
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data == STREAM_TERMINATOR {
                            source.close();
                            break;
                        }
                        yield Ok(message.data);
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        source.close();
                        yield Err(Error::StreamCorrupted(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> BackendProfile {
        BackendProfile {
            endpoint: "https://backend.test/v1".to_string(),
            route: "/responses".to_string(),
            timeout_secs: 30,
            model: "gpt-test".to_string(),
            temperature: Some(0.2),
            max_tokens: Some(512),
            context_window: 128_000,
            streaming: true,
            response_format: Some("text".to_string()),
        }
    }

    #[test]
    fn test_wire_body_merges_profile_parameters() {
        let request = OutboundRequest::new("gpt-test", "hello", Some("r1".to_string()));
        let body = wire_body(&request, &profile(), true);

        assert_eq!(body.stream, Some(true));
        assert_eq!(body.temperature, Some(0.2));
        assert_eq!(body.max_output_tokens, Some(512));
        assert_eq!(body.response_format.as_deref(), Some("text"));
        // Mapper-owned fields pass through untouched.
        assert_eq!(body.model, "gpt-test");
        assert_eq!(body.input, "hello");
        assert_eq!(body.previous_response_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_from_env_requires_the_key_variable() {
        // Sole test touching this variable, so no cross-test interference.
        unsafe { std::env::remove_var(API_KEY_ENV_VAR) };
        let err = InferenceClient::from_env().unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable { status: None, .. }));

        unsafe { std::env::set_var(API_KEY_ENV_VAR, "sk-test") };
        assert!(InferenceClient::from_env().is_ok());
        unsafe { std::env::remove_var(API_KEY_ENV_VAR) };
    }

    #[test]
    fn test_wire_body_omits_stream_flag_when_not_streaming() {
        let request = OutboundRequest::new("gpt-test", "hello", None);
        let body = wire_body(&request, &profile(), false);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("stream").is_none());
    }
}
