//! Mapping between the internal message model and the backend wire shapes

use parley_ai::{BackendProfile, Error, InboundResponse, OutboundRequest, Result};

use crate::conversation::Turn;

/// Build the outbound request for an assembled prompt. The continuation
/// handle rides along iff one exists; an absent handle is omitted from the
/// wire shape entirely, which is how "no continuation" is signalled.
pub fn to_request(
    input: String,
    profile: &BackendProfile,
    previous_handle: Option<&str>,
) -> OutboundRequest {
    OutboundRequest::new(
        profile.model.clone(),
        input,
        previous_handle.map(str::to_string),
    )
}

/// Concatenation, in list order, of every block typed as primary text.
/// Non-text blocks (tool or status blocks) are skipped, not erroneous; a
/// response with no qualifying block at all is a backend contract
/// violation.
pub fn extract_output_text(response: &InboundResponse) -> Result<String> {
    if response.content.is_empty() {
        return Err(Error::MalformedResponse(
            "response carried no content blocks".to_string(),
        ));
    }
    if !response.content.iter().any(|block| block.is_output_text()) {
        return Err(Error::MalformedResponse(
            "no text content block in response".to_string(),
        ));
    }
    Ok(response
        .content
        .iter()
        .filter(|block| block.is_output_text())
        .map(|block| block.text.as_str())
        .collect())
}

/// Derive the backend's reply turn from a response
pub fn to_turn(response: &InboundResponse, conversation_id: i64) -> Result<Turn> {
    let text = extract_output_text(response)?;
    Ok(Turn::assistant(conversation_id, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Origin;
    use parley_ai::{ContentBlock, ResponseStatus, UsageCounters};

    fn profile() -> BackendProfile {
        BackendProfile {
            endpoint: "https://backend.test/v1".to_string(),
            route: "/responses".to_string(),
            timeout_secs: 30,
            model: "gpt-test".to_string(),
            temperature: None,
            max_tokens: None,
            context_window: 128_000,
            streaming: false,
            response_format: None,
        }
    }

    fn response_with(blocks: Vec<ContentBlock>) -> InboundResponse {
        InboundResponse {
            id: "r1".to_string(),
            status: ResponseStatus::Completed,
            content: blocks,
            usage: UsageCounters::default(),
            previous_response_id: None,
        }
    }

    #[test]
    fn test_to_request_sets_model_and_handle() {
        let request = to_request("prompt text".to_string(), &profile(), Some("r9"));
        assert_eq!(request.model, "gpt-test");
        assert_eq!(request.input, "prompt text");
        assert_eq!(request.previous_response_id.as_deref(), Some("r9"));
    }

    #[test]
    fn test_to_request_without_handle() {
        let request = to_request("prompt text".to_string(), &profile(), None);
        assert!(request.previous_response_id.is_none());
    }

    #[test]
    fn test_extract_concatenates_text_blocks_in_order() {
        let response = response_with(vec![
            ContentBlock::output_text("Hel"),
            ContentBlock {
                kind: "tool_status".to_string(),
                text: "ignored".to_string(),
            },
            ContentBlock::output_text("lo"),
        ]);
        assert_eq!(extract_output_text(&response).unwrap(), "Hello");
    }

    #[test]
    fn test_extract_fails_on_empty_content() {
        let err = extract_output_text(&response_with(vec![])).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_fails_when_no_block_is_text() {
        let response = response_with(vec![ContentBlock {
            kind: "tool_status".to_string(),
            text: "busy".to_string(),
        }]);
        let err = extract_output_text(&response).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_round_trip_preserves_text_exactly() {
        // A turn mapped out and a fabricated response echoing its text must
        // come back verbatim: no double-delimiting, no truncation.
        let original = Turn::user(42, "What is 2+2?", vec![]);
        let request = to_request(original.text.clone(), &profile(), None);

        let response = response_with(vec![ContentBlock::output_text(request.input.clone())]);
        let turn = to_turn(&response, 42).unwrap();

        assert_eq!(turn.text, original.text);
        assert_eq!(turn.conversation_id, 42);
        assert_eq!(turn.origin, Origin::Assistant);
    }
}
