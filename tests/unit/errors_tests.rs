/*!
 * Tests for error types and conversions
 */

use lexiflow::errors::{AnnotationError, ChunkError, PortError, ProviderError};

#[test]
fn test_providerError_requestFailed_shouldDisplayCorrectly() {
    let error = ProviderError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("API request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_portError_fromConnectionError_shouldBeUnavailable() {
    let error: PortError = ProviderError::ConnectionError("Host unreachable".to_string()).into();
    match error {
        PortError::Unavailable(msg) => assert!(msg.contains("Host unreachable")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_portError_fromUnauthorizedApiError_shouldRequireInteraction() {
    let error: PortError = ProviderError::ApiError {
        status_code: 401,
        message: "missing token".to_string(),
    }
    .into();
    assert_eq!(error, PortError::InteractionRequired("401 - missing token".to_string()));
}

#[test]
fn test_annotationError_segmentFailure_shouldDisplayIndexAndReason() {
    let error = AnnotationError::SegmentProcessingFailed {
        index: 3,
        reason: "no phrases".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains('3'));
    assert!(display.contains("no phrases"));
    assert!(!error.is_fatal());
}

#[test]
fn test_chunkError_failed_shouldDisplayReason() {
    let error = ChunkError::Failed("source down".to_string());
    assert_eq!(error.to_string(), "Chunking failed: source down");
}
