//! Produce response encoding and HTTP status policy
//!
//! Per-record failures ride inside a success-class response; only
//! whole-batch errors escalate to an error-class status. The one exception:
//! a non-empty batch denied by authorization on every record reports 403.

use http::StatusCode;
use serde::Serialize;

use crate::broker::{Offset, PartitionId};
use crate::error::{ProduceErrorKind, RestGatewayError};
use crate::produce::{BatchResult, SendOutcome};

/// Per-record entry in the produce response body, index-aligned with the
/// request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionOffset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<Offset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PartitionOffset {
    pub fn from_outcome(outcome: &SendOutcome) -> Self {
        match outcome {
            SendOutcome::Delivered {
                partition,
                offset,
                timestamp,
            } => Self {
                partition: Some(*partition),
                offset: Some(*offset),
                timestamp: Some(*timestamp),
                error_code: None,
                error: None,
            },
            SendOutcome::Failed { kind, message } => Self {
                partition: None,
                offset: None,
                timestamp: None,
                error_code: Some(kind.code()),
                error: Some(message.clone()),
            },
        }
    }
}

/// Versioned produce response body
#[derive(Debug, Clone, Serialize)]
pub struct ProduceResponse {
    pub offsets: Vec<PartitionOffset>,
}

impl ProduceResponse {
    /// Encode outcomes in submission order
    pub fn from_result(result: &BatchResult) -> Self {
        Self {
            offsets: result
                .outcomes()
                .iter()
                .map(PartitionOffset::from_outcome)
                .collect(),
        }
    }
}

/// Status for a completed batch. Partial failure stays success-class; a
/// batch wholly denied by authorization escalates to 403.
pub fn status_for_result(result: &BatchResult) -> StatusCode {
    if result.all_failed_with(ProduceErrorKind::AuthorizationDenied) {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::OK
    }
}

/// Status for a whole-batch error
pub fn status_for_error(err: &RestGatewayError) -> StatusCode {
    match err {
        RestGatewayError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RestGatewayError::TopicNotFound { .. } | RestGatewayError::PartitionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        RestGatewayError::Infrastructure { .. } | RestGatewayError::Submission { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(offset: Offset) -> SendOutcome {
        SendOutcome::Delivered {
            partition: 0,
            offset,
            timestamp: 1700000000000 + offset,
        }
    }

    fn denied() -> SendOutcome {
        SendOutcome::Failed {
            kind: ProduceErrorKind::AuthorizationDenied,
            message: "Not authorized to access topic 'orders'".to_string(),
        }
    }

    #[test]
    fn test_response_preserves_index_order() {
        let result = BatchResult::from(vec![delivered(0), denied(), delivered(2)]);
        let response = ProduceResponse::from_result(&result);

        assert_eq!(response.offsets.len(), 3);
        assert_eq!(response.offsets[0].offset, Some(0));
        assert_eq!(response.offsets[1].error_code, Some(40301));
        assert_eq!(response.offsets[2].offset, Some(2));
    }

    #[test]
    fn test_serialized_shape_skips_absent_fields() {
        let result = BatchResult::from(vec![delivered(5), denied()]);
        let body = serde_json::to_value(ProduceResponse::from_result(&result)).unwrap();

        assert_eq!(
            body["offsets"][0],
            serde_json::json!({
                "partition": 0,
                "offset": 5,
                "timestamp": 1700000000005u64,
            })
        );
        assert!(body["offsets"][1].get("offset").is_none());
        assert_eq!(body["offsets"][1]["error_code"], 40301);
    }

    #[test]
    fn test_partial_failure_is_success_class() {
        let result = BatchResult::from(vec![delivered(0), denied()]);
        assert_eq!(status_for_result(&result), StatusCode::OK);
    }

    #[test]
    fn test_all_authorization_denied_is_forbidden() {
        let result = BatchResult::from(vec![denied(), denied()]);
        assert_eq!(status_for_result(&result), StatusCode::FORBIDDEN);

        // other all-failed batches stay success-class
        let result = BatchResult::from(vec![SendOutcome::Failed {
            kind: ProduceErrorKind::Timeout,
            message: "timed out".to_string(),
        }]);
        assert_eq!(status_for_result(&result), StatusCode::OK);
    }

    #[test]
    fn test_empty_result_is_ok() {
        assert_eq!(status_for_result(&BatchResult::default()), StatusCode::OK);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            status_for_error(&RestGatewayError::validation("bad")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for_error(&RestGatewayError::TopicNotFound {
                topic: "t".to_string(),
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for_error(&RestGatewayError::PartitionNotFound {
                topic: "t".to_string(),
                partition: 1,
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for_error(&RestGatewayError::infrastructure("down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for_error(&RestGatewayError::submission("failed")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
