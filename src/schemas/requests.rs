use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::jobs::SubmitOutcome;
use crate::store::JobRecord;

/// Body for `POST /api/requests`.
///
/// `input_data` is opaque to the gateway except for the `prompt` field,
/// which the controller requires to be a non-empty string.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequestBody {
    pub model_type: String,
    pub input_data: serde_json::Value,
}

/// Response for `POST /api/requests`.
///
/// A terminal record is returned bare; a still-pending record is wrapped in
/// an envelope with an explicit "poll again" message.  Both are HTTP 200.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SubmitResponse {
    Terminal(JobRecord),
    StillPending { message: String, record: JobRecord },
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Terminal(record) => SubmitResponse::Terminal(record),
            SubmitOutcome::StillPending(record) => SubmitResponse::StillPending {
                message: "job is still processing; poll again later".to_owned(),
                record,
            },
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use uuid::Uuid;

    fn record() -> JobRecord {
        JobRecord::new(
            Uuid::new_v4(),
            "text-gen".to_owned(),
            serde_json::json!({ "prompt": "hello" }),
        )
    }

    #[test]
    fn terminal_outcome_serializes_as_bare_record() {
        let response = SubmitResponse::from(SubmitOutcome::Terminal(record()));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("status").is_some());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn still_pending_outcome_serializes_as_envelope() {
        let response = SubmitResponse::from(SubmitOutcome::StillPending(record()));
        let json = serde_json::to_value(&response).unwrap();
        assert!(
            json["message"]
                .as_str()
                .is_some_and(|m| m.contains("poll again"))
        );
        assert_eq!(json["record"]["status"], "pending");
    }
}
