//! Invocation contract for external triggers.
//!
//! Maps a JSON request body to a status code and a JSON response body. The
//! transport (HTTP route, queue consumer, CLI) is left to the caller.
//!
//! | Outcome               | Status | Body                                               |
//! |-----------------------|--------|----------------------------------------------------|
//! | success               | 200    | `status`, `message`, `posts_archived`, `posts_deleted` |
//! | validation failure    | 400    | `code: validation_error`, joined `message`, `data: []` |
//! | caller not authorized | 403    | `code: rest_forbidden`                             |
//! | anything else         | 500    | `code: exception`, generic message                 |

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::auth::{AuthorizationPolicy, Principal};
use crate::content::ContentId;
use crate::criteria::RawScanRequest;
use crate::scan::{ScanError, ScanOrchestrator};
use crate::store::ContentStore;
use crate::types::TriggeredBy;

pub const SUCCESS_MESSAGE: &str = "Posts scanned successfully.";
pub const FORBIDDEN_MESSAGE: &str = "Sorry, you are not allowed to do that.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred.";

/// Status code plus JSON body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    fn success(archived: &[ContentId], deleted: &[ContentId]) -> Self {
        Self {
            status: 200,
            body: json!({
                "status": "success",
                "message": SUCCESS_MESSAGE,
                "posts_archived": archived,
                "posts_deleted": deleted,
            }),
        }
    }

    fn validation_error(message: String) -> Self {
        Self {
            status: 400,
            body: json!({
                "code": "validation_error",
                "message": message,
                "data": [],
            }),
        }
    }

    fn forbidden() -> Self {
        Self {
            status: 403,
            body: json!({
                "code": "rest_forbidden",
                "message": FORBIDDEN_MESSAGE,
                "data": { "status": 403 },
            }),
        }
    }

    fn unexpected() -> Self {
        Self {
            status: 500,
            body: json!({
                "code": "exception",
                "message": UNEXPECTED_MESSAGE,
                "data": { "status": 500 },
            }),
        }
    }
}

/// Authorize the caller, run the scan and shape the response
pub fn handle_scan_request<S: ContentStore>(
    orchestrator: &mut ScanOrchestrator<S>,
    policy: &dyn AuthorizationPolicy,
    principal: &Principal,
    body: &Value,
) -> ApiResponse {
    if let Err(err) = policy.authorize(principal) {
        warn!(error = %err, "scan request denied");
        return ApiResponse::forbidden();
    }

    let request = RawScanRequest::from_body(body);
    match orchestrator.scan_request(&request, TriggeredBy::Api) {
        Ok(run) => ApiResponse::success(&run.result.archived_ids, &run.result.deleted_ids),
        Err(ScanError::Validation(errors)) => ApiResponse::validation_error(errors.to_string()),
        Err(ScanError::Unexpected(err)) => {
            error!(error = %err, "scan request failed");
            ApiResponse::unexpected()
        }
    }
}
