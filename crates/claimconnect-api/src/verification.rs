use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use claimconnect_types::api::{PendingVerification, VerificationSubmitted};
use claimconnect_types::models::VerificationStatus;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::upload::{INVOICE_TYPE_ERROR, INVOICE_TYPES, PendingUpload, read_upload};
use crate::util::{parse_db_timestamp, parse_db_uuid};

/// The two terminal outcomes of the verification lifecycle.
#[derive(Debug, Clone, Copy)]
enum Decision {
    Accept,
    Reject,
}

impl Decision {
    fn status(self) -> VerificationStatus {
        match self {
            Decision::Accept => VerificationStatus::Accepted,
            Decision::Reject => VerificationStatus::Rejected,
        }
    }

    /// Tag stored on the emitted notification.
    fn notification_type(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject => "reject",
        }
    }

    fn notification_message(self, item_name: &str) -> String {
        match self {
            Decision::Accept => format!(
                "Your request to claim \"{}\" has been accepted. Please contact the finder to arrange collection.",
                item_name
            ),
            Decision::Reject => format!(
                "Your request to claim \"{}\" has been rejected. Please review your information and try again.",
                item_name
            ),
        }
    }

    fn confirmation(self) -> &'static str {
        match self {
            Decision::Accept => "Request accepted and notification saved.",
            Decision::Reject => "Request rejected and notification saved.",
        }
    }
}

/// POST /api/verification-request — multipart form with an optional invoice
/// document (JPEG/PNG/PDF). Creates the request in `pending` state.
pub async fn submit_verification(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut description = None;
    let mut item_id = None;
    let mut item_name = None;
    let mut username = None;
    let mut invoice: Option<PendingUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "description" => description = Some(read_text(field).await?),
            "item_id" => item_id = Some(read_text(field).await?),
            "item_name" => item_name = Some(read_text(field).await?),
            "username" => username = Some(read_text(field).await?),
            "invoice" => {
                invoice = Some(read_upload(field, INVOICE_TYPES, INVOICE_TYPE_ERROR).await?)
            }
            _ => {}
        }
    }

    let description = required(description)?;
    let item_id = required(item_id)?;
    let item_name = required(item_name)?;
    let username = required(username)?;

    let invoice_path = match &invoice {
        Some(upload) => Some(state.uploads.store(upload).await?),
        None => None,
    };

    let request_id = Uuid::new_v4();
    let db = state.clone();
    let rid = request_id.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.insert_verification(
            &rid,
            &item_id,
            &item_name,
            &username,
            &description,
            invoice_path.as_deref(),
        )
    })
    .await
    .map_err(ApiError::join_error)??;

    Ok(Json(VerificationSubmitted {
        message: "Verification request submitted successfully!".to_string(),
        request_id,
    }))
}

/// GET /api/verification — pending requests joined with found-item details.
pub async fn list_verification(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_pending_verifications())
        .await
        .map_err(ApiError::join_error)??;

    let pending: Vec<PendingVerification> = rows
        .into_iter()
        .map(|row| PendingVerification {
            verification_id: parse_db_uuid(&row.verification_id, "verification"),
            found_id: row.found_id.map(|id| parse_db_uuid(&id, "found item")),
            item_name: row.item_name,
            finder_name: row.finder_name,
            location: row.location,
            date_found: row.date_found,
            contact_no: row.contact_no,
            image: row.image,
            username: row.username,
            description: row.description,
            request_date: parse_db_timestamp(&row.request_date, "verification"),
        })
        .collect();

    Ok(Json(pending))
}

pub async fn accept_verification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    decide(state, id, Decision::Accept).await
}

pub async fn reject_verification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    decide(state, id, Decision::Reject).await
}

/// The accept/reject transition. The status flip is one transaction, so a
/// retried decision finds no pending row and gets 404 instead of a second
/// notification. The notification itself is best-effort: the decision stands
/// even when the insert fails.
async fn decide(
    state: AppState,
    id: Uuid,
    decision: Decision,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let request_id = id.to_string();
    let decided = tokio::task::spawn_blocking(move || {
        db.db
            .decide_verification(&request_id, decision.status().as_str())
    })
    .await
    .map_err(ApiError::join_error)??;

    let Some(decided) = decided else {
        return Err(ApiError::not_found("Verification request not found"));
    };

    let db = state.clone();
    let notification_id = Uuid::new_v4().to_string();
    let recipient = decided.username.clone();
    let message = decision.notification_message(&decided.item_name);
    let outcome = tokio::task::spawn_blocking(move || {
        db.db.insert_notification(
            &notification_id,
            &recipient,
            decision.notification_type(),
            &message,
        )
    })
    .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(
            "Failed to save {} notification for {}: {:#}",
            decision.notification_type(),
            decided.username,
            e
        ),
        Err(e) => error!("spawn_blocking join error: {}", e),
    }

    Ok(Json(serde_json::json!({ "message": decision.confirmation() })))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))
}

fn required(value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("All fields are required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_messages_contain_item_name() {
        let accept = Decision::Accept.notification_message("Black Umbrella");
        assert!(accept.contains("\"Black Umbrella\""));
        assert!(accept.contains("accepted"));

        let reject = Decision::Reject.notification_message("Black Umbrella");
        assert!(reject.contains("\"Black Umbrella\""));
        assert!(reject.contains("rejected"));
    }

    #[test]
    fn test_decision_maps_to_terminal_status() {
        assert_eq!(Decision::Accept.status(), VerificationStatus::Accepted);
        assert_eq!(Decision::Reject.status(), VerificationStatus::Rejected);
        assert_eq!(Decision::Accept.notification_type(), "accept");
        assert_eq!(Decision::Reject.notification_type(), "reject");
    }
}
