use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ItemKind;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// -- Items --

#[derive(Debug, Serialize)]
pub struct LostItemResponse {
    pub id: Uuid,
    pub owner_name: String,
    pub item_name: String,
    pub image: Option<String>,
    pub location: String,
    pub date_lost: String,
    pub contact_no: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FoundItemResponse {
    pub id: Uuid,
    pub finder_name: String,
    pub item_name: String,
    pub image: Option<String>,
    pub location: String,
    pub date_found: String,
    pub contact_no: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the merged recent-items feed.
#[derive(Debug, Serialize)]
pub struct RecentItem {
    pub id: Uuid,
    pub item_name: String,
    pub image: Option<String>,
    pub location: String,
    /// The item date (`date_lost` or `date_found`), `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

// -- Verification --

#[derive(Debug, Serialize)]
pub struct VerificationSubmitted {
    pub message: String,
    #[serde(rename = "requestId")]
    pub request_id: Uuid,
}

/// A pending verification request joined with the found item it concerns.
/// The found-item columns are nullable: the reference is non-owning, so the
/// item may have no matching row.
#[derive(Debug, Serialize)]
pub struct PendingVerification {
    pub verification_id: Uuid,
    pub found_id: Option<Uuid>,
    pub item_name: String,
    pub finder_name: Option<String>,
    pub location: Option<String>,
    pub date_found: Option<String>,
    pub contact_no: Option<String>,
    pub image: Option<String>,
    pub username: String,
    pub description: String,
    pub request_date: DateTime<Utc>,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_email: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: u64,
}

// -- Analytics --

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub month: String,
    pub year: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AnalyticsResponse {
    pub lost: u64,
    pub found: u64,
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsReportRequest {
    #[serde(rename = "chartImage")]
    pub chart_image: String,
    pub month: String,
    pub year: String,
}
