/// Database row types — these map directly to SQLite rows.
/// Distinct from claimconnect-types API models to keep the DB layer
/// independent.

pub struct UserRow {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub created_at: String,
}

pub struct LostItemRow {
    pub id: String,
    pub owner_name: String,
    pub item_name: String,
    pub image: Option<String>,
    pub location: String,
    pub date_lost: String,
    pub contact_no: String,
    pub created_at: String,
}

pub struct FoundItemRow {
    pub id: String,
    pub finder_name: String,
    pub item_name: String,
    pub image: Option<String>,
    pub location: String,
    pub date_found: String,
    pub contact_no: String,
    pub created_at: String,
}

/// A pending request left-joined with its found item; the item columns are
/// None when the referenced row no longer exists.
pub struct PendingVerificationRow {
    pub verification_id: String,
    pub found_id: Option<String>,
    pub item_name: String,
    pub finder_name: Option<String>,
    pub location: Option<String>,
    pub date_found: Option<String>,
    pub contact_no: Option<String>,
    pub image: Option<String>,
    pub username: String,
    pub description: String,
    pub request_date: String,
}

/// What the accept/reject transition needs to build the notification.
pub struct DecidedVerification {
    pub username: String,
    pub item_name: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_email: String,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}
