use axum::{Json, extract::Multipart, extract::State, response::IntoResponse};
use chrono::NaiveDate;
use uuid::Uuid;

use claimconnect_db::models::{FoundItemRow, LostItemRow};
use claimconnect_types::api::{CountResponse, FoundItemResponse, LostItemResponse, RecentItem};
use claimconnect_types::models::ItemKind;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::upload::{ITEM_IMAGE_TYPE_ERROR, ITEM_IMAGE_TYPES, PendingUpload, read_upload};
use crate::util::{parse_db_timestamp, parse_db_uuid};

/// How many items of each kind feed the recent-items merge.
const RECENT_PER_KIND: u32 = 2;

fn require(field: Option<String>, message: &str) -> Result<String, ApiError> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))
}

/// POST /api/lost-items — multipart form with an optional `itemImage` photo.
/// The photo's MIME type is checked before any write happens.
pub async fn report_lost_item(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut owner_name = None;
    let mut item_name = None;
    let mut location = None;
    let mut date_lost = None;
    let mut contact_no = None;
    let mut image: Option<PendingUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "NameofOwner" => owner_name = Some(text_field(field).await?),
            "itemName" => item_name = Some(text_field(field).await?),
            "location" => location = Some(text_field(field).await?),
            "dateLost" => date_lost = Some(text_field(field).await?),
            "contactNumber" => contact_no = Some(text_field(field).await?),
            "itemImage" => {
                image = Some(read_upload(field, ITEM_IMAGE_TYPES, ITEM_IMAGE_TYPE_ERROR).await?)
            }
            _ => {}
        }
    }

    let owner_name = require(owner_name, "All fields are required")?;
    let item_name = require(item_name, "All fields are required")?;
    let location = require(location, "All fields are required")?;
    let date_lost = require(date_lost, "All fields are required")?;
    let contact_no = require(contact_no, "All fields are required")?;

    let image_path = match &image {
        Some(upload) => Some(state.uploads.store(upload).await?),
        None => None,
    };

    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    tokio::task::spawn_blocking(move || {
        db.db.insert_lost_item(
            &id,
            &owner_name,
            &item_name,
            image_path.as_deref(),
            &location,
            &date_lost,
            &contact_no,
        )
    })
    .await
    .map_err(ApiError::join_error)??;

    Ok(Json(serde_json::json!({ "message": "Lost item reported successfully!" })))
}

pub async fn list_lost_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_lost_items())
        .await
        .map_err(ApiError::join_error)??;

    let items: Vec<LostItemResponse> = rows
        .into_iter()
        .map(|row| LostItemResponse {
            id: parse_db_uuid(&row.id, "lost item"),
            owner_name: row.owner_name,
            item_name: row.item_name,
            image: row.image,
            location: row.location,
            date_lost: row.date_lost,
            contact_no: row.contact_no,
            created_at: parse_db_timestamp(&row.created_at, "lost item"),
        })
        .collect();

    Ok(Json(items))
}

pub async fn lost_count(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let count = tokio::task::spawn_blocking(move || db.db.count_lost_items())
        .await
        .map_err(ApiError::join_error)??;
    Ok(Json(CountResponse { count }))
}

/// POST /api/found-items — mirrors the lost-item report with finder fields.
pub async fn report_found_item(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut finder_name = None;
    let mut item_name = None;
    let mut location = None;
    let mut date_found = None;
    let mut contact_no = None;
    let mut image: Option<PendingUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart payload"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "finderName" => finder_name = Some(text_field(field).await?),
            "itemName" => item_name = Some(text_field(field).await?),
            "foundLocation" => location = Some(text_field(field).await?),
            "foundDate" => date_found = Some(text_field(field).await?),
            "contactNo" => contact_no = Some(text_field(field).await?),
            "itemImage" => {
                image = Some(read_upload(field, ITEM_IMAGE_TYPES, ITEM_IMAGE_TYPE_ERROR).await?)
            }
            _ => {}
        }
    }

    let finder_name = require(finder_name, "All fields are required")?;
    let item_name = require(item_name, "All fields are required")?;
    let location = require(location, "All fields are required")?;
    let date_found = require(date_found, "All fields are required")?;
    let contact_no = require(contact_no, "All fields are required")?;

    let image_path = match &image {
        Some(upload) => Some(state.uploads.store(upload).await?),
        None => None,
    };

    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    tokio::task::spawn_blocking(move || {
        db.db.insert_found_item(
            &id,
            &finder_name,
            &item_name,
            image_path.as_deref(),
            &location,
            &date_found,
            &contact_no,
        )
    })
    .await
    .map_err(ApiError::join_error)??;

    Ok(Json(serde_json::json!({ "message": "Found item reported successfully!" })))
}

pub async fn list_found_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_found_items())
        .await
        .map_err(ApiError::join_error)??;

    let items: Vec<FoundItemResponse> = rows
        .into_iter()
        .map(|row| FoundItemResponse {
            id: parse_db_uuid(&row.id, "found item"),
            finder_name: row.finder_name,
            item_name: row.item_name,
            image: row.image,
            location: row.location,
            date_found: row.date_found,
            contact_no: row.contact_no,
            created_at: parse_db_timestamp(&row.created_at, "found item"),
        })
        .collect();

    Ok(Json(items))
}

pub async fn found_count(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let count = tokio::task::spawn_blocking(move || db.db.count_found_items())
        .await
        .map_err(ApiError::join_error)??;
    Ok(Json(CountResponse { count }))
}

/// GET /api/recent-items — the newest lost and found reports merged into one
/// feed, sorted by item date descending.
pub async fn recent_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (lost, found) = tokio::task::spawn_blocking(move || {
        let lost = db.db.recent_lost_items(RECENT_PER_KIND)?;
        let found = db.db.recent_found_items(RECENT_PER_KIND)?;
        Ok::<_, anyhow::Error>((lost, found))
    })
    .await
    .map_err(ApiError::join_error)??;

    Ok(Json(merge_recent(lost, found)))
}

fn merge_recent(lost: Vec<LostItemRow>, found: Vec<FoundItemRow>) -> Vec<RecentItem> {
    let mut items: Vec<RecentItem> = lost
        .into_iter()
        .map(|row| RecentItem {
            id: parse_db_uuid(&row.id, "lost item"),
            item_name: row.item_name,
            image: row.image,
            location: row.location,
            date: row.date_lost,
            kind: ItemKind::Lost,
        })
        .chain(found.into_iter().map(|row| RecentItem {
            id: parse_db_uuid(&row.id, "found item"),
            item_name: row.item_name,
            image: row.image,
            location: row.location,
            date: row.date_found,
            kind: ItemKind::Found,
        }))
        .collect();

    // unparseable dates sink to the end
    items.sort_by_key(|item| std::cmp::Reverse(date_key(&item.date)));
    items
}

fn date_key(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost(date: &str, name: &str) -> LostItemRow {
        LostItemRow {
            id: Uuid::new_v4().to_string(),
            owner_name: "Owner".to_string(),
            item_name: name.to_string(),
            image: None,
            location: "Park".to_string(),
            date_lost: date.to_string(),
            contact_no: "555-0100".to_string(),
            created_at: "2024-05-01 10:00:00".to_string(),
        }
    }

    fn found(date: &str, name: &str) -> FoundItemRow {
        FoundItemRow {
            id: Uuid::new_v4().to_string(),
            finder_name: "Finder".to_string(),
            item_name: name.to_string(),
            image: None,
            location: "Library".to_string(),
            date_found: date.to_string(),
            contact_no: "555-0101".to_string(),
            created_at: "2024-05-03 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_merge_sorts_across_kinds_by_date_desc() {
        let merged = merge_recent(
            vec![lost("2024-05-01", "Phone")],
            vec![found("2024-05-03", "Wallet")],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].item_name, "Wallet");
        assert_eq!(merged[0].kind, ItemKind::Found);
        assert_eq!(merged[1].item_name, "Phone");
    }

    #[test]
    fn test_merge_caps_at_two_per_kind_upstream() {
        // the query layer caps each side; merging four entries stays four
        let merged = merge_recent(
            vec![lost("2024-05-04", "A"), lost("2024-05-01", "B")],
            vec![found("2024-05-03", "C"), found("2024-05-02", "D")],
        );
        let names: Vec<&str> = merged.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "D", "B"]);
    }

    #[test]
    fn test_unparseable_dates_sort_last() {
        let merged = merge_recent(vec![lost("garbage", "X")], vec![found("2024-01-01", "Y")]);
        assert_eq!(merged[0].item_name, "Y");
        assert_eq!(merged[1].item_name, "X");
    }
}
