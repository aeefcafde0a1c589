use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use claimconnect_types::api::{AnalyticsQuery, AnalyticsReportRequest, AnalyticsResponse};
use claimconnect_types::models::VerificationStatus;

use crate::auth::AppState;
use crate::error::ApiError;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// GET /api/analytics?month=&year= — per-category counts for the period.
/// A period with no records is all zeros, not an error.
pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (year, month) = normalize_period(&query.month, &query.year)?;

    let db = state.clone();
    let response = tokio::task::spawn_blocking(move || {
        let lost = db.db.count_lost_in_month(&year, &month)?;
        let found = db.db.count_found_in_month(&year, &month)?;
        let accepted =
            db.db
                .count_decided_in_month(VerificationStatus::Accepted.as_str(), &year, &month)?;
        let rejected =
            db.db
                .count_decided_in_month(VerificationStatus::Rejected.as_str(), &year, &month)?;
        Ok::<_, anyhow::Error>(AnalyticsResponse {
            lost,
            found,
            accepted,
            rejected,
        })
    })
    .await
    .map_err(ApiError::join_error)??;

    Ok(Json(response))
}

/// POST /api/analytics-report — validates the submitted chart image and
/// returns it as a binary attachment download.
pub async fn analytics_report(
    Json(req): Json<AnalyticsReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (year, month) = normalize_period(&req.month, &req.year)?;
    let bytes = decode_chart_png(&req.chart_image)?;

    let filename = format!("analytics-report-{}-{}.png", year, month);
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// Accepts "5" or "05" for the month and a 4-digit year; returns the
/// zero-padded strings the strftime comparisons need.
fn normalize_period(month: &str, year: &str) -> Result<(String, String), ApiError> {
    let month: u32 = month
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("month must be a number between 1 and 12"))?;
    if !(1..=12).contains(&month) {
        return Err(ApiError::validation("month must be a number between 1 and 12"));
    }

    let year: u32 = year
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("year must be a 4-digit number"))?;
    if !(1000..=9999).contains(&year) {
        return Err(ApiError::validation("year must be a 4-digit number"));
    }

    Ok((format!("{:04}", year), format!("{:02}", month)))
}

/// Decode the chart payload, tolerating a `data:image/png;base64,` prefix,
/// and reject anything that is not actually a PNG.
fn decode_chart_png(raw: &str) -> Result<Vec<u8>, ApiError> {
    let encoded = raw.strip_prefix(DATA_URL_PREFIX).unwrap_or(raw);
    let bytes = B64
        .decode(encoded.trim())
        .map_err(|_| ApiError::validation("chartImage must be base64-encoded PNG data"))?;

    if !bytes.starts_with(&PNG_MAGIC) {
        return Err(ApiError::validation("chartImage must be base64-encoded PNG data"));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_normalization() {
        assert_eq!(
            normalize_period("5", "2024").unwrap(),
            ("2024".to_string(), "05".to_string())
        );
        assert_eq!(
            normalize_period("12", "2024").unwrap(),
            ("2024".to_string(), "12".to_string())
        );
        assert_eq!(
            normalize_period("05", "2024").unwrap(),
            ("2024".to_string(), "05".to_string())
        );
    }

    #[test]
    fn test_invalid_periods_rejected() {
        assert!(normalize_period("0", "2024").is_err());
        assert!(normalize_period("13", "2024").is_err());
        assert!(normalize_period("May", "2024").is_err());
        assert!(normalize_period("5", "24").is_err());
        assert!(normalize_period("5", "year").is_err());
    }

    #[test]
    fn test_decode_accepts_data_url_and_raw_base64() {
        let png = [&PNG_MAGIC[..], b"rest-of-image"].concat();
        let encoded = B64.encode(&png);

        assert_eq!(decode_chart_png(&encoded).unwrap(), png);

        let with_prefix = format!("{}{}", DATA_URL_PREFIX, encoded);
        assert_eq!(decode_chart_png(&with_prefix).unwrap(), png);
    }

    #[test]
    fn test_decode_rejects_non_png() {
        let not_png = B64.encode(b"plain text pretending to be a chart");
        assert!(decode_chart_png(&not_png).is_err());
        assert!(decode_chart_png("@@not-base64@@").is_err());
    }
}
