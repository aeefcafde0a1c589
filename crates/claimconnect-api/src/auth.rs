use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use claimconnect_db::Database;
use claimconnect_types::api::{
    CountResponse, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    UserDetails, UserSummary,
};

use crate::error::ApiError;
use crate::upload::UploadStore;
use crate::util::{parse_db_timestamp, parse_db_uuid};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub uploads: UploadStore,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.fullname.trim().is_empty()
        || req.email.trim().is_empty()
        || req.phone.trim().is_empty()
        || req.password.is_empty()
    {
        return Err(ApiError::validation("All fields are required"));
    }

    // Check for an existing account first so duplicates surface as 409, not
    // as the UNIQUE-violation 500 the constraint would produce.
    let db = state.clone();
    let email = req.email.clone();
    let existing = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(ApiError::join_error)??;
    if existing.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string();

    let user_id = Uuid::new_v4();

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        db.db.create_user(
            &user_id.to_string(),
            &req.fullname,
            &req.email,
            &req.phone,
            &password_hash,
        )
    })
    .await
    .map_err(ApiError::join_error)??;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Registration successful!" })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(ApiError::join_error)??
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::Internal)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    Ok(Json(LoginResponse {
        message: "Login successful!".to_string(),
        user: UserSummary {
            id: parse_db_uuid(&user.id, "user"),
            name: user.fullname,
            email: user.email,
            phone: user.phone,
        },
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password required"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string();

    let db = state.clone();
    let updated = tokio::task::spawn_blocking(move || {
        db.db.update_password(&req.email, &password_hash)
    })
    .await
    .map_err(ApiError::join_error)??;

    if !updated {
        return Err(ApiError::not_found("Email not found"));
    }

    Ok(Json(serde_json::json!({ "message": "Password updated successfully" })))
}

pub async fn user_count(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let count = tokio::task::spawn_blocking(move || db.db.count_users())
        .await
        .map_err(ApiError::join_error)??;

    Ok(Json(CountResponse { count }))
}

pub async fn user_details(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_users())
        .await
        .map_err(ApiError::join_error)??;

    if rows.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }

    // password hashes stay server-side
    let users: Vec<UserDetails> = rows
        .into_iter()
        .map(|row| UserDetails {
            id: parse_db_uuid(&row.id, "user"),
            fullname: row.fullname,
            email: row.email,
            phone: row.phone,
            created_at: parse_db_timestamp(&row.created_at, "user"),
        })
        .collect();

    Ok(Json(users))
}
