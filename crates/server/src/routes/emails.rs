use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use shared::filter::{self, FilterParams};
use shared::{EmailAccount, EmailAccountPatch, NewEmailAccount, MAX_EMAIL_ACCOUNTS_PER_ADMIN};

use crate::{
    db::EmailRow,
    error::AppError,
    state::AppState,
};

use super::admins::{admin_accounts, email_accounts};

#[derive(Debug, Deserialize)]
pub struct EmailListQuery {
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub search: String,
}

/// GET /emails — newest first, optionally scoped to one admin. A search term
/// keeps the email accounts whose owning admin matches it.
pub async fn list_emails(
    State(state): State<AppState>,
    Query(query): Query<EmailListQuery>,
) -> Result<Json<Vec<EmailAccount>>, AppError> {
    let emails = email_accounts(state.db.list_emails(query.admin_id.as_deref()).await?)?;

    if query.search.trim().is_empty() {
        return Ok(Json(emails));
    }

    let admins = admin_accounts(state.db.list_admins().await?)?;
    let params = FilterParams::with_term(query.search);
    Ok(Json(filter::filter_emails(&admins, &emails, &params)))
}

/// POST /emails — create an email account under an existing admin.
pub async fn create_email(
    State(state): State<AppState>,
    Json(req): Json<NewEmailAccount>,
) -> Result<(StatusCode, Json<EmailAccount>), AppError> {
    let address = req.email.trim();
    if address.is_empty() {
        return Err(AppError::BadRequest("Email address is required".to_string()));
    }

    if state.db.get_admin(&req.admin_id).await?.is_none() {
        return Err(AppError::NotFound("Admin account not found".to_string()));
    }

    let count = state.db.count_emails_for_admin(&req.admin_id).await?;
    if count >= MAX_EMAIL_ACCOUNTS_PER_ADMIN as i64 {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_EMAIL_ACCOUNTS_PER_ADMIN} email accounts per admin"
        )));
    }

    let mut row = EmailRow::from_new(&req);
    row.email = address.to_string();
    state.db.create_email(&row).await?;
    tracing::info!("Created email account {} for admin {}", row.email, row.admin_id);

    let created = fetch_email(&state, &row.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /emails/:id — typed partial update.
pub async fn update_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EmailAccountPatch>,
) -> Result<Json<EmailAccount>, AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    if !state.db.update_email(&id, &patch).await? {
        return Err(AppError::NotFound("Email account not found".to_string()));
    }

    let updated = fetch_email(&state, &id).await?;
    Ok(Json(updated))
}

/// DELETE /emails/:id
pub async fn delete_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_email(&id).await? {
        return Err(AppError::NotFound("Email account not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_email(state: &AppState, id: &str) -> Result<EmailAccount, AppError> {
    let row = state
        .db
        .get_email(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Email account not found".to_string()))?;
    Ok(EmailAccount::try_from(row)?)
}
