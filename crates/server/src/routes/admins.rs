use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use shared::filter::{self, FilterParams};
use shared::{
    AdminAccount, AdminAccountPatch, EmailAccount, NewAdminAccount, PaymentMethodFilter,
    ProviderFilter, MAX_EMAIL_ACCOUNTS_PER_ADMIN,
};

use crate::{
    db::{AdminRow, EmailRow},
    error::AppError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub payment_method: PaymentMethodFilter,
    #[serde(default)]
    pub provider: ProviderFilter,
}

/// GET /admins — the filtered collection, newest first.
pub async fn list_admins(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Vec<AdminAccount>>, AppError> {
    let admins = admin_accounts(state.db.list_admins().await?)?;
    let emails = email_accounts(state.db.list_emails(None).await?)?;

    let params = FilterParams {
        term: query.search,
        payment_method: query.payment_method,
        provider: query.provider,
    };
    Ok(Json(filter::filter_admins(&admins, &emails, &params)))
}

/// POST /admins — create an admin, plus its initial secondary accounts in the
/// same transaction.
pub async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<NewAdminAccount>,
) -> Result<(StatusCode, Json<AdminAccount>), AppError> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest("Name and email are required".to_string()));
    }

    let secondary: Vec<&str> = req
        .secondary_emails
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if secondary.len() > MAX_EMAIL_ACCOUNTS_PER_ADMIN {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_EMAIL_ACCOUNTS_PER_ADMIN} secondary email accounts per admin"
        )));
    }

    // Fast-path hint only; the UNIQUE constraint below stays authoritative.
    if state.db.get_admin_by_email(email).await?.is_some() {
        return Err(AppError::Duplicate("Email already registered".to_string()));
    }

    let mut admin = AdminRow::from_new(&req);
    admin.name = name.to_string();
    admin.email = email.to_string();
    let email_rows: Vec<EmailRow> = secondary
        .iter()
        .map(|e| EmailRow::secondary(&admin.id, e, req.provider))
        .collect();

    state.db.create_admin(&admin, &email_rows).await?;
    tracing::info!("Created admin account {} <{}>", admin.name, admin.email);

    let created = fetch_admin(&state, &admin.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Serialize)]
pub struct AdminDetail {
    #[serde(flatten)]
    pub admin: AdminAccount,
    pub email_accounts: Vec<EmailAccount>,
}

/// GET /admins/:id — one admin with its email accounts.
pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminDetail>, AppError> {
    let admin = fetch_admin(&state, &id).await?;
    let email_accounts = email_accounts(state.db.list_emails(Some(&id)).await?)?;
    Ok(Json(AdminDetail { admin, email_accounts }))
}

/// PATCH /admins/:id — typed partial update.
pub async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<AdminAccountPatch>,
) -> Result<Json<AdminAccount>, AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    if !state.db.update_admin(&id, &patch).await? {
        return Err(AppError::NotFound("Admin account not found".to_string()));
    }

    let updated = fetch_admin(&state, &id).await?;
    Ok(Json(updated))
}

/// DELETE /admins/:id — removes the admin and its email accounts together.
pub async fn delete_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_admin(&id).await? {
        return Err(AppError::NotFound("Admin account not found".to_string()));
    }
    tracing::info!("Deleted admin account {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

/// GET /admins/check-email — pre-insert uniqueness hint for forms.
pub async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> Result<Json<CheckEmailResponse>, AppError> {
    let exists = state
        .db
        .get_admin_by_email(query.email.trim())
        .await?
        .is_some();
    Ok(Json(CheckEmailResponse { exists }))
}

async fn fetch_admin(state: &AppState, id: &str) -> Result<AdminAccount, AppError> {
    let row = state
        .db
        .get_admin(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin account not found".to_string()))?;
    Ok(AdminAccount::try_from(row)?)
}

pub(super) fn admin_accounts(rows: Vec<AdminRow>) -> Result<Vec<AdminAccount>, AppError> {
    rows.into_iter()
        .map(|row| AdminAccount::try_from(row).map_err(AppError::from))
        .collect()
}

pub(super) fn email_accounts(rows: Vec<EmailRow>) -> Result<Vec<EmailAccount>, AppError> {
    rows.into_iter()
        .map(|row| EmailAccount::try_from(row).map_err(AppError::from))
        .collect()
}
