//! CSV import/export endpoints.

use axum::{
    extract::State,
    http::{header, StatusCode},
    Json,
};
use chrono::Utc;

use shared::codec;
use shared::ImportSummary;

use crate::{error::AppError, state::AppState};

use super::admins::{admin_accounts, email_accounts};

/// POST /import/csv — body is the raw uploaded CSV text. Rows are applied in
/// file order inside one transaction; the response is the aggregate summary.
pub async fn import_csv(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    let parsed = codec::parse_import(&body)?;
    tracing::info!(
        "CSV import: {} valid rows, {} skipped",
        parsed.rows.len(),
        parsed.skipped
    );

    let mut summary = state.db.apply_import(&parsed.rows).await?;
    summary.rows_skipped = parsed.skipped;
    Ok(Json(summary))
}

/// GET /export/csv — one row per admin, filename embeds the current date.
pub async fn export_csv(
    State(state): State<AppState>,
) -> Result<(StatusCode, [(header::HeaderName, String); 2], String), AppError> {
    let admins = admin_accounts(state.db.list_admins().await?)?;
    let emails = email_accounts(state.db.list_emails(None).await?)?;

    let csv = codec::export_admins(&admins, &emails)?;
    let filename = codec::export_filename(Utc::now().date_naive());
    tracing::info!("Exporting {} admin accounts to {}", admins.len(), filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
