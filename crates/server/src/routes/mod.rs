use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod admins;
mod emails;
mod health;
mod transfer;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Admin accounts
        .route("/admins", get(admins::list_admins).post(admins::create_admin))
        .route("/admins/check-email", get(admins::check_email))
        .route(
            "/admins/:id",
            get(admins::get_admin)
                .patch(admins::update_admin)
                .delete(admins::delete_admin),
        )
        // Email accounts
        .route("/emails", get(emails::list_emails).post(emails::create_email))
        .route(
            "/emails/:id",
            patch(emails::update_email).delete(emails::delete_email),
        )
        // CSV import/export
        .route("/import/csv", post(transfer::import_csv))
        .route("/export/csv", get(transfer::export_csv))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::Database};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::in_memory().await.unwrap();
        create_router(AppState::new(db, Config::default()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_duplicate_admin_email_is_conflict() {
        let app = test_router().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/admins",
            Some(json!({"name": "Alice", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/admins",
            Some(json!({"name": "Imposter", "email": "a@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already registered"));
    }

    #[tokio::test]
    async fn test_create_email_under_missing_admin_is_not_found() {
        let app = test_router().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/emails",
            Some(json!({"admin_id": "no-such-admin", "email": "s@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_email_accounts_per_admin_cap() {
        let app = test_router().await;
        let secondary: Vec<String> = (0..50).map(|i| format!("s{i}@x.com")).collect();
        let (status, admin) = send(
            &app,
            Method::POST,
            "/admins",
            Some(json!({"name": "Alice", "email": "a@x.com", "secondary_emails": secondary})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let admin_id = admin["id"].as_str().unwrap();
        let (status, body) = send(
            &app,
            Method::POST,
            "/emails",
            Some(json!({"admin_id": admin_id, "email": "one-more@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("50"));
    }

    #[tokio::test]
    async fn test_csv_import_reports_aggregate_summary() {
        let app = test_router().await;
        let csv = "\
admin_email,admin_name,secondary_email,provider
new@x.com,New,s1@x.com,google
new@x.com,,s2@x.com,google
,Broken,s3@x.com,google
";
        let request = Request::builder()
            .method(Method::POST)
            .uri("/import/csv")
            .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(Body::from(csv))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let summary: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary["admins_created"], 1);
        assert_eq!(summary["emails_created"], 2);
        assert_eq!(summary["rows_skipped"], 1);

        // Both rows landed under the one admin created by the first.
        let (status, admins) = send(&app, Method::GET, "/admins", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(admins.as_array().unwrap().len(), 1);
        let (_, emails) = send(&app, Method::GET, "/emails", None).await;
        assert_eq!(emails.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admin_list_applies_search_and_facets() {
        let app = test_router().await;
        send(
            &app,
            Method::POST,
            "/admins",
            Some(json!({"name": "Alice", "email": "a@x.com", "payment_method": "manual"})),
        )
        .await;
        send(
            &app,
            Method::POST,
            "/admins",
            Some(json!({"name": "Bob", "email": "b@x.com", "payment_method": "automatic"})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::GET,
            "/admins?search=alice&payment_method=manual&provider=all",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Alice"]);

        let (_, body) = send(&app, Method::GET, "/admins?search=bob&payment_method=manual", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_sets_filename_and_rejects_empty() {
        let app = test_router().await;
        let empty = Request::builder()
            .uri("/export/csv")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(empty).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        send(
            &app,
            Method::POST,
            "/admins",
            Some(json!({"name": "Alice", "email": "a@x.com"})),
        )
        .await;
        let request = Request::builder()
            .uri("/export/csv")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("workspace_admins_"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Admin Name,Primary Email"));
        assert!(text.lines().nth(1).unwrap().contains("a@x.com"));
    }
}
