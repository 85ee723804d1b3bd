//! Thin HTTP client for the WAM server.

use anyhow::{bail, Result};
use serde::Deserialize;

use shared::{
    AdminAccount, AdminAccountPatch, EmailAccount, EmailAccountPatch, ImportSummary,
    NewAdminAccount, NewEmailAccount,
};

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

/// One admin with its email accounts, as served by GET /admins/:id.
#[derive(Debug, Deserialize)]
pub struct AdminDetail {
    #[serde(flatten)]
    pub admin: AdminAccount,
    pub email_accounts: Vec<EmailAccount>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn list_admins(
        &self,
        search: &str,
        payment_method: &str,
        provider: &str,
    ) -> Result<Vec<AdminAccount>> {
        let resp = self
            .http
            .get(format!("{}/admins", self.base_url))
            .query(&[
                ("search", search),
                ("payment_method", payment_method),
                ("provider", provider),
            ])
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn get_admin(&self, id: &str) -> Result<AdminDetail> {
        let resp = self
            .http
            .get(format!("{}/admins/{}", self.base_url, id))
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn create_admin(&self, req: &NewAdminAccount) -> Result<AdminAccount> {
        let resp = self
            .http
            .post(format!("{}/admins", self.base_url))
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn update_admin(&self, id: &str, patch: &AdminAccountPatch) -> Result<AdminAccount> {
        let resp = self
            .http
            .patch(format!("{}/admins/{}", self.base_url, id))
            .json(patch)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn delete_admin(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/admins/{}", self.base_url, id))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn list_emails(
        &self,
        admin_id: Option<&str>,
        search: &str,
    ) -> Result<Vec<EmailAccount>> {
        let mut request = self
            .http
            .get(format!("{}/emails", self.base_url))
            .query(&[("search", search)]);
        if let Some(admin_id) = admin_id {
            request = request.query(&[("admin_id", admin_id)]);
        }
        let resp = request.send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn create_email(&self, req: &NewEmailAccount) -> Result<EmailAccount> {
        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn update_email(&self, id: &str, patch: &EmailAccountPatch) -> Result<EmailAccount> {
        let resp = self
            .http
            .patch(format!("{}/emails/{}", self.base_url, id))
            .json(patch)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn delete_email(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/emails/{}", self.base_url, id))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn import_csv(&self, csv_text: String) -> Result<ImportSummary> {
        let resp = self
            .http
            .post(format!("{}/import/csv", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(csv_text)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn export_csv(&self) -> Result<String> {
        let resp = self
            .http
            .get(format!("{}/export/csv", self.base_url))
            .send()
            .await?;
        Ok(check(resp).await?.text().await?)
    }
}

/// Turns a non-2xx response into the server's error message.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| format!("server returned {status}"));
    bail!("{message}")
}
