use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;

use shared::codec::ImportRow;
use shared::{AdminAccountPatch, EmailAccountPatch, ImportSummary};
use uuid::Uuid;

mod models;

pub use models::*;

const ADMIN_COLUMNS: &str = "id, name, email, provider, status, billing_date, payment_method, \
     billing_amount, num_secondary_accounts, enable_reminders, reminder_frequency, \
     delivery_method, notes, created_at, updated_at";

const EMAIL_COLUMNS: &str =
    "id, admin_id, email, provider, status, account_type, notes, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admin_accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                provider TEXT NOT NULL DEFAULT 'google',
                status TEXT NOT NULL DEFAULT 'active',
                billing_date TEXT,
                payment_method TEXT,
                billing_amount REAL,
                num_secondary_accounts INTEGER,
                enable_reminders INTEGER,
                reminder_frequency TEXT,
                delivery_method TEXT,
                notes TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS email_accounts (
                id TEXT PRIMARY KEY,
                admin_id TEXT NOT NULL REFERENCES admin_accounts(id),
                email TEXT NOT NULL,
                provider TEXT NOT NULL DEFAULT 'google',
                status TEXT NOT NULL DEFAULT 'active',
                account_type TEXT NOT NULL DEFAULT 'secondary',
                notes TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    // Admin account operations

    /// All admins, newest first. The rowid tiebreak keeps ordering stable
    /// when rows share a creation timestamp.
    pub async fn list_admins(&self) -> Result<Vec<AdminRow>, sqlx::Error> {
        let query = format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_accounts ORDER BY created_at DESC, rowid DESC"
        );
        sqlx::query_as::<_, AdminRow>(&query).fetch_all(&self.pool).await
    }

    pub async fn get_admin(&self, id: &str) -> Result<Option<AdminRow>, sqlx::Error> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE id = ?");
        sqlx::query_as::<_, AdminRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminRow>, sqlx::Error> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE email = ?");
        sqlx::query_as::<_, AdminRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts the admin and its initial secondary accounts in one
    /// transaction, so a failed email insert never leaves a bare admin.
    pub async fn create_admin(
        &self,
        admin: &AdminRow,
        secondary: &[EmailRow],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO admin_accounts (id, name, email, provider, status, billing_date, \
             payment_method, billing_amount, num_secondary_accounts, enable_reminders, \
             reminder_frequency, delivery_method, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.provider)
        .bind(&admin.status)
        .bind(&admin.billing_date)
        .bind(&admin.payment_method)
        .bind(admin.billing_amount)
        .bind(admin.num_secondary_accounts)
        .bind(admin.enable_reminders)
        .bind(&admin.reminder_frequency)
        .bind(&admin.delivery_method)
        .bind(&admin.notes)
        .execute(&mut *tx)
        .await?;

        for email in secondary {
            insert_email(&mut tx, email).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Partial update; `None` fields keep their stored value.
    /// Returns false when no admin has this id.
    pub async fn update_admin(
        &self,
        id: &str,
        patch: &AdminAccountPatch,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE admin_accounts SET \
             name = COALESCE(?, name), \
             email = COALESCE(?, email), \
             provider = COALESCE(?, provider), \
             status = COALESCE(?, status), \
             billing_date = COALESCE(?, billing_date), \
             payment_method = COALESCE(?, payment_method), \
             billing_amount = COALESCE(?, billing_amount), \
             num_secondary_accounts = COALESCE(?, num_secondary_accounts), \
             enable_reminders = COALESCE(?, enable_reminders), \
             reminder_frequency = COALESCE(?, reminder_frequency), \
             delivery_method = COALESCE(?, delivery_method), \
             notes = COALESCE(?, notes), \
             updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?",
        )
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(patch.provider.map(|p| p.to_string()))
        .bind(patch.status.map(|s| s.to_string()))
        .bind(patch.billing_date.map(|d| d.to_string()))
        .bind(patch.payment_method.map(|pm| pm.to_string()))
        .bind(patch.billing_amount)
        .bind(patch.num_secondary_accounts.map(i64::from))
        .bind(patch.enable_reminders)
        .bind(patch.reminder_frequency.map(|rf| rf.to_string()))
        .bind(patch.delivery_method.map(|dm| dm.to_string()))
        .bind(&patch.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the admin and its email accounts in one transaction.
    /// Returns false when no admin has this id.
    pub async fn delete_admin(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM email_accounts WHERE admin_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM admin_accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Nothing deleted, drop the transaction.
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    // Email account operations

    pub async fn list_emails(&self, admin_id: Option<&str>) -> Result<Vec<EmailRow>, sqlx::Error> {
        match admin_id {
            Some(admin_id) => {
                let query = format!(
                    "SELECT {EMAIL_COLUMNS} FROM email_accounts WHERE admin_id = ? \
                     ORDER BY created_at DESC, rowid DESC"
                );
                sqlx::query_as::<_, EmailRow>(&query)
                    .bind(admin_id)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {EMAIL_COLUMNS} FROM email_accounts \
                     ORDER BY created_at DESC, rowid DESC"
                );
                sqlx::query_as::<_, EmailRow>(&query).fetch_all(&self.pool).await
            }
        }
    }

    pub async fn get_email(&self, id: &str) -> Result<Option<EmailRow>, sqlx::Error> {
        let query = format!("SELECT {EMAIL_COLUMNS} FROM email_accounts WHERE id = ?");
        sqlx::query_as::<_, EmailRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn count_emails_for_admin(&self, admin_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM email_accounts WHERE admin_id = ?")
                .bind(admin_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn create_email(&self, email: &EmailRow) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        insert_email(&mut tx, email).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn update_email(
        &self,
        id: &str,
        patch: &EmailAccountPatch,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE email_accounts SET \
             email = COALESCE(?, email), \
             provider = COALESCE(?, provider), \
             status = COALESCE(?, status), \
             account_type = COALESCE(?, account_type), \
             notes = COALESCE(?, notes), \
             updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?",
        )
        .bind(&patch.email)
        .bind(patch.provider.map(|p| p.to_string()))
        .bind(patch.status.map(|s| s.to_string()))
        .bind(patch.account_type.map(|a| a.to_string()))
        .bind(&patch.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_email(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM email_accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // CSV import

    /// Applies parsed import rows in file order inside one transaction.
    /// A later row with the same admin email observes the admin inserted by
    /// an earlier row; any failure rolls the whole batch back.
    pub async fn apply_import(&self, rows: &[ImportRow]) -> Result<ImportSummary, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut summary = ImportSummary::default();

        for row in rows {
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT id FROM admin_accounts WHERE email = ?")
                    .bind(&row.admin_email)
                    .fetch_optional(&mut *tx)
                    .await?;

            let admin_id = match existing {
                Some((id,)) => id,
                None => {
                    let id = Uuid::new_v4().to_string();
                    sqlx::query(
                        "INSERT INTO admin_accounts (id, name, email, provider, status) \
                         VALUES (?, ?, ?, ?, 'active')",
                    )
                    .bind(&id)
                    .bind(&row.admin_name)
                    .bind(&row.admin_email)
                    .bind(row.provider.as_str())
                    .execute(&mut *tx)
                    .await?;
                    summary.admins_created += 1;
                    id
                }
            };

            let email = EmailRow::secondary(&admin_id, &row.secondary_email, row.provider);
            insert_email(&mut tx, &email).await?;
            summary.emails_created += 1;
        }

        tx.commit().await?;
        Ok(summary)
    }
}

async fn insert_email(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    email: &EmailRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO email_accounts (id, admin_id, email, provider, status, account_type, notes) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&email.id)
    .bind(&email.admin_id)
    .bind(&email.email)
    .bind(&email.provider)
    .bind(&email.status)
    .bind(&email.account_type)
    .bind(&email.notes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AccountStatus, NewAdminAccount, Provider};

    async fn test_db() -> Database {
        Database::in_memory().await.unwrap()
    }

    fn new_admin(name: &str, email: &str) -> AdminRow {
        AdminRow::from_new(&NewAdminAccount {
            name: name.to_string(),
            email: email.to_string(),
            provider: Provider::Google,
            status: AccountStatus::Active,
            billing_date: None,
            payment_method: None,
            billing_amount: None,
            num_secondary_accounts: None,
            enable_reminders: None,
            reminder_frequency: None,
            delivery_method: None,
            notes: None,
            secondary_emails: Vec::new(),
        })
    }

    fn import_row(admin_email: &str, secondary_email: &str) -> ImportRow {
        ImportRow {
            admin_email: admin_email.to_string(),
            admin_name: "Imported Admin".to_string(),
            secondary_email: secondary_email.to_string(),
            provider: Provider::Google,
        }
    }

    #[tokio::test]
    async fn test_list_admins_newest_first() {
        let db = test_db().await;
        db.create_admin(&new_admin("Alice", "a@x.com"), &[]).await.unwrap();
        db.create_admin(&new_admin("Bob", "b@x.com"), &[]).await.unwrap();

        let admins = db.list_admins().await.unwrap();
        let names: Vec<&str> = admins.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Alice"]);
    }

    #[tokio::test]
    async fn test_duplicate_admin_email_is_unique_violation() {
        let db = test_db().await;
        db.create_admin(&new_admin("Alice", "a@x.com"), &[]).await.unwrap();

        let err = db
            .create_admin(&new_admin("Imposter", "a@x.com"), &[])
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_admin_with_secondary_emails() {
        let db = test_db().await;
        let admin = new_admin("Alice", "a@x.com");
        let secondary = vec![
            EmailRow::secondary(&admin.id, "s1@x.com", Provider::Google),
            EmailRow::secondary(&admin.id, "s2@x.com", Provider::Microsoft),
        ];
        db.create_admin(&admin, &secondary).await.unwrap();

        assert_eq!(db.count_emails_for_admin(&admin.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_admin_rolls_back_on_failed_email_insert() {
        let db = test_db().await;
        let admin = new_admin("Alice", "a@x.com");
        let first = EmailRow::secondary(&admin.id, "s1@x.com", Provider::Google);
        let mut clash = EmailRow::secondary(&admin.id, "s2@x.com", Provider::Google);
        // Reusing the first id makes the second insert violate the primary key.
        clash.id = first.id.clone();

        assert!(db.create_admin(&admin, &[first, clash]).await.is_err());

        assert!(db.get_admin(&admin.id).await.unwrap().is_none());
        assert!(db.list_emails(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_admin_cascades_to_emails() {
        let db = test_db().await;
        let admin = new_admin("Alice", "a@x.com");
        let secondary = vec![EmailRow::secondary(&admin.id, "s1@x.com", Provider::Google)];
        db.create_admin(&admin, &secondary).await.unwrap();

        assert!(db.delete_admin(&admin.id).await.unwrap());

        assert!(db.get_admin(&admin.id).await.unwrap().is_none());
        let emails = db.list_emails(None).await.unwrap();
        assert!(emails.iter().all(|e| e.admin_id != admin.id));
    }

    #[tokio::test]
    async fn test_delete_admin_missing_id_is_false() {
        let db = test_db().await;
        assert!(!db.delete_admin("no-such-id").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_admin_is_partial() {
        let db = test_db().await;
        let admin = new_admin("Alice", "a@x.com");
        db.create_admin(&admin, &[]).await.unwrap();

        let patch = AdminAccountPatch {
            status: Some(AccountStatus::Inactive),
            ..Default::default()
        };
        assert!(db.update_admin(&admin.id, &patch).await.unwrap());

        let updated = db.get_admin(&admin.id).await.unwrap().unwrap();
        assert_eq!(updated.status, "inactive");
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_import_second_row_reuses_admin_from_first() {
        let db = test_db().await;
        let rows = vec![
            import_row("new@x.com", "s1@x.com"),
            import_row("new@x.com", "s2@x.com"),
        ];
        let summary = db.apply_import(&rows).await.unwrap();
        assert_eq!(summary.admins_created, 1);
        assert_eq!(summary.emails_created, 2);

        let admins = db.list_admins().await.unwrap();
        assert_eq!(admins.len(), 1);
        let emails = db.list_emails(Some(&admins[0].id)).await.unwrap();
        let mut addrs: Vec<&str> = emails.iter().map(|e| e.email.as_str()).collect();
        addrs.sort_unstable();
        assert_eq!(addrs, ["s1@x.com", "s2@x.com"]);
    }

    #[tokio::test]
    async fn test_import_reuses_preexisting_admin() {
        let db = test_db().await;
        db.create_admin(&new_admin("Alice", "a@x.com"), &[]).await.unwrap();

        let summary = db
            .apply_import(&[import_row("a@x.com", "s1@x.com")])
            .await
            .unwrap();
        assert_eq!(summary.admins_created, 0);
        assert_eq!(summary.emails_created, 1);
        assert_eq!(db.list_admins().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_crud_roundtrip() {
        let db = test_db().await;
        let admin = new_admin("Alice", "a@x.com");
        db.create_admin(&admin, &[]).await.unwrap();

        let email = EmailRow::secondary(&admin.id, "s1@x.com", Provider::Google);
        db.create_email(&email).await.unwrap();

        let patch = EmailAccountPatch {
            status: Some(AccountStatus::Inactive),
            ..Default::default()
        };
        assert!(db.update_email(&email.id, &patch).await.unwrap());
        let stored = db.get_email(&email.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "inactive");
        assert_eq!(stored.email, "s1@x.com");

        assert!(db.delete_email(&email.id).await.unwrap());
        assert!(db.get_email(&email.id).await.unwrap().is_none());
    }
}
