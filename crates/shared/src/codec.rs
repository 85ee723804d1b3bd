//! CSV serialization of admin accounts and parsing of uploaded imports.
//!
//! Both directions are pure: export takes the two collections and returns CSV
//! text, import takes CSV text and returns the rows to apply. Applying the
//! rows against the store is the server's job.

use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{AdminAccount, EmailAccount, Provider};

/// Export column order is fixed; importers of the exported file rely on it.
pub const EXPORT_HEADERS: [&str; 11] = [
    "Admin Name",
    "Primary Email",
    "Provider",
    "Status",
    "Billing Date",
    "Payment Method",
    "Billing Amount",
    "Secondary Accounts",
    "Secondary Emails",
    "Secondary Email Providers",
    "Secondary Email Statuses",
];

/// Name used when an imported row creates an admin without an `admin_name`.
pub const DEFAULT_IMPORT_ADMIN_NAME: &str = "Imported Admin";

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("no admin accounts to export")]
    EmptyExport,
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output was not valid utf-8")]
    InvalidUtf8,
}

/// One admin per row. The three secondary-email columns hold that admin's
/// owned accounts joined in collection order, or "None" when it has none.
pub fn export_admins(
    admins: &[AdminAccount],
    emails: &[EmailAccount],
) -> Result<String, CsvError> {
    if admins.is_empty() {
        return Err(CsvError::EmptyExport);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for admin in admins {
        let owned: Vec<&EmailAccount> =
            emails.iter().filter(|e| e.admin_id == admin.id).collect();

        let billing_date = admin
            .billing_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Not set".to_string());
        let payment_method = match admin.payment_method {
            Some(pm) => capitalize(pm.as_str()),
            None => "Not set".to_string(),
        };
        let billing_amount = admin
            .billing_amount
            .map(|amount| format!("${amount:.2}"))
            .unwrap_or_else(|| "$0".to_string());
        // Stored advisory count wins; fall back to the actual row count.
        let secondary_count = admin
            .num_secondary_accounts
            .map(|n| n.to_string())
            .unwrap_or_else(|| owned.len().to_string());

        let secondary_emails = join_or_none(owned.iter().map(|e| e.email.as_str()));
        let secondary_providers = join_or_none(owned.iter().map(|e| e.provider.as_str()));
        let secondary_statuses = join_or_none(owned.iter().map(|e| e.status.as_str()));

        writer.write_record([
            admin.name.as_str(),
            admin.email.as_str(),
            admin.provider.as_str(),
            admin.status.as_str(),
            billing_date.as_str(),
            payment_method.as_str(),
            billing_amount.as_str(),
            secondary_count.as_str(),
            secondary_emails.as_str(),
            secondary_providers.as_str(),
            secondary_statuses.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| CsvError::InvalidUtf8)
}

/// Download filename for an export produced on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("workspace_admins_{}.csv", date.format("%Y-%m-%d"))
}

fn join_or_none<'a>(mut values: impl Iterator<Item = &'a str>) -> String {
    let mut out = match values.next() {
        Some(first) => first.to_string(),
        None => return "None".to_string(),
    };
    for value in values {
        out.push_str(", ");
        out.push_str(value);
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// One valid row of an uploaded CSV, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub admin_email: String,
    pub admin_name: String,
    pub secondary_email: String,
    pub provider: Provider,
}

/// Result of parsing an uploaded CSV: the rows to apply in file order, plus
/// how many rows were skipped for missing required columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub skipped: u32,
}

#[derive(Debug, Deserialize)]
struct RawImportRow {
    #[serde(default)]
    admin_email: Option<String>,
    #[serde(default)]
    admin_name: Option<String>,
    #[serde(default)]
    secondary_email: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

/// Parses uploaded CSV text. Recognized columns are `admin_email`,
/// `admin_name`, `secondary_email` and `provider`; extra columns are ignored
/// and missing ones fall back to defaults. A row missing `admin_email` or
/// `secondary_email` (after trimming) is skipped and counted, not an error.
pub fn parse_import(text: &str) -> Result<ParsedImport, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedImport::default();
    for record in reader.deserialize::<RawImportRow>() {
        let raw = record?;

        let admin_email = raw.admin_email.unwrap_or_default();
        let secondary_email = raw.secondary_email.unwrap_or_default();
        if admin_email.is_empty() || secondary_email.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        let admin_name = raw
            .admin_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_IMPORT_ADMIN_NAME.to_string());
        let provider = raw
            .provider
            .as_deref()
            .and_then(|p| Provider::from_str(&p.to_lowercase()).ok())
            .unwrap_or_default();

        parsed.rows.push(ImportRow {
            admin_email,
            admin_name,
            secondary_email,
            provider,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, AccountType, PaymentMethod};

    fn admin(id: &str, name: &str, email: &str) -> AdminAccount {
        AdminAccount {
            id: id.to_string(),
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
            created_at: None,
            updated_at: None,
        }
    }

    fn email(id: &str, admin_id: &str, addr: &str) -> EmailAccount {
        EmailAccount {
            id: id.to_string(),
            admin_id: admin_id.to_string(),
            email: addr.to_string(),
            provider: Provider::Google,
            status: AccountStatus::Active,
            account_type: AccountType::Secondary,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_export_one_row_per_admin() {
        let admins = vec![admin("1", "Alice", "a@x.com"), admin("2", "Bob", "b@x.com")];
        let emails = vec![
            email("e1", "1", "s1@x.com"),
            email("e2", "2", "s2@x.com"),
            email("e3", "1", "s3@x.com"),
        ];
        let out = export_admins(&admins, &emails).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        // Header plus one row per admin, never per email.
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Admin Name,Primary Email"));
        assert!(lines[1].contains("\"s1@x.com, s3@x.com\""));
        assert!(lines[2].contains("s2@x.com"));
        assert!(!lines[2].contains("s1@x.com"));
    }

    #[test]
    fn test_export_placeholders_for_unset_fields() {
        let admins = vec![admin("1", "Alice", "a@x.com")];
        let out = export_admins(&admins, &[]).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "Alice,a@x.com,google,active,Not set,Not set,$0,0,None,None,None"
        );
    }

    #[test]
    fn test_export_formats_billing_metadata() {
        let mut a = admin("1", "Alice", "a@x.com");
        a.billing_date = Some(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        a.payment_method = Some(PaymentMethod::Manual);
        a.billing_amount = Some(12.5);
        a.num_secondary_accounts = Some(4);
        let out = export_admins(&[a], &[]).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert!(row.contains("2025-03-14"));
        assert!(row.contains("Manual"));
        assert!(row.contains("$12.50"));
        assert!(row.contains(",4,"));
    }

    #[test]
    fn test_export_empty_is_an_error() {
        assert!(matches!(export_admins(&[], &[]), Err(CsvError::EmptyExport)));
    }

    #[test]
    fn test_export_filename_embeds_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(export_filename(date), "workspace_admins_2025-01-09.csv");
    }

    #[test]
    fn test_import_skips_rows_missing_required_columns() {
        let csv = "\
admin_email,admin_name,secondary_email,provider
a@x.com,Alice,s1@x.com,google
,Bob,s2@x.com,google
b@x.com,Carol,,microsoft
b@x.com,Carol,s3@x.com,microsoft
";
        let parsed = parse_import(csv).unwrap();
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].admin_email, "a@x.com");
        assert_eq!(parsed.rows[1].provider, Provider::Microsoft);
    }

    #[test]
    fn test_import_defaults_name_and_provider() {
        let csv = "\
admin_email,secondary_email
new@x.com,s1@x.com
";
        let parsed = parse_import(csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].admin_name, DEFAULT_IMPORT_ADMIN_NAME);
        assert_eq!(parsed.rows[0].provider, Provider::Google);
    }

    #[test]
    fn test_import_ignores_extra_columns_and_unknown_provider() {
        let csv = "\
admin_email,secondary_email,provider,favorite_color
a@x.com,s1@x.com,yahoo,blue
";
        let parsed = parse_import(csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        // Unknown providers fall back to the default rather than failing the row.
        assert_eq!(parsed.rows[0].provider, Provider::Google);
    }

    #[test]
    fn test_import_preserves_file_order() {
        let csv = "\
admin_email,admin_name,secondary_email,provider
new@x.com,New,s1@x.com,google
new@x.com,,s2@x.com,google
";
        let parsed = parse_import(csv).unwrap();
        let secondaries: Vec<&str> = parsed
            .rows
            .iter()
            .map(|r| r.secondary_email.as_str())
            .collect();
        assert_eq!(secondaries, ["s1@x.com", "s2@x.com"]);
        assert_eq!(parsed.rows[0].admin_email, parsed.rows[1].admin_email);
    }

    #[test]
    fn test_import_whitespace_only_fields_are_skipped() {
        let csv = "\
admin_email,secondary_email
   ,s1@x.com
";
        let parsed = parse_import(csv).unwrap();
        assert_eq!(parsed.rows.len(), 0);
        assert_eq!(parsed.skipped, 1);
    }
}
