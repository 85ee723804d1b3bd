use chrono::NaiveDate;
use shared::{
    AccountStatus, AccountType, AdminAccount, DeliveryMethod, EmailAccount, NewAdminAccount,
    NewEmailAccount, ParseFieldError, PaymentMethod, Provider, ReminderFrequency,
};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Raw `admin_accounts` row. Enum columns stay strings here and are parsed
/// into the shared types at the API boundary.
#[derive(Debug, Clone, FromRow)]
pub struct AdminRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub provider: String,
    pub status: String,
    pub billing_date: Option<String>,
    pub payment_method: Option<String>,
    pub billing_amount: Option<f64>,
    pub num_secondary_accounts: Option<i64>,
    pub enable_reminders: Option<bool>,
    pub reminder_frequency: Option<String>,
    pub delivery_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl AdminRow {
    pub fn from_new(req: &NewAdminAccount) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: req.name.clone(),
            email: req.email.clone(),
            provider: req.provider.to_string(),
            status: req.status.to_string(),
            billing_date: req.billing_date.map(|d| d.to_string()),
            payment_method: req.payment_method.map(|pm| pm.to_string()),
            billing_amount: req.billing_amount,
            num_secondary_accounts: req.num_secondary_accounts.map(i64::from),
            enable_reminders: req.enable_reminders,
            reminder_frequency: req.reminder_frequency.map(|rf| rf.to_string()),
            delivery_method: req.delivery_method.map(|dm| dm.to_string()),
            notes: req.notes.clone(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl TryFrom<AdminRow> for AdminAccount {
    type Error = ParseFieldError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        Ok(AdminAccount {
            provider: Provider::from_str(&row.provider)?,
            status: AccountStatus::from_str(&row.status)?,
            billing_date: parse_date(row.billing_date)?,
            payment_method: parse_opt::<PaymentMethod>(row.payment_method)?,
            num_secondary_accounts: row.num_secondary_accounts.map(|n| n.max(0) as u32),
            reminder_frequency: parse_opt::<ReminderFrequency>(row.reminder_frequency)?,
            delivery_method: parse_opt::<DeliveryMethod>(row.delivery_method)?,
            id: row.id,
            name: row.name,
            email: row.email,
            billing_amount: row.billing_amount,
            enable_reminders: row.enable_reminders,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Raw `email_accounts` row.
#[derive(Debug, Clone, FromRow)]
pub struct EmailRow {
    pub id: String,
    pub admin_id: String,
    pub email: String,
    pub provider: String,
    pub status: String,
    pub account_type: String,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl EmailRow {
    pub fn from_new(req: &NewEmailAccount) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            admin_id: req.admin_id.clone(),
            email: req.email.clone(),
            provider: req.provider.to_string(),
            status: req.status.to_string(),
            account_type: req.account_type.to_string(),
            notes: req.notes.clone(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Secondary account created alongside a new admin or by a CSV import.
    pub fn secondary(admin_id: &str, email: &str, provider: Provider) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            admin_id: admin_id.to_string(),
            email: email.to_string(),
            provider: provider.to_string(),
            status: AccountStatus::Active.to_string(),
            account_type: AccountType::Secondary.to_string(),
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl TryFrom<EmailRow> for EmailAccount {
    type Error = ParseFieldError;

    fn try_from(row: EmailRow) -> Result<Self, Self::Error> {
        Ok(EmailAccount {
            provider: Provider::from_str(&row.provider)?,
            status: AccountStatus::from_str(&row.status)?,
            account_type: AccountType::from_str(&row.account_type)?,
            id: row.id,
            admin_id: row.admin_id,
            email: row.email,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_opt<T: FromStr<Err = ParseFieldError>>(
    value: Option<String>,
) -> Result<Option<T>, ParseFieldError> {
    value.map(|v| T::from_str(&v)).transpose()
}

fn parse_date(value: Option<String>) -> Result<Option<NaiveDate>, ParseFieldError> {
    value
        .map(|v| {
            NaiveDate::from_str(&v).map_err(|_| ParseFieldError {
                field: "billing_date",
                value: v,
            })
        })
        .transpose()
}
