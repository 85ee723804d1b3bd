use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-admin cap on secondary email accounts.
pub const MAX_EMAIL_ACCOUNTS_PER_ADMIN: usize = 50;

/// A stored enum value didn't match any known variant.
#[derive(Debug, Error)]
#[error("unknown {field} value: {value:?}")]
pub struct ParseFieldError {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Google,
    Microsoft,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "microsoft" => Ok(Provider::Microsoft),
            other => Err(ParseFieldError {
                field: "provider",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(ParseFieldError {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Primary,
    #[default]
    Secondary,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Primary => "primary",
            AccountType::Secondary => "secondary",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(AccountType::Primary),
            "secondary" => Ok(AccountType::Secondary),
            other => Err(ParseFieldError {
                field: "account_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Automatic,
    Manual,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Automatic => "automatic",
            PaymentMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(PaymentMethod::Automatic),
            "manual" => Ok(PaymentMethod::Manual),
            other => Err(ParseFieldError {
                field: "payment_method",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ReminderFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderFrequency::Daily => "daily",
            ReminderFrequency::Weekly => "weekly",
            ReminderFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ReminderFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderFrequency {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ReminderFrequency::Daily),
            "weekly" => Ok(ReminderFrequency::Weekly),
            "monthly" => Ok(ReminderFrequency::Monthly),
            other => Err(ParseFieldError {
                field: "reminder_frequency",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    App,
    Sms,
    Email,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::App => "app",
            DeliveryMethod::Sms => "sms",
            DeliveryMethod::Email => "email",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(DeliveryMethod::App),
            "sms" => Ok(DeliveryMethod::Sms),
            "email" => Ok(DeliveryMethod::Email),
            other => Err(ParseFieldError {
                field: "delivery_method",
                value: other.to_string(),
            }),
        }
    }
}

/// A workspace administrator account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub provider: Provider,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_amount: Option<f64>,
    /// Operator-entered advisory count, not reconciled against actual rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_secondary_accounts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_frequency: Option<ReminderFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A secondary (or primary) email account owned by one admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAccount {
    pub id: String,
    pub admin_id: String,
    pub email: String,
    pub provider: Provider,
    pub status: AccountStatus,
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Payload for creating an admin account. Secondary emails listed here are
/// created together with the admin, in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdminAccount {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub billing_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub billing_amount: Option<f64>,
    #[serde(default)]
    pub num_secondary_accounts: Option<u32>,
    #[serde(default)]
    pub enable_reminders: Option<bool>,
    #[serde(default)]
    pub reminder_frequency: Option<ReminderFrequency>,
    #[serde(default)]
    pub delivery_method: Option<DeliveryMethod>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub secondary_emails: Vec<String>,
}

/// Typed partial update for an admin account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminAccountPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_secondary_accounts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_frequency: Option<ReminderFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AdminAccountPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.provider.is_none()
            && self.status.is_none()
            && self.billing_date.is_none()
            && self.payment_method.is_none()
            && self.billing_amount.is_none()
            && self.num_secondary_accounts.is_none()
            && self.enable_reminders.is_none()
            && self.reminder_frequency.is_none()
            && self.delivery_method.is_none()
            && self.notes.is_none()
    }
}

/// Payload for creating an email account under an existing admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmailAccount {
    pub admin_id: String,
    pub email: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Typed partial update for an email account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailAccountPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EmailAccountPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.provider.is_none()
            && self.status.is_none()
            && self.account_type.is_none()
            && self.notes.is_none()
    }
}

/// Aggregate result of a CSV import. The import is all-or-nothing, so these
/// counts describe either the applied batch or (on failure) nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub admins_created: u32,
    pub emails_created: u32,
    pub rows_skipped: u32,
}

/// Payment-method facet. `All` is a wildcard, not a value to match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodFilter {
    #[default]
    All,
    Automatic,
    Manual,
}

impl PaymentMethodFilter {
    pub fn matches(self, value: Option<PaymentMethod>) -> bool {
        match self {
            PaymentMethodFilter::All => true,
            PaymentMethodFilter::Automatic => value == Some(PaymentMethod::Automatic),
            PaymentMethodFilter::Manual => value == Some(PaymentMethod::Manual),
        }
    }
}

/// Provider facet. `All` is a wildcard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFilter {
    #[default]
    All,
    Google,
    Microsoft,
}

impl ProviderFilter {
    pub fn matches(self, value: Provider) -> bool {
        match self {
            ProviderFilter::All => true,
            ProviderFilter::Google => value == Provider::Google,
            ProviderFilter::Microsoft => value == Provider::Microsoft,
        }
    }
}
