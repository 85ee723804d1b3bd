//! Narrows the admin and email collections for display.
//!
//! Pure functions over immutable snapshots: no re-sorting, no mutation, safe
//! to call on every keystroke. The facet value `All` is a wildcard and an
//! empty search term matches everything.

use crate::types::{AdminAccount, EmailAccount, PaymentMethodFilter, ProviderFilter};

#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub term: String,
    pub payment_method: PaymentMethodFilter,
    pub provider: ProviderFilter,
}

impl FilterParams {
    pub fn with_term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }
}

/// Admins that pass both facets and match the search term, either in their
/// own fields or in one of their owned email accounts' addresses.
/// Preserves the input order.
pub fn filter_admins(
    admins: &[AdminAccount],
    emails: &[EmailAccount],
    params: &FilterParams,
) -> Vec<AdminAccount> {
    let term = params.term.trim().to_lowercase();
    admins
        .iter()
        .filter(|admin| admin_matches(admin, emails, &term, params))
        .cloned()
        .collect()
}

/// Email accounts whose owning admin passes [`filter_admins`].
/// Preserves the input order.
pub fn filter_emails(
    admins: &[AdminAccount],
    emails: &[EmailAccount],
    params: &FilterParams,
) -> Vec<EmailAccount> {
    let term = params.term.trim().to_lowercase();
    emails
        .iter()
        .filter(|email| {
            admins
                .iter()
                .any(|admin| admin.id == email.admin_id && admin_matches(admin, emails, &term, params))
        })
        .cloned()
        .collect()
}

fn admin_matches(
    admin: &AdminAccount,
    emails: &[EmailAccount],
    term: &str,
    params: &FilterParams,
) -> bool {
    if !params.payment_method.matches(admin.payment_method) {
        return false;
    }
    if !params.provider.matches(admin.provider) {
        return false;
    }
    if term.is_empty() {
        return true;
    }

    let haystack = [
        admin.name.as_str(),
        admin.email.as_str(),
        admin.provider.as_str(),
        admin.status.as_str(),
        admin.notes.as_deref().unwrap_or(""),
    ]
    .join(" ")
    .to_lowercase();

    if haystack.contains(term) {
        return true;
    }

    emails
        .iter()
        .any(|e| e.admin_id == admin.id && e.email.to_lowercase().contains(term))
}
