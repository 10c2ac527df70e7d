//! The authenticated account's profile and role record.

use serde::{Deserialize, Serialize};

use upgrow_core::{CurrencyCode, Email, Role};

use crate::api::types::UserPayload;

/// The authenticated user's profile and role record.
///
/// Owned exclusively by the session lifecycle manager; the dashboard
/// engine reads it but never mutates it. Associated 1:1 with a
/// [`crate::models::DashboardSnapshot`] by account email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique account key.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: String,
    pub agency_name: String,
    /// Derived through `Role::derive`, never taken raw from a payload.
    pub role: Role,
    /// Deactivated accounts route to the Deactivated view.
    pub account_active: bool,
    /// Incomplete onboarding routes to the Onboarding view.
    pub onboarding_complete: bool,
    /// Currency preference used for every displayed amount.
    pub currency: CurrencyCode,
    /// Language preference, passed through to the view layer.
    pub language: String,
}

impl Identity {
    /// Build an identity from a backend profile payload.
    ///
    /// Missing fields fail closed to defaults; the role always goes
    /// through the centralized derivation (which enforces the
    /// super-administrator override).
    #[must_use]
    pub fn from_payload(email: Email, payload: &UserPayload) -> Self {
        let role = Role::derive(email.as_str(), payload.role.as_deref());
        let (first_name, last_name) = payload_name(payload);

        Self {
            role,
            first_name,
            last_name,
            phone: payload.phone.clone().unwrap_or_default(),
            country: payload.country.clone().unwrap_or_default(),
            agency_name: payload.agency_name.clone().unwrap_or_default(),
            account_active: payload.is_active.unwrap_or(true),
            onboarding_complete: payload.onboarding_complete.unwrap_or(false),
            currency: payload
                .currency
                .as_deref()
                .map(CurrencyCode::parse)
                .unwrap_or_default(),
            language: payload.language.clone().unwrap_or_else(|| "en".to_owned()),
            email,
        }
    }

    /// Apply a reconciled profile payload on top of this identity.
    ///
    /// Only present fields overwrite; a field the backend omitted keeps
    /// its prior value. The onboarding flag only flips upward - the
    /// backend reporting completion retroactively suppresses the
    /// Onboarding view, but an omission never reopens it.
    pub fn apply_profile(&mut self, payload: &UserPayload) {
        if payload.first_name.is_some() || payload.full_name.is_some() {
            let (first_name, last_name) = payload_name(payload);
            self.first_name = first_name;
            if !last_name.is_empty() || payload.last_name.is_some() {
                self.last_name = last_name;
            }
        }
        if let Some(phone) = &payload.phone {
            self.phone = phone.clone();
        }
        if let Some(country) = &payload.country {
            self.country = country.clone();
        }
        if let Some(agency_name) = &payload.agency_name {
            self.agency_name = agency_name.clone();
        }
        if let Some(role) = payload.role.as_deref() {
            self.role = Role::derive(self.email.as_str(), Some(role));
        }
        if let Some(active) = payload.is_active {
            self.account_active = active;
        }
        if payload.onboarding_complete == Some(true) {
            self.onboarding_complete = true;
        }
        if let Some(currency) = payload.currency.as_deref() {
            self.currency = CurrencyCode::parse(currency);
        }
        if let Some(language) = &payload.language {
            self.language = language.clone();
        }
    }

    /// Display name for greetings and notifications.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.local_part().to_owned()
        } else {
            name.to_owned()
        }
    }
}

/// Resolve first/last name from a payload, preferring explicit fields and
/// falling back to splitting `full_name` at the first space.
fn payload_name(payload: &UserPayload) -> (String, String) {
    if payload.first_name.is_some() || payload.last_name.is_some() {
        return (
            payload.first_name.clone().unwrap_or_default(),
            payload.last_name.clone().unwrap_or_default(),
        );
    }
    payload
        .full_name
        .as_deref()
        .map(split_full_name)
        .unwrap_or_default()
}

/// Split a full name at the first space.
pub(crate) fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.trim().split_once(' ') {
        Some((first, last)) => (first.to_owned(), last.trim().to_owned()),
        None => (full_name.trim().to_owned(), String::new()),
    }
}
