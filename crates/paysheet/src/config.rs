//! Payment sheet configuration
//!
//! Hosts can build a [`Configuration`] in code, or load one from a TOML file
//! layered with `PAYSHEET_*` environment overrides:
//!
//! ```toml
//! publishable_key = "pk_test_123"
//! merchant_display_name = "Example, Inc."
//! return_url = "example://stripe-redirect"
//!
//! [customer]
//! id = "cus_123"
//! ephemeral_key_secret = "ek_test_123"
//! ```

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::Error;

/// Publishable key prefix of the dashboard user-key class, which cannot send
/// raw payment method data on confirmation
pub const RESTRICTED_KEY_PREFIX: &str = "uk_";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PAYSHEET";

/// Customer credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerConfiguration {
    /// Customer id
    pub id: Option<String>,
    /// Ephemeral key that authorizes customer scoped requests
    pub ephemeral_key_secret: Option<String>,
}

/// Apple Pay configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplePayConfiguration {
    /// Apple merchant identifier
    pub merchant_id: String,
    /// Two letter country code of the merchant
    pub merchant_country_code: String,
}

/// Payment sheet configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Publishable API key
    pub publishable_key: Option<String>,
    /// Name shown to the customer in wallet sheets
    pub merchant_display_name: String,
    /// Customer whose saved payment methods should be offered
    pub customer: Option<CustomerConfiguration>,
    /// Customer email, used for linked-account lookup
    pub customer_email: Option<String>,
    /// URL the customer is sent back to after a redirect based payment method
    pub return_url: Option<String>,
    /// Apple Pay configuration, if Apple Pay is offered
    pub apple_pay: Option<ApplePayConfiguration>,
    /// Allow payment methods whose outcome is only known after a delay
    pub allows_delayed_payment_methods: bool,
}

impl Configuration {
    /// Load configuration from a TOML file, then apply `PAYSHEET_*` environment
    /// overrides (`PAYSHEET_CUSTOMER__ID=cus_123`)
    pub fn from_file<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let configuration: Configuration = settings.try_deserialize()?;

        tracing::debug!(
            "Loaded configuration for merchant {}",
            configuration.merchant_display_name
        );

        Ok(configuration)
    }

    /// Customer id and ephemeral key, only when both are present
    pub fn customer_credentials(&self) -> Option<(&str, &str)> {
        let customer = self.customer.as_ref()?;
        match (&customer.id, &customer.ephemeral_key_secret) {
            (Some(id), Some(ephemeral_key)) => Some((id.as_str(), ephemeral_key.as_str())),
            _ => None,
        }
    }

    /// Whether the publishable key belongs to the restricted user-key class
    pub fn uses_restricted_key(&self) -> bool {
        self.publishable_key
            .as_deref()
            .is_some_and(|key| key.starts_with(RESTRICTED_KEY_PREFIX))
    }
}
