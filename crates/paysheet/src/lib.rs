//! Payment sheet core
//!
//! Two flows drive a client-side payment sheet:
//!
//! - [`PaymentSheet::load`] fetches the intent, the customer's reusable saved
//!   payment methods and their linked account concurrently, before the sheet is
//!   shown.
//! - [`PaymentSheet::confirm`] confirms the intent with whatever payment option
//!   the customer picked.
//!
//! All network access goes through the collaborator traits in [`services`].

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod authentication;
pub mod config;
pub mod confirm;
pub mod error;
pub mod intent;
pub mod link;
pub mod loader;
pub mod payment_method;
pub mod promise;
pub mod services;

#[doc(hidden)]
pub use self::authentication::{AuthenticationContext, PaymentSheetAuthenticationContext};
#[doc(hidden)]
pub use self::config::Configuration;
#[doc(hidden)]
pub use self::confirm::{ConfirmationResult, LinkConfirmOption, PaymentOption};
#[doc(hidden)]
pub use self::error::{Error, ServiceError};
#[doc(hidden)]
pub use self::intent::{Intent, IntentClientSecret};
#[doc(hidden)]
pub use self::loader::LoadResult;
#[doc(hidden)]
pub use self::promise::Promise;
#[doc(hidden)]
pub use self::services::Services;

/// Payment sheet
///
/// Holds the host configuration and the collaborators used to reach the
/// outside world. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PaymentSheet {
    configuration: Configuration,
    services: Services,
}

impl PaymentSheet {
    /// Create a new [`PaymentSheet`]
    pub fn new(configuration: Configuration, services: Services) -> Self {
        tracing::debug!(
            "Creating payment sheet for {}",
            configuration.merchant_display_name
        );

        Self {
            configuration,
            services,
        }
    }

    /// Host configuration
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Collaborators
    pub fn services(&self) -> &Services {
        &self.services
    }
}
