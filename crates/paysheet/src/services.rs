//! External collaborators
//!
//! The payment sheet core does not talk to the network itself. Everything it
//! needs from the outside world is expressed as a trait here and handed in as a
//! [`Services`] bundle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::authentication::AuthenticationContext;
use crate::config::ApplePayConfiguration;
use crate::confirm::{ConfirmationResult, PaymentIntentParams, SetupIntentConfirmParams};
use crate::error::ServiceError;
use crate::intent::{Intent, IntentClientSecret};
use crate::link::LinkAccountService;
use crate::payment_method::{Customer, PaymentMethod, PaymentMethodParams, PaymentMethodType};

/// Intent retrieval
#[async_trait]
pub trait IntentService: Send + Sync {
    /// Retrieve the intent together with the merchant's payment method preferences
    async fn retrieve_intent_with_preferences(
        &self,
        client_secret: &IntentClientSecret,
    ) -> Result<Intent, ServiceError>;

    /// Retrieve the intent without preferences
    ///
    /// `Ok(None)` means the service failed without reporting an error.
    async fn retrieve_intent(
        &self,
        client_secret: &IntentClientSecret,
    ) -> Result<Option<Intent>, ServiceError>;
}

/// Payment method creation and listing
#[async_trait]
pub trait PaymentMethodService: Send + Sync {
    /// Create a payment method from raw parameters
    ///
    /// `Ok(None)` means the service failed without reporting an error.
    async fn create_payment_method(
        &self,
        params: &PaymentMethodParams,
    ) -> Result<Option<PaymentMethod>, ServiceError>;

    /// List a customer's payment methods of the given types
    ///
    /// `Ok(None)` means the service failed without reporting an error.
    async fn list_payment_methods(
        &self,
        customer_id: &str,
        ephemeral_key: &str,
        types: &[PaymentMethodType],
    ) -> Result<Option<Vec<PaymentMethod>>, ServiceError>;
}

/// Customer retrieval
#[async_trait]
pub trait CustomerService: Send + Sync {
    /// Retrieve a customer record
    async fn retrieve_customer(
        &self,
        customer_id: &str,
        ephemeral_key: &str,
    ) -> Result<Customer, ServiceError>;
}

/// Downstream status of a confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Intent confirmed, including any required customer action
    Succeeded,
    /// Customer canceled a required action
    Canceled,
    /// Confirmation failed
    Failed,
}

/// Outcome reported by the [`PaymentHandler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Status
    pub status: ActionStatus,
    /// Error, normally present when `status` is [`ActionStatus::Failed`]
    pub error: Option<ServiceError>,
}

impl ActionOutcome {
    /// Succeeded outcome
    pub fn succeeded() -> Self {
        Self {
            status: ActionStatus::Succeeded,
            error: None,
        }
    }

    /// Canceled outcome
    pub fn canceled() -> Self {
        Self {
            status: ActionStatus::Canceled,
            error: None,
        }
    }

    /// Failed outcome
    pub fn failed(error: Option<ServiceError>) -> Self {
        Self {
            status: ActionStatus::Failed,
            error,
        }
    }
}

/// Confirms intents and handles any follow-up customer action (3DS, redirects)
#[async_trait]
pub trait PaymentHandler: Send + Sync {
    /// Confirm a payment intent
    async fn confirm_payment(
        &self,
        params: PaymentIntentParams,
        authentication_context: &dyn AuthenticationContext,
    ) -> ActionOutcome;

    /// Confirm a setup intent
    async fn confirm_setup_intent(
        &self,
        params: SetupIntentConfirmParams,
        authentication_context: &dyn AuthenticationContext,
    ) -> ActionOutcome;
}

/// A platform wallet sheet ready to be shown
#[async_trait]
pub trait WalletContext: Send {
    /// Present the wallet sheet and drive it to completion
    async fn present(self: Box<Self>) -> ConfirmationResult;
}

/// Creates [`WalletContext`]s
pub trait WalletContextFactory: Send + Sync {
    /// Create a wallet context for `intent`
    ///
    /// Returns `None` when the device does not support the wallet or there is
    /// nothing to present it from.
    fn create(
        &self,
        intent: &Intent,
        merchant_name: &str,
        configuration: &ApplePayConfiguration,
    ) -> Option<Box<dyn WalletContext>>;
}

/// Loads the shared address format specs
#[async_trait]
pub trait AddressSpecLoader: Send + Sync {
    /// Load the specs; failures are handled by the loader
    async fn load_address_specs(&self);
}

/// Collaborators used by a [`PaymentSheet`](crate::PaymentSheet)
#[derive(Clone)]
pub struct Services {
    /// Intent retrieval
    pub intents: Arc<dyn IntentService>,
    /// Payment method creation and listing
    pub payment_methods: Arc<dyn PaymentMethodService>,
    /// Customer retrieval
    pub customers: Arc<dyn CustomerService>,
    /// Confirmation
    pub payment_handler: Arc<dyn PaymentHandler>,
    /// Linked-account lookup
    pub link_accounts: Arc<dyn LinkAccountService>,
    /// Address spec loading
    pub address_specs: Arc<dyn AddressSpecLoader>,
    /// Wallet sheets, when the host platform has one
    pub wallet: Option<Arc<dyn WalletContextFactory>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("wallet", &self.wallet.is_some())
            .finish_non_exhaustive()
    }
}
