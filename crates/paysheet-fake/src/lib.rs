//! Fake payment sheet collaborators
//!
//! In-memory implementations of every collaborator trait. Each fake returns
//! whatever it was scripted with and records every call it receives, so tests
//! can assert on call order and on the exact parameters sent downstream.

#![warn(missing_docs)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use paysheet::authentication::AuthenticationContext;
use paysheet::confirm::{PaymentIntentParams, SetupIntentConfirmParams};
use paysheet::intent::{Intent, IntentClientSecret};
use paysheet::payment_method::{Customer, PaymentMethod, PaymentMethodParams, PaymentMethodType};
use paysheet::services::{
    ActionOutcome, CustomerService, IntentService, PaymentHandler, PaymentMethodService, Services,
};
use paysheet::ServiceError;

pub mod link;
pub mod wallet;

pub use self::link::{FakeLinkService, FakeLinkSession, LinkCall};
pub use self::wallet::{FakeAddressSpecLoader, FakeWalletFactory};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_scripted(call: &str) -> ServiceError {
    ServiceError::new(format!("{call} was not scripted")).with_code("fake_not_scripted")
}

/// Call received by [`FakeApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// [`IntentService::retrieve_intent_with_preferences`]
    RetrieveIntentWithPreferences(IntentClientSecret),
    /// [`IntentService::retrieve_intent`]
    RetrieveIntent(IntentClientSecret),
    /// [`PaymentMethodService::create_payment_method`]
    CreatePaymentMethod(PaymentMethodParams),
    /// [`PaymentMethodService::list_payment_methods`]
    ListPaymentMethods {
        /// Customer id
        customer_id: String,
        /// Ephemeral key
        ephemeral_key: String,
        /// Requested types
        types: Vec<PaymentMethodType>,
    },
    /// [`CustomerService::retrieve_customer`]
    RetrieveCustomer {
        /// Customer id
        customer_id: String,
        /// Ephemeral key
        ephemeral_key: String,
    },
    /// [`PaymentHandler::confirm_payment`]
    ConfirmPayment {
        /// Parameters received
        params: PaymentIntentParams,
        /// Id of the link payment details stored on the context when called
        link_payment_details: Option<String>,
    },
    /// [`PaymentHandler::confirm_setup_intent`]
    ConfirmSetupIntent {
        /// Parameters received
        params: SetupIntentConfirmParams,
        /// Id of the link payment details stored on the context when called
        link_payment_details: Option<String>,
    },
}

#[derive(Debug)]
struct Script {
    intent_with_preferences: Option<Result<Intent, ServiceError>>,
    intent: Option<Result<Option<Intent>, ServiceError>>,
    intent_delay: Option<Duration>,
    created_payment_method: Option<Result<Option<PaymentMethod>, ServiceError>>,
    payment_methods: Result<Option<Vec<PaymentMethod>>, ServiceError>,
    payment_methods_delay: Option<Duration>,
    customer: Option<Result<Customer, ServiceError>>,
    confirm_outcome: ActionOutcome,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            intent_with_preferences: None,
            intent: None,
            intent_delay: None,
            created_payment_method: None,
            payment_methods: Ok(Some(Vec::new())),
            payment_methods_delay: None,
            customer: None,
            confirm_outcome: ActionOutcome::succeeded(),
        }
    }
}

/// Fake API client: intents, payment methods, customers and confirmation
#[derive(Debug, Default)]
pub struct FakeApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<ApiCall>>,
}

impl FakeApi {
    /// Create a fake with nothing scripted
    ///
    /// Unscripted intent and customer calls fail, saved payment methods list
    /// as empty, created payment methods get the id `pm_created` and
    /// confirmations succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `retrieve_intent_with_preferences`
    pub fn set_intent_with_preferences(&self, result: Result<Intent, ServiceError>) {
        lock(&self.script).intent_with_preferences = Some(result);
    }

    /// Script `retrieve_intent`
    pub fn set_intent(&self, result: Result<Option<Intent>, ServiceError>) {
        lock(&self.script).intent = Some(result);
    }

    /// Delay both intent retrievals
    pub fn set_intent_delay(&self, delay: Duration) {
        lock(&self.script).intent_delay = Some(delay);
    }

    /// Script `create_payment_method`
    pub fn set_created_payment_method(&self, result: Result<Option<PaymentMethod>, ServiceError>) {
        lock(&self.script).created_payment_method = Some(result);
    }

    /// Script `list_payment_methods`
    pub fn set_payment_methods(&self, result: Result<Option<Vec<PaymentMethod>>, ServiceError>) {
        lock(&self.script).payment_methods = result;
    }

    /// Delay `list_payment_methods`
    pub fn set_payment_methods_delay(&self, delay: Duration) {
        lock(&self.script).payment_methods_delay = Some(delay);
    }

    /// Script `retrieve_customer`
    pub fn set_customer(&self, result: Result<Customer, ServiceError>) {
        lock(&self.script).customer = Some(result);
    }

    /// Script the outcome of both confirmation calls
    pub fn set_confirm_outcome(&self, outcome: ActionOutcome) {
        lock(&self.script).confirm_outcome = outcome;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    /// Confirmation calls received so far, in order
    pub fn confirm_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    ApiCall::ConfirmPayment { .. } | ApiCall::ConfirmSetupIntent { .. }
                )
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        tracing::trace!("Fake API call: {:?}", call);
        lock(&self.calls).push(call);
    }

    async fn intent_delay(&self) {
        let delay = lock(&self.script).intent_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

async fn link_payment_details_id(
    authentication_context: &dyn AuthenticationContext,
) -> Option<String> {
    let slot = authentication_context.link_payment_details()?;
    slot.get().await.map(|(_, details)| details.id)
}

#[async_trait]
impl IntentService for FakeApi {
    async fn retrieve_intent_with_preferences(
        &self,
        client_secret: &IntentClientSecret,
    ) -> Result<Intent, ServiceError> {
        self.record(ApiCall::RetrieveIntentWithPreferences(
            client_secret.clone(),
        ));
        self.intent_delay().await;

        let scripted = lock(&self.script).intent_with_preferences.clone();
        scripted.unwrap_or_else(|| Err(not_scripted("retrieve_intent_with_preferences")))
    }

    async fn retrieve_intent(
        &self,
        client_secret: &IntentClientSecret,
    ) -> Result<Option<Intent>, ServiceError> {
        self.record(ApiCall::RetrieveIntent(client_secret.clone()));
        self.intent_delay().await;

        let scripted = lock(&self.script).intent.clone();
        scripted.unwrap_or_else(|| Err(not_scripted("retrieve_intent")))
    }
}

#[async_trait]
impl PaymentMethodService for FakeApi {
    async fn create_payment_method(
        &self,
        params: &PaymentMethodParams,
    ) -> Result<Option<PaymentMethod>, ServiceError> {
        self.record(ApiCall::CreatePaymentMethod(params.clone()));

        let scripted = lock(&self.script).created_payment_method.clone();
        scripted.unwrap_or_else(|| {
            Ok(Some(PaymentMethod::new(
                "pm_created",
                params.payment_method_type.clone(),
            )))
        })
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        ephemeral_key: &str,
        types: &[PaymentMethodType],
    ) -> Result<Option<Vec<PaymentMethod>>, ServiceError> {
        self.record(ApiCall::ListPaymentMethods {
            customer_id: customer_id.to_string(),
            ephemeral_key: ephemeral_key.to_string(),
            types: types.to_vec(),
        });

        let (result, delay) = {
            let script = lock(&self.script);
            (script.payment_methods.clone(), script.payment_methods_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result
    }
}

#[async_trait]
impl CustomerService for FakeApi {
    async fn retrieve_customer(
        &self,
        customer_id: &str,
        ephemeral_key: &str,
    ) -> Result<Customer, ServiceError> {
        self.record(ApiCall::RetrieveCustomer {
            customer_id: customer_id.to_string(),
            ephemeral_key: ephemeral_key.to_string(),
        });

        let scripted = lock(&self.script).customer.clone();
        scripted.unwrap_or_else(|| Err(not_scripted("retrieve_customer")))
    }
}

#[async_trait]
impl PaymentHandler for FakeApi {
    async fn confirm_payment(
        &self,
        params: PaymentIntentParams,
        authentication_context: &dyn AuthenticationContext,
    ) -> ActionOutcome {
        let link_payment_details = link_payment_details_id(authentication_context).await;
        self.record(ApiCall::ConfirmPayment {
            params,
            link_payment_details,
        });

        lock(&self.script).confirm_outcome.clone()
    }

    async fn confirm_setup_intent(
        &self,
        params: SetupIntentConfirmParams,
        authentication_context: &dyn AuthenticationContext,
    ) -> ActionOutcome {
        let link_payment_details = link_payment_details_id(authentication_context).await;
        self.record(ApiCall::ConfirmSetupIntent {
            params,
            link_payment_details,
        });

        lock(&self.script).confirm_outcome.clone()
    }
}

/// Every fake, wired together into a [`Services`] bundle
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    /// API client
    pub api: Arc<FakeApi>,
    /// Linked-account lookup
    pub link: Arc<FakeLinkService>,
    /// Address spec loader
    pub address_specs: Arc<FakeAddressSpecLoader>,
    /// Wallet sheets
    pub wallet: Arc<FakeWalletFactory>,
}

impl FakeBackend {
    /// Create a backend with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Services backed by these fakes, with a wallet
    pub fn services(&self) -> Services {
        Services {
            intents: self.api.clone(),
            payment_methods: self.api.clone(),
            customers: self.api.clone(),
            payment_handler: self.api.clone(),
            link_accounts: self.link.clone(),
            address_specs: self.address_specs.clone(),
            wallet: Some(self.wallet.clone()),
        }
    }

    /// Services backed by these fakes, for a platform without a wallet
    pub fn services_without_wallet(&self) -> Services {
        Services {
            wallet: None,
            ..self.services()
        }
    }
}
