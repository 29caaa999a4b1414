//! Confirmation dispatch
//!
//! [`PaymentSheet::confirm`] routes a (payment option, intent kind) pair to the
//! matching confirmation procedure:
//!
//! | Payment option | Intent  | Procedure |
//! |----------------|---------|-----------|
//! | `ApplePay`     | any     | hand over to the wallet sheet |
//! | `New`          | payment | create a payment method first under a restricted key, else confirm with raw params |
//! | `New`          | setup   | confirm with raw params |
//! | `Saved`        | payment | confirm by id, explicitly not saving again |
//! | `Saved`        | setup   | confirm by id |
//! | `Link`         | any     | get payment details on the account, then confirm with link params |
//!
//! Every submitted confirmation completes through one handler which clears any
//! stored link payment details and maps the downstream status to a
//! [`ConfirmationResult`]. Nothing is retried.

use tracing::instrument;
use uuid::Uuid;

use self::link::LinkConfirmation;
use crate::authentication::AuthenticationContext;
use crate::intent::Intent;
use crate::link::{LinkAccount, PaymentDetails};
use crate::payment_method::{PaymentMethod, PaymentMethodParams};
use crate::services::{ActionOutcome, ActionStatus};
use crate::{Error, PaymentSheet};

pub mod link;
mod params;

pub use params::{
    ConfirmParams, ConfirmPaymentMethodOptions, PaymentIntentParams, SetupFutureUsage,
    SetupFutureUsageOption, SetupIntentConfirmParams,
};

/// How the customer wants to pay with a linked account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkConfirmOption {
    /// Sign up a new account, then save the entered payment method to it
    ForNewAccount {
        /// Phone number to sign up with
        phone_number: String,
        /// Payment method entered by the customer
        payment_method_params: PaymentMethodParams,
    },
    /// Pay with payment details the account already owns
    WithPaymentDetails(PaymentDetails),
    /// Save the entered payment method to the account, then pay with it
    WithPaymentMethodParams(PaymentMethodParams),
}

/// Payment option chosen in the sheet
#[derive(Debug, Clone)]
pub enum PaymentOption {
    /// Apple Pay
    ApplePay,
    /// Newly entered payment method
    New(ConfirmParams),
    /// Customer's saved payment method
    Saved(PaymentMethod),
    /// Linked account
    Link {
        /// Account to pay with
        account: LinkAccount,
        /// What to pay with
        option: LinkConfirmOption,
    },
}

impl PaymentOption {
    fn name(&self) -> &'static str {
        match self {
            Self::ApplePay => "apple_pay",
            Self::New(_) => "new",
            Self::Saved(_) => "saved",
            Self::Link { .. } => "link",
        }
    }
}

/// Result of a confirmation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// Intent confirmed
    Completed,
    /// Customer canceled
    Canceled,
    /// Confirmation failed
    Failed(Error),
}

impl ConfirmationResult {
    /// Error of a failed confirmation
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl PaymentSheet {
    /// Confirm `intent` with `payment_option`.
    ///
    /// Runs any setup the option needs (creating a payment method or link
    /// payment details), then submits exactly one confirmation. At most one
    /// confirmation may be in flight per `authentication_context`.
    #[instrument(
        skip_all,
        fields(
            attempt_id = %Uuid::new_v4(),
            intent = intent.kind(),
            option = payment_option.name()
        )
    )]
    pub async fn confirm(
        &self,
        authentication_context: &dyn AuthenticationContext,
        intent: &Intent,
        payment_option: PaymentOption,
    ) -> ConfirmationResult {
        match payment_option {
            PaymentOption::ApplePay => self.confirm_apple_pay(intent).await,
            PaymentOption::New(confirm_params) => {
                self.confirm_new(authentication_context, intent, confirm_params)
                    .await
            }
            PaymentOption::Saved(payment_method) => {
                self.confirm_saved(authentication_context, intent, payment_method)
                    .await
            }
            PaymentOption::Link { account, option } => {
                self.confirm_link(authentication_context, intent, account, option)
                    .await
            }
        }
    }

    async fn confirm_apple_pay(&self, intent: &Intent) -> ConfirmationResult {
        let wallet_context = match (&self.configuration.apple_pay, &self.services.wallet) {
            (Some(apple_pay), Some(factory)) => factory.create(
                intent,
                &self.configuration.merchant_display_name,
                apple_pay,
            ),
            _ => None,
        };

        match wallet_context {
            Some(wallet_context) => wallet_context.present().await,
            None => precondition_failed(
                "Attempted Apple Pay but it's not supported by the device, not configured, or missing a presenter",
            ),
        }
    }

    async fn confirm_new(
        &self,
        authentication_context: &dyn AuthenticationContext,
        intent: &Intent,
        confirm_params: ConfirmParams,
    ) -> ConfirmationResult {
        match intent {
            Intent::PaymentIntent(payment_intent) => {
                let params = if self.configuration.uses_restricted_key() {
                    // Restricted keys cannot send raw payment method data on confirm
                    let payment_method = match self
                        .services
                        .payment_methods
                        .create_payment_method(&confirm_params.payment_method_params)
                        .await
                    {
                        Ok(Some(payment_method)) => payment_method,
                        Ok(None) => {
                            return ConfirmationResult::Failed(Error::Unknown(
                                "Failed to create a payment method".to_string(),
                            ))
                        }
                        Err(err) => return ConfirmationResult::Failed(err.into()),
                    };

                    confirm_params
                        .make_dashboard_params(&payment_intent.client_secret, &payment_method.id)
                } else {
                    let mut params =
                        confirm_params.make_payment_intent_params(&payment_intent.client_secret);
                    params.return_url = self.configuration.return_url.clone();
                    params
                };

                self.confirm_payment_intent(authentication_context, params)
                    .await
            }
            Intent::SetupIntent(setup_intent) => {
                let mut params =
                    confirm_params.make_setup_intent_params(&setup_intent.client_secret);
                params.return_url = self.configuration.return_url.clone();

                self.confirm_setup_intent(authentication_context, params)
                    .await
            }
        }
    }

    async fn confirm_saved(
        &self,
        authentication_context: &dyn AuthenticationContext,
        intent: &Intent,
        payment_method: PaymentMethod,
    ) -> ConfirmationResult {
        match intent {
            Intent::PaymentIntent(payment_intent) => {
                let mut params = PaymentIntentParams::new(payment_intent.client_secret.clone());
                params.return_url = self.configuration.return_url.clone();
                params.payment_method_id = Some(payment_method.id);

                // Overwrite any earlier options, an already saved payment method
                // must not be saved again
                let mut options = ConfirmPaymentMethodOptions::default();
                options.set_setup_future_usage_if_necessary(
                    false,
                    payment_method.payment_method_type,
                );
                params.payment_method_options = Some(options);

                self.confirm_payment_intent(authentication_context, params)
                    .await
            }
            Intent::SetupIntent(setup_intent) => {
                let mut params = SetupIntentConfirmParams::new(setup_intent.client_secret.clone());
                params.return_url = self.configuration.return_url.clone();
                params.payment_method_id = Some(payment_method.id);

                self.confirm_setup_intent(authentication_context, params)
                    .await
            }
        }
    }

    async fn confirm_link(
        &self,
        authentication_context: &dyn AuthenticationContext,
        intent: &Intent,
        account: LinkAccount,
        option: LinkConfirmOption,
    ) -> ConfirmationResult {
        let prepared = match LinkConfirmation::new(account, option).prepare().await {
            Ok(prepared) => prepared,
            Err(err) => return ConfirmationResult::Failed(err),
        };

        let Some(slot) = authentication_context.link_payment_details() else {
            return precondition_failed(
                "Link is only available if the authentication context supports link payment details",
            );
        };

        let (account, payment_details) = prepared.into_parts();
        slot.set(account, payment_details).await;

        match intent {
            Intent::PaymentIntent(payment_intent) => {
                let mut params = PaymentIntentParams::new(payment_intent.client_secret.clone());
                params.payment_method_params = Some(PaymentMethodParams::link());
                params.return_url = self.configuration.return_url.clone();

                self.confirm_payment_intent(authentication_context, params)
                    .await
            }
            Intent::SetupIntent(setup_intent) => {
                let mut params = SetupIntentConfirmParams::new(setup_intent.client_secret.clone());
                params.payment_method_params = Some(PaymentMethodParams::link());
                params.return_url = self.configuration.return_url.clone();

                self.confirm_setup_intent(authentication_context, params)
                    .await
            }
        }
    }

    async fn confirm_payment_intent(
        &self,
        authentication_context: &dyn AuthenticationContext,
        params: PaymentIntentParams,
    ) -> ConfirmationResult {
        tracing::debug!("Submitting payment intent confirmation");
        let outcome = self
            .services
            .payment_handler
            .confirm_payment(params, authentication_context)
            .await;

        complete(authentication_context, outcome).await
    }

    async fn confirm_setup_intent(
        &self,
        authentication_context: &dyn AuthenticationContext,
        params: SetupIntentConfirmParams,
    ) -> ConfirmationResult {
        tracing::debug!("Submitting setup intent confirmation");
        let outcome = self
            .services
            .payment_handler
            .confirm_setup_intent(params, authentication_context)
            .await;

        complete(authentication_context, outcome).await
    }
}

/// Shared completion of every submitted confirmation
async fn complete(
    authentication_context: &dyn AuthenticationContext,
    outcome: ActionOutcome,
) -> ConfirmationResult {
    if let Some(slot) = authentication_context.link_payment_details() {
        slot.clear().await;
    }

    match outcome.status {
        ActionStatus::Canceled => {
            tracing::info!("Confirmation canceled");
            ConfirmationResult::Canceled
        }
        ActionStatus::Failed => {
            let err = outcome.error.map(Error::from).unwrap_or_else(|| {
                Error::Unknown("Payment handler failed without an error".to_string())
            });
            tracing::warn!("Confirmation failed: {}", err);
            ConfirmationResult::Failed(err)
        }
        ActionStatus::Succeeded => {
            tracing::info!("Confirmation succeeded");
            ConfirmationResult::Completed
        }
    }
}

/// Host misconfiguration: log loudly and fail the attempt
///
/// With the `strict-preconditions` feature this panics instead, so a
/// misconfigured host fails in development.
fn precondition_failed(message: &str) -> ConfirmationResult {
    tracing::error!("{}", message);
    if cfg!(feature = "strict-preconditions") {
        panic!("Precondition failed: {message}");
    }
    ConfirmationResult::Failed(Error::Precondition(message.to_string()))
}
