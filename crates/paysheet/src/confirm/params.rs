//! Confirmation request parameters

use crate::payment_method::{PaymentMethodParams, PaymentMethodType};

/// Whether a payment method should be saved to the customer after confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFutureUsage {
    /// Save for payments the customer is present for
    OnSession,
    /// Save for payments without the customer present
    OffSession,
}

/// Explicit per-type save choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFutureUsageOption {
    /// Payment method type the choice applies to
    pub payment_method_type: PaymentMethodType,
    /// `false` clears any save-for-future-use choice made earlier
    pub save: bool,
}

/// Payment method options sent with a payment intent confirmation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmPaymentMethodOptions {
    /// Per-type save choice
    pub setup_future_usage: Option<SetupFutureUsageOption>,
}

impl ConfirmPaymentMethodOptions {
    /// Record an explicit save choice for `payment_method_type`, if that type
    /// accepts one
    pub fn set_setup_future_usage_if_necessary(
        &mut self,
        save: bool,
        payment_method_type: PaymentMethodType,
    ) {
        if payment_method_type.supports_setup_future_usage_option() {
            self.setup_future_usage = Some(SetupFutureUsageOption {
                payment_method_type,
                save,
            });
        }
    }
}

/// Payment intent confirmation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentParams {
    /// Client secret of the payment intent
    pub client_secret: String,
    /// Existing payment method to confirm with
    pub payment_method_id: Option<String>,
    /// Raw payment method parameters to confirm with
    pub payment_method_params: Option<PaymentMethodParams>,
    /// Where to send the customer after a redirect
    pub return_url: Option<String>,
    /// Save the payment method after confirmation
    pub setup_future_usage: Option<SetupFutureUsage>,
    /// Payment method options
    pub payment_method_options: Option<ConfirmPaymentMethodOptions>,
}

impl PaymentIntentParams {
    /// Parameters for `client_secret` with nothing else set
    pub fn new<S>(client_secret: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            client_secret: client_secret.into(),
            payment_method_id: None,
            payment_method_params: None,
            return_url: None,
            setup_future_usage: None,
            payment_method_options: None,
        }
    }
}

/// Setup intent confirmation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupIntentConfirmParams {
    /// Client secret of the setup intent
    pub client_secret: String,
    /// Existing payment method to confirm with
    pub payment_method_id: Option<String>,
    /// Raw payment method parameters to confirm with
    pub payment_method_params: Option<PaymentMethodParams>,
    /// Where to send the customer after a redirect
    pub return_url: Option<String>,
}

impl SetupIntentConfirmParams {
    /// Parameters for `client_secret` with nothing else set
    pub fn new<S>(client_secret: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            client_secret: client_secret.into(),
            payment_method_id: None,
            payment_method_params: None,
            return_url: None,
        }
    }
}

/// Payload of a new payment method entered in the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmParams {
    /// Raw payment method parameters
    pub payment_method_params: PaymentMethodParams,
    /// Customer asked to save the payment method
    pub save_for_future_use: bool,
}

impl ConfirmParams {
    /// Create new [`ConfirmParams`]
    pub fn new(payment_method_params: PaymentMethodParams, save_for_future_use: bool) -> Self {
        Self {
            payment_method_params,
            save_for_future_use,
        }
    }

    fn setup_future_usage(&self) -> Option<SetupFutureUsage> {
        self.save_for_future_use
            .then_some(SetupFutureUsage::OffSession)
    }

    /// Payment intent parameters confirming with the raw payment method parameters
    pub fn make_payment_intent_params(&self, client_secret: &str) -> PaymentIntentParams {
        PaymentIntentParams {
            payment_method_params: Some(self.payment_method_params.clone()),
            setup_future_usage: self.setup_future_usage(),
            ..PaymentIntentParams::new(client_secret)
        }
    }

    /// Payment intent parameters confirming with an already created payment
    /// method, for keys that cannot send raw payment method parameters
    pub fn make_dashboard_params(
        &self,
        client_secret: &str,
        payment_method_id: &str,
    ) -> PaymentIntentParams {
        PaymentIntentParams {
            payment_method_id: Some(payment_method_id.to_string()),
            setup_future_usage: self.setup_future_usage(),
            ..PaymentIntentParams::new(client_secret)
        }
    }

    /// Setup intent parameters confirming with the raw payment method parameters
    pub fn make_setup_intent_params(&self, client_secret: &str) -> SetupIntentConfirmParams {
        SetupIntentConfirmParams {
            payment_method_params: Some(self.payment_method_params.clone()),
            ..SetupIntentConfirmParams::new(client_secret)
        }
    }
}
