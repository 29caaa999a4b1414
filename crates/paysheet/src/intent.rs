//! Payment and setup intents

use std::fmt;

use crate::payment_method::PaymentMethodType;

/// Client secret of the intent to load, tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntentClientSecret {
    /// Client secret of a payment intent
    PaymentIntent(String),
    /// Client secret of a setup intent
    SetupIntent(String),
}

impl IntentClientSecret {
    /// The raw client secret
    pub fn secret(&self) -> &str {
        match self {
            Self::PaymentIntent(secret) | Self::SetupIntent(secret) => secret,
        }
    }

    /// `PaymentIntent` or `SetupIntent`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaymentIntent(_) => PaymentIntent::KIND,
            Self::SetupIntent(_) => SetupIntent::KIND,
        }
    }
}

/// Payment intent status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentIntentStatus {
    /// Waiting for a payment method
    RequiresPaymentMethod,
    /// Waiting for confirmation
    RequiresConfirmation,
    /// Customer action (e.g. authentication) required
    RequiresAction,
    /// Being processed
    Processing,
    /// Authorized, waiting for capture
    RequiresCapture,
    /// Canceled
    Canceled,
    /// Succeeded
    Succeeded,
}

impl PaymentIntentStatus {
    /// Whether a payment sheet can no longer act on an intent in this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled | Self::RequiresCapture)
    }
}

impl fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresPaymentMethod => write!(f, "requires_payment_method"),
            Self::RequiresConfirmation => write!(f, "requires_confirmation"),
            Self::RequiresAction => write!(f, "requires_action"),
            Self::Processing => write!(f, "processing"),
            Self::RequiresCapture => write!(f, "requires_capture"),
            Self::Canceled => write!(f, "canceled"),
            Self::Succeeded => write!(f, "succeeded"),
        }
    }
}

/// Setup intent status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupIntentStatus {
    /// Waiting for a payment method
    RequiresPaymentMethod,
    /// Waiting for confirmation
    RequiresConfirmation,
    /// Customer action (e.g. authentication) required
    RequiresAction,
    /// Being processed
    Processing,
    /// Canceled
    Canceled,
    /// Succeeded
    Succeeded,
}

impl SetupIntentStatus {
    /// Whether a payment sheet can no longer act on an intent in this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled)
    }
}

impl fmt::Display for SetupIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresPaymentMethod => write!(f, "requires_payment_method"),
            Self::RequiresConfirmation => write!(f, "requires_confirmation"),
            Self::RequiresAction => write!(f, "requires_action"),
            Self::Processing => write!(f, "processing"),
            Self::Canceled => write!(f, "canceled"),
            Self::Succeeded => write!(f, "succeeded"),
        }
    }
}

/// Payment intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Client secret
    pub client_secret: String,
    /// Status
    pub status: PaymentIntentStatus,
    /// Payment method types the sheet should offer, in display order
    pub recommended_payment_method_types: Vec<PaymentMethodType>,
    /// Types activated for test mode only
    pub unactivated_payment_method_types: Vec<PaymentMethodType>,
}

impl PaymentIntent {
    /// Kind name used in messages
    pub const KIND: &'static str = "PaymentIntent";
}

/// Setup intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupIntent {
    /// Client secret
    pub client_secret: String,
    /// Status
    pub status: SetupIntentStatus,
    /// Payment method types the sheet should offer, in display order
    pub recommended_payment_method_types: Vec<PaymentMethodType>,
    /// Types activated for test mode only
    pub unactivated_payment_method_types: Vec<PaymentMethodType>,
}

impl SetupIntent {
    /// Kind name used in messages
    pub const KIND: &'static str = "SetupIntent";
}

/// Payment or setup intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Payment intent
    PaymentIntent(PaymentIntent),
    /// Setup intent
    SetupIntent(SetupIntent),
}

impl Intent {
    /// `PaymentIntent` or `SetupIntent`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaymentIntent(_) => PaymentIntent::KIND,
            Self::SetupIntent(_) => SetupIntent::KIND,
        }
    }

    /// Client secret
    pub fn client_secret(&self) -> &str {
        match self {
            Self::PaymentIntent(intent) => &intent.client_secret,
            Self::SetupIntent(intent) => &intent.client_secret,
        }
    }

    /// Payment method types the sheet should offer
    pub fn recommended_payment_method_types(&self) -> &[PaymentMethodType] {
        match self {
            Self::PaymentIntent(intent) => &intent.recommended_payment_method_types,
            Self::SetupIntent(intent) => &intent.recommended_payment_method_types,
        }
    }

    /// Types activated for test mode but not live mode
    pub fn unactivated_payment_method_types(&self) -> &[PaymentMethodType] {
        match self {
            Self::PaymentIntent(intent) => &intent.unactivated_payment_method_types,
            Self::SetupIntent(intent) => &intent.unactivated_payment_method_types,
        }
    }

    /// Whether `payment_method_type` is recommended for this intent
    pub fn recommends(&self, payment_method_type: &PaymentMethodType) -> bool {
        self.recommended_payment_method_types()
            .contains(payment_method_type)
    }

    /// Status as a display string
    pub fn status(&self) -> String {
        match self {
            Self::PaymentIntent(intent) => intent.status.to_string(),
            Self::SetupIntent(intent) => intent.status.to_string(),
        }
    }

    /// Whether the intent is in a status the sheet can no longer act on
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::PaymentIntent(intent) => intent.status.is_terminal(),
            Self::SetupIntent(intent) => intent.status.is_terminal(),
        }
    }
}
