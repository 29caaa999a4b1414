//! Payment methods and the parameters used to create or confirm them

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Configuration;
use crate::intent::Intent;

/// Payment method types a customer's saved payment methods are listed for
pub const SAVED_PAYMENT_METHOD_TYPES: &[PaymentMethodType] = &[PaymentMethodType::Card];

/// Payment method type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaymentMethodType {
    /// Card
    Card,
    /// Link
    Link,
    /// US bank account
    UsBankAccount,
    /// SEPA Direct Debit
    SepaDebit,
    /// iDEAL
    Ideal,
    /// Bancontact
    Bancontact,
    /// Sofort
    Sofort,
    /// Klarna
    Klarna,
    /// Afterpay / Clearpay
    AfterpayClearpay,
    /// A type this crate does not know about
    Unknown(String),
}

impl PaymentMethodType {
    /// Name shown to developers and customers
    pub fn display_name(&self) -> &str {
        match self {
            Self::Card => "Card",
            Self::Link => "Link",
            Self::UsBankAccount => "US Bank Account",
            Self::SepaDebit => "SEPA Debit",
            Self::Ideal => "iDEAL",
            Self::Bancontact => "Bancontact",
            Self::Sofort => "Sofort",
            Self::Klarna => "Klarna",
            Self::AfterpayClearpay => "Afterpay Clearpay",
            Self::Unknown(name) => name,
        }
    }

    /// Whether the outcome of a payment is only known after a delay
    pub fn has_delayed_settlement(&self) -> bool {
        matches!(
            self,
            Self::UsBankAccount | Self::SepaDebit | Self::Ideal | Self::Bancontact | Self::Sofort
        )
    }

    /// Whether confirm params accept a per-type `setup_future_usage` option
    pub fn supports_setup_future_usage_option(&self) -> bool {
        matches!(self, Self::Card | Self::UsBankAccount | Self::SepaDebit)
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Whether a saved payment method of `payment_method_type` may be reused for
/// `intent` under `configuration`
///
/// Cards are always reusable. Delayed settlement types are only reusable when
/// the merchant allows delayed payment methods. Nothing else is.
pub fn supports_save_and_reuse(
    payment_method_type: &PaymentMethodType,
    configuration: &Configuration,
    _intent: &Intent,
) -> bool {
    match payment_method_type {
        PaymentMethodType::Card => true,
        t if t.has_delayed_settlement() => configuration.allows_delayed_payment_methods,
        _ => false,
    }
}

/// Payment method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethod {
    /// Payment method id
    pub id: String,
    /// Payment method type
    pub payment_method_type: PaymentMethodType,
}

impl PaymentMethod {
    /// Create a new [`PaymentMethod`]
    pub fn new<S>(id: S, payment_method_type: PaymentMethodType) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: id.into(),
            payment_method_type,
        }
    }
}

/// Raw payment method parameters collected from the customer
///
/// The fields are opaque to this crate, they are handed to the API client as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethodParams {
    /// Payment method type
    pub payment_method_type: PaymentMethodType,
    /// Type specific fields
    pub fields: BTreeMap<String, String>,
}

impl PaymentMethodParams {
    /// Parameters of `payment_method_type` without any fields
    pub fn new(payment_method_type: PaymentMethodType) -> Self {
        Self {
            payment_method_type,
            fields: BTreeMap::new(),
        }
    }

    /// Parameters that confirm with the payment details stored on a linked account
    pub fn link() -> Self {
        Self::new(PaymentMethodType::Link)
    }

    /// Add a field
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Customer record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Customer id
    pub id: String,
    /// Customer email
    pub email: Option<String>,
}
