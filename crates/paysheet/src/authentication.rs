//! Authentication context
//!
//! The context passed to every confirmation. Contexts that support linked
//! accounts expose a [`LinkPaymentDetailsSlot`]; the dispatcher writes it at
//! most once per confirmation attempt and always clears it when the attempt
//! completes, so one context must not run two confirmations at the same time.

use tokio::sync::Mutex;

use crate::link::{LinkAccount, PaymentDetails};

/// Authentication context capability object
pub trait AuthenticationContext: Send + Sync {
    /// Storage for the linked account payment details being confirmed, if this
    /// context supports linked accounts
    fn link_payment_details(&self) -> Option<&LinkPaymentDetailsSlot> {
        None
    }
}

/// The (account, payment details) pair of an in-flight linked-account confirmation
#[derive(Debug, Default)]
pub struct LinkPaymentDetailsSlot {
    inner: Mutex<Option<(LinkAccount, PaymentDetails)>>,
}

impl LinkPaymentDetailsSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `account` and `payment_details`, replacing anything stored before
    pub async fn set(&self, account: LinkAccount, payment_details: PaymentDetails) {
        *self.inner.lock().await = Some((account, payment_details));
    }

    /// Currently stored pair
    pub async fn get(&self) -> Option<(LinkAccount, PaymentDetails)> {
        self.inner.lock().await.clone()
    }

    /// Clear the slot
    pub async fn clear(&self) {
        self.inner.lock().await.take();
    }
}

/// Authentication context of a payment sheet, which supports linked accounts
#[derive(Debug, Default)]
pub struct PaymentSheetAuthenticationContext {
    link_payment_details: LinkPaymentDetailsSlot,
}

impl PaymentSheetAuthenticationContext {
    /// Create a new context
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthenticationContext for PaymentSheetAuthenticationContext {
    fn link_payment_details(&self) -> Option<&LinkPaymentDetailsSlot> {
        Some(&self.link_payment_details)
    }
}
