//! State types for a linked-account confirmation.
//!
//! Each state is a distinct type holding the data relevant to that stage. A
//! confirmation can only be submitted from [`DetailsReady`].

use crate::confirm::LinkConfirmOption;
use crate::link::PaymentDetails;

/// Initial state - the customer's choice, nothing done yet.
///
/// Only `prepare()` is available.
pub struct Initial {
    /// How the customer wants to pay with the linked account
    pub option: LinkConfirmOption,
}

/// Payment details exist on the linked account and can be confirmed with.
pub struct DetailsReady {
    /// Payment details to confirm with
    pub payment_details: PaymentDetails,
}
