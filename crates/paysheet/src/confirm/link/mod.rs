//! Linked-account confirmation - Type State Pattern
//!
//! Before an intent can be confirmed with a linked account, the account must own
//! a payment details record. Depending on what the customer chose, getting there
//! takes zero, one or two network calls.
//!
//! # Type State Flow
//!
//! ```text
//! LinkConfirmation<Initial>
//!   └─> prepare() -> LinkConfirmation<DetailsReady>
//!
//! ForNewAccount            ── sign_up ──┐
//! WithPaymentMethodParams  ─────────────┴─ create_payment_details ──┐
//! WithPaymentDetails       ─────────────────────────────────────────┴─> DetailsReady
//! ```
//!
//! Any failure aborts the flow; nothing is retried.

use tracing::instrument;

use self::state::{DetailsReady, Initial};
use crate::confirm::LinkConfirmOption;
use crate::link::{LinkAccount, PaymentDetails};
use crate::payment_method::PaymentMethodParams;
use crate::Error;

pub mod state;

/// Linked-account confirmation in state `S`
pub struct LinkConfirmation<S> {
    account: LinkAccount,
    state_data: S,
}

impl LinkConfirmation<Initial> {
    /// Start a linked-account confirmation for `account`
    pub fn new(account: LinkAccount, option: LinkConfirmOption) -> Self {
        Self {
            account,
            state_data: Initial { option },
        }
    }

    /// Make sure the account owns payment details for the chosen option.
    ///
    /// This:
    /// 1. Signs up the account when it is new; a sign-up failure aborts before
    ///    any payment details are created
    /// 2. Creates payment details from raw parameters when needed
    /// 3. Uses the given payment details otherwise
    #[instrument(skip_all)]
    pub async fn prepare(self) -> Result<LinkConfirmation<DetailsReady>, Error> {
        let payment_details = match self.state_data.option {
            LinkConfirmOption::ForNewAccount {
                phone_number,
                payment_method_params,
            } => {
                tracing::debug!("Signing up linked account before confirming");
                self.account.sign_up(&phone_number).await?;
                create_payment_details(&self.account, &payment_method_params).await?
            }
            LinkConfirmOption::WithPaymentMethodParams(payment_method_params) => {
                create_payment_details(&self.account, &payment_method_params).await?
            }
            LinkConfirmOption::WithPaymentDetails(payment_details) => payment_details,
        };

        Ok(LinkConfirmation {
            account: self.account,
            state_data: DetailsReady { payment_details },
        })
    }
}

impl LinkConfirmation<DetailsReady> {
    /// Account being confirmed with
    pub fn account(&self) -> &LinkAccount {
        &self.account
    }

    /// Payment details being confirmed with
    pub fn payment_details(&self) -> &PaymentDetails {
        &self.state_data.payment_details
    }

    /// Split into the account and its payment details
    pub fn into_parts(self) -> (LinkAccount, PaymentDetails) {
        (self.account, self.state_data.payment_details)
    }
}

impl std::fmt::Debug for LinkConfirmation<DetailsReady> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkConfirmation<DetailsReady>")
            .field("email", &self.account.email())
            .field("payment_details", &self.state_data.payment_details.id)
            .finish()
    }
}

async fn create_payment_details(
    account: &LinkAccount,
    params: &PaymentMethodParams,
) -> Result<PaymentDetails, Error> {
    account
        .create_payment_details(params)
        .await?
        .ok_or(Error::GenericConnection)
}
