//! Linked accounts
//!
//! A [`LinkAccount`] is created by the preload lookup and only read by the
//! confirmation dispatcher. Its network behaviour lives behind [`LinkSession`].

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::payment_method::{PaymentMethodParams, PaymentMethodType};

/// Session state of a linked account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAccountSessionState {
    /// No account exists for the email yet
    RequiresSignUp,
    /// Account exists but the session is not verified
    RequiresVerification,
    /// Authenticated session
    Verified,
}

/// Payment details record owned by a linked account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Payment details id
    pub id: String,
    /// Kind of payment method the details describe
    pub payment_method_type: PaymentMethodType,
}

/// Network operations of one linked-account session
#[async_trait]
pub trait LinkSession: Debug + Send + Sync {
    /// Sign up a new account with `phone_number`
    async fn sign_up(&self, phone_number: &str) -> Result<(), ServiceError>;

    /// Create a payment details record from raw payment method parameters
    ///
    /// `Ok(None)` means the service failed without reporting an error.
    async fn create_payment_details(
        &self,
        params: &PaymentMethodParams,
    ) -> Result<Option<PaymentDetails>, ServiceError>;
}

/// Linked account session handle
#[derive(Debug, Clone)]
pub struct LinkAccount {
    email: Option<String>,
    session_state: LinkAccountSessionState,
    session: Arc<dyn LinkSession>,
}

impl LinkAccount {
    /// Create a new [`LinkAccount`]
    pub fn new(
        email: Option<String>,
        session_state: LinkAccountSessionState,
        session: Arc<dyn LinkSession>,
    ) -> Self {
        Self {
            email,
            session_state,
            session,
        }
    }

    /// Account email, if known
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Session state
    pub fn session_state(&self) -> LinkAccountSessionState {
        self.session_state
    }

    /// Whether the session is authenticated
    pub fn is_verified(&self) -> bool {
        self.session_state == LinkAccountSessionState::Verified
    }

    /// Sign up with `phone_number`
    pub async fn sign_up(&self, phone_number: &str) -> Result<(), ServiceError> {
        self.session.sign_up(phone_number).await
    }

    /// Create payment details from `params`
    pub async fn create_payment_details(
        &self,
        params: &PaymentMethodParams,
    ) -> Result<Option<PaymentDetails>, ServiceError> {
        self.session.create_payment_details(params).await
    }
}

impl PartialEq for LinkAccount {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
            && self.session_state == other.session_state
            && Arc::ptr_eq(&self.session, &other.session)
    }
}

/// Linked account lookup service
#[async_trait]
pub trait LinkAccountService: Send + Sync {
    /// Whether a linked-account session cookie is already stored
    fn has_session_cookie(&self) -> bool;

    /// Whether the customer logged out of the linked account for `email` on this device
    fn has_email_logged_out(&self, email: &str) -> bool;

    /// Look up an account, by `email` or by the stored session cookie when `None`
    async fn lookup_account(&self, email: Option<&str>) -> Result<Option<LinkAccount>, ServiceError>;
}
