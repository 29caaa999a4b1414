//! Fake linked-account collaborators

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use paysheet::link::{
    LinkAccount, LinkAccountService, LinkAccountSessionState, LinkSession, PaymentDetails,
};
use paysheet::payment_method::PaymentMethodParams;
use paysheet::ServiceError;

use crate::lock;

/// Call received by [`FakeLinkSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCall {
    /// Sign up with a phone number
    SignUp(String),
    /// Create payment details
    CreatePaymentDetails(PaymentMethodParams),
}

#[derive(Debug)]
struct SessionScript {
    sign_up: Result<(), ServiceError>,
    payment_details: Result<Option<PaymentDetails>, ServiceError>,
}

impl Default for SessionScript {
    fn default() -> Self {
        Self {
            sign_up: Ok(()),
            payment_details: Ok(None),
        }
    }
}

/// Fake linked-account session
///
/// Sign up succeeds and payment details creation fails without an error until
/// scripted otherwise.
#[derive(Debug, Default)]
pub struct FakeLinkSession {
    script: Mutex<SessionScript>,
    calls: Mutex<Vec<LinkCall>>,
}

impl FakeLinkSession {
    /// Create a new session
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `sign_up`
    pub fn set_sign_up(&self, result: Result<(), ServiceError>) {
        lock(&self.script).sign_up = result;
    }

    /// Script `create_payment_details`
    pub fn set_payment_details(&self, result: Result<Option<PaymentDetails>, ServiceError>) {
        lock(&self.script).payment_details = result;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<LinkCall> {
        lock(&self.calls).clone()
    }

    /// Wrap this session in an account
    pub fn account(
        self: &Arc<Self>,
        email: Option<&str>,
        session_state: LinkAccountSessionState,
    ) -> LinkAccount {
        LinkAccount::new(email.map(str::to_string), session_state, self.clone())
    }
}

#[async_trait]
impl LinkSession for FakeLinkSession {
    async fn sign_up(&self, phone_number: &str) -> Result<(), ServiceError> {
        lock(&self.calls).push(LinkCall::SignUp(phone_number.to_string()));
        lock(&self.script).sign_up.clone()
    }

    async fn create_payment_details(
        &self,
        params: &PaymentMethodParams,
    ) -> Result<Option<PaymentDetails>, ServiceError> {
        lock(&self.calls).push(LinkCall::CreatePaymentDetails(params.clone()));
        lock(&self.script).payment_details.clone()
    }
}

#[derive(Debug)]
struct ServiceScript {
    session_cookie: bool,
    logged_out: HashSet<String>,
    account: Result<Option<LinkAccount>, ServiceError>,
    delay: Option<Duration>,
}

impl Default for ServiceScript {
    fn default() -> Self {
        Self {
            session_cookie: false,
            logged_out: HashSet::new(),
            account: Ok(None),
            delay: None,
        }
    }
}

/// Fake linked-account lookup
///
/// Without scripting there is no session cookie, no email is logged out and
/// every lookup finds no account.
#[derive(Debug, Default)]
pub struct FakeLinkService {
    script: Mutex<ServiceScript>,
    lookups: Mutex<Vec<Option<String>>>,
}

impl FakeLinkService {
    /// Create a new lookup service
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a session cookie is stored
    pub fn set_session_cookie(&self, session_cookie: bool) {
        lock(&self.script).session_cookie = session_cookie;
    }

    /// Pretend the customer logged out of `email`
    pub fn log_out(&self, email: &str) {
        lock(&self.script).logged_out.insert(email.to_string());
    }

    /// Script `lookup_account`
    pub fn set_account(&self, result: Result<Option<LinkAccount>, ServiceError>) {
        lock(&self.script).account = result;
    }

    /// Delay `lookup_account`
    pub fn set_delay(&self, delay: Duration) {
        lock(&self.script).delay = Some(delay);
    }

    /// Email of every lookup so far, `None` for cookie lookups
    pub fn lookups(&self) -> Vec<Option<String>> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl LinkAccountService for FakeLinkService {
    fn has_session_cookie(&self) -> bool {
        lock(&self.script).session_cookie
    }

    fn has_email_logged_out(&self, email: &str) -> bool {
        lock(&self.script).logged_out.contains(email)
    }

    async fn lookup_account(&self, email: Option<&str>) -> Result<Option<LinkAccount>, ServiceError> {
        lock(&self.lookups).push(email.map(str::to_string));

        let (result, delay) = {
            let script = lock(&self.script);
            (script.account.clone(), script.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result
    }
}
