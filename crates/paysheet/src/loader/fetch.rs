//! The four source fetches of a load

use std::sync::Arc;

use crate::config::Configuration;
use crate::ensure_sheet;
use crate::intent::{Intent, IntentClientSecret};
use crate::link::{LinkAccount, LinkAccountService};
use crate::payment_method::{PaymentMethod, SAVED_PAYMENT_METHOD_TYPES};
use crate::services::{CustomerService, IntentService, PaymentMethodService};
use crate::Error;

/// Retrieve the intent, preferences first, falling back to a plain retrieve once.
///
/// Fails if the intent is already in a terminal status.
pub(crate) async fn fetch_intent(
    intents: Arc<dyn IntentService>,
    client_secret: IntentClientSecret,
) -> Result<Intent, Error> {
    let intent = match intents
        .retrieve_intent_with_preferences(&client_secret)
        .await
    {
        Ok(intent) => intent,
        Err(err) => {
            tracing::debug!(
                "Retrieving {} with preferences failed: {}. Falling back to plain retrieve",
                client_secret.kind(),
                err
            );

            intents
                .retrieve_intent(&client_secret)
                .await?
                .ok_or_else(|| {
                    Error::Unknown(format!("Failed to retrieve {}", client_secret.kind()))
                })?
        }
    };

    ensure_sheet!(
        !intent.is_terminal(),
        Error::TerminalIntent {
            kind: intent.kind(),
            status: intent.status(),
        }
    );

    Ok(intent)
}

/// List the customer's saved payment methods, unfiltered.
///
/// Only called when the configuration carries both customer credentials.
pub(crate) async fn fetch_saved_payment_methods(
    payment_methods: Arc<dyn PaymentMethodService>,
    customer_id: String,
    ephemeral_key: String,
) -> Result<Vec<PaymentMethod>, Error> {
    payment_methods
        .list_payment_methods(&customer_id, &ephemeral_key, SAVED_PAYMENT_METHOD_TYPES)
        .await?
        .ok_or_else(|| {
            Error::Unknown("Failed to retrieve PaymentMethods for the customer".to_string())
        })
}

/// Email to look a linked account up with
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkLookup {
    /// Look up by session cookie, or by email when one is known
    Lookup(Option<String>),
    /// Nothing to look up with
    Skip,
}

/// Look up the customer's linked account.
///
/// Precedence:
/// 1. an existing session cookie, looked up without an email
/// 2. the configured customer email, unless the customer logged out of it
/// 3. the email of the configured customer record
/// 4. no linked account
pub(crate) async fn lookup_link_account(
    link_accounts: Arc<dyn LinkAccountService>,
    customers: Arc<dyn CustomerService>,
    configuration: Configuration,
) -> Result<Option<LinkAccount>, Error> {
    let email = match link_lookup(link_accounts.as_ref(), customers.as_ref(), &configuration).await
    {
        LinkLookup::Lookup(email) => email,
        LinkLookup::Skip => return Ok(None),
    };

    Ok(link_accounts.lookup_account(email.as_deref()).await?)
}

pub(crate) async fn link_lookup(
    link_accounts: &dyn LinkAccountService,
    customers: &dyn CustomerService,
    configuration: &Configuration,
) -> LinkLookup {
    if link_accounts.has_session_cookie() {
        return LinkLookup::Lookup(None);
    }

    if let Some(email) = configuration
        .customer_email
        .as_deref()
        .filter(|email| !link_accounts.has_email_logged_out(email))
    {
        return LinkLookup::Lookup(Some(email.to_string()));
    }

    if let Some((customer_id, ephemeral_key)) = configuration.customer_credentials() {
        // A failed customer fetch only costs us the email, the load carries on
        let email = match customers
            .retrieve_customer(customer_id, ephemeral_key)
            .await
        {
            Ok(customer) => customer.email,
            Err(err) => {
                tracing::debug!("Ignoring customer retrieval failure: {}", err);
                None
            }
        };
        return LinkLookup::Lookup(email);
    }

    LinkLookup::Skip
}
