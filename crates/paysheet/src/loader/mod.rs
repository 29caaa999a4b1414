//! Preload orchestration
//!
//! Before the sheet can be shown, four independent pieces of state are fetched
//! at the same time:
//!
//! 1. the intent (preferences first, plain retrieve as a one-off fallback)
//! 2. the customer's saved payment methods
//! 3. the shared address specs
//! 4. the customer's linked account
//!
//! Each fetch settles its own [`Promise`]. The results are then consumed in that
//! order; the first failure met ends the load and later promises are simply
//! never looked at again. Nothing is canceled.

use tracing::instrument;

use self::fetch::{fetch_intent, fetch_saved_payment_methods, lookup_link_account};
use crate::intent::{Intent, IntentClientSecret};
use crate::link::LinkAccount;
use crate::payment_method::{supports_save_and_reuse, PaymentMethod, PaymentMethodType};
use crate::promise::Promise;
use crate::{Error, PaymentSheet};

mod fetch;

/// Everything the sheet needs to be shown
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// The intent being paid or set up
    pub intent: Intent,
    /// Saved payment methods the customer may reuse for this intent
    pub saved_payment_methods: Vec<PaymentMethod>,
    /// The customer's linked account, if linked accounts are offered for this intent
    pub link_account: Option<LinkAccount>,
}

impl PaymentSheet {
    /// Fetch the intent, saved payment methods and linked account for
    /// `client_secret`.
    ///
    /// All fetches start before any result is consumed. Must be called from
    /// within a tokio runtime.
    #[instrument(skip_all, fields(intent = client_secret.kind()))]
    pub async fn load(&self, client_secret: IntentClientSecret) -> Result<LoadResult, Error> {
        let intent_promise = Promise::spawn(fetch_intent(
            self.services.intents.clone(),
            client_secret,
        ));

        let payment_methods_promise = match self.configuration.customer_credentials() {
            Some((customer_id, ephemeral_key)) => Promise::spawn(fetch_saved_payment_methods(
                self.services.payment_methods.clone(),
                customer_id.to_string(),
                ephemeral_key.to_string(),
            )),
            None => Promise::resolved(Vec::new()),
        };

        let address_specs = self.services.address_specs.clone();
        let address_specs_promise = Promise::spawn(async move {
            address_specs.load_address_specs().await;
            Ok(())
        });

        let link_account_promise = Promise::spawn(lookup_link_account(
            self.services.link_accounts.clone(),
            self.services.customers.clone(),
            self.configuration.clone(),
        ));

        let intent = intent_promise.value().await?;
        let payment_methods = payment_methods_promise.value().await?;

        let saved_payment_methods: Vec<PaymentMethod> = payment_methods
            .into_iter()
            .filter(|payment_method| intent.recommends(&payment_method.payment_method_type))
            .filter(|payment_method| {
                supports_save_and_reuse(
                    &payment_method.payment_method_type,
                    &self.configuration,
                    &intent,
                )
            })
            .collect();
        warn_unactivated_if_needed(intent.unactivated_payment_method_types());

        // Never fails; only the ordering matters
        address_specs_promise.value().await?;

        let link_account = link_account_promise.value().await?;
        let link_account = link_account.filter(|_| intent.recommends(&PaymentMethodType::Link));

        tracing::debug!(
            "Loaded {} with {} saved payment methods, linked account: {}",
            intent.kind(),
            saved_payment_methods.len(),
            link_account.is_some()
        );

        Ok(LoadResult {
            intent,
            saved_payment_methods,
            link_account,
        })
    }
}

fn warn_unactivated_if_needed(unactivated_payment_method_types: &[PaymentMethodType]) {
    if unactivated_payment_method_types.is_empty() {
        return;
    }

    let names = unactivated_payment_method_types
        .iter()
        .map(PaymentMethodType::display_name)
        .collect::<Vec<_>>()
        .join(",");

    tracing::warn!(
        "Your intent contains the following payment method types which are activated for test mode but not activated for live mode: {}. \
         These payment method types will not be displayed in live mode until they are activated. \
         More information: https://support.stripe.com/questions/activate-a-new-payment-method",
        names
    );
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::fetch::{link_lookup, LinkLookup};
    use crate::config::{Configuration, CustomerConfiguration};
    use crate::error::ServiceError;
    use crate::link::LinkAccountService;
    use crate::payment_method::Customer;
    use crate::services::CustomerService;

    struct Links {
        cookie: bool,
        logged_out: Vec<String>,
    }

    #[async_trait]
    impl LinkAccountService for Links {
        fn has_session_cookie(&self) -> bool {
            self.cookie
        }

        fn has_email_logged_out(&self, email: &str) -> bool {
            self.logged_out.iter().any(|e| e == email)
        }

        async fn lookup_account(
            &self,
            _email: Option<&str>,
        ) -> Result<Option<crate::link::LinkAccount>, ServiceError> {
            Ok(None)
        }
    }

    struct Customers(Result<Customer, ServiceError>);

    #[async_trait]
    impl CustomerService for Customers {
        async fn retrieve_customer(
            &self,
            _customer_id: &str,
            _ephemeral_key: &str,
        ) -> Result<Customer, ServiceError> {
            self.0.clone()
        }
    }

    fn customer(email: Option<&str>) -> Customers {
        Customers(Ok(Customer {
            id: "cus_1".to_string(),
            email: email.map(str::to_string),
        }))
    }

    fn configuration(email: Option<&str>, with_customer: bool) -> Configuration {
        Configuration {
            customer_email: email.map(str::to_string),
            customer: with_customer.then(|| CustomerConfiguration {
                id: Some("cus_1".to_string()),
                ephemeral_key_secret: Some("ek_1".to_string()),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cookie_wins() {
        let links = Links {
            cookie: true,
            logged_out: vec![],
        };
        let lookup = link_lookup(
            &links,
            &customer(Some("record@example.com")),
            &configuration(Some("config@example.com"), true),
        )
        .await;
        assert_eq!(lookup, LinkLookup::Lookup(None));
    }

    #[tokio::test]
    async fn test_configured_email_used() {
        let links = Links {
            cookie: false,
            logged_out: vec![],
        };
        let lookup = link_lookup(
            &links,
            &customer(Some("record@example.com")),
            &configuration(Some("config@example.com"), true),
        )
        .await;
        assert_eq!(
            lookup,
            LinkLookup::Lookup(Some("config@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_logged_out_email_falls_back_to_customer_record() {
        let links = Links {
            cookie: false,
            logged_out: vec!["config@example.com".to_string()],
        };
        let lookup = link_lookup(
            &links,
            &customer(Some("record@example.com")),
            &configuration(Some("config@example.com"), true),
        )
        .await;
        assert_eq!(
            lookup,
            LinkLookup::Lookup(Some("record@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_customer_failure_is_ignored() {
        let links = Links {
            cookie: false,
            logged_out: vec![],
        };
        let lookup = link_lookup(
            &links,
            &Customers(Err(ServiceError::new("no such customer"))),
            &configuration(None, true),
        )
        .await;
        assert_eq!(lookup, LinkLookup::Lookup(None));
    }

    #[tokio::test]
    async fn test_nothing_to_look_up_with() {
        let links = Links {
            cookie: false,
            logged_out: vec![],
        };
        let lookup = link_lookup(&links, &customer(None), &configuration(None, false)).await;
        assert_eq!(lookup, LinkLookup::Skip);
    }
}
