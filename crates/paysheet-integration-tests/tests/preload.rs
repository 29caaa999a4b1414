//! Preload Integration Tests
//!
//! These tests drive `PaymentSheet::load` against the fake backend:
//! - Intent fetch fallback and the terminal status check
//! - Saved payment method listing and filtering
//! - Linked-account lookup precedence and gating
//! - First-failure-wins join order

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use paysheet::intent::{IntentClientSecret, PaymentIntentStatus, SetupIntentStatus};
use paysheet::link::LinkAccountSessionState;
use paysheet::payment_method::{Customer, PaymentMethod, PaymentMethodType};
use paysheet::{Error, ServiceError};
use paysheet_fake::{ApiCall, FakeLinkSession};
use paysheet_integration_tests::init_pure_tests::*;

fn payment_intent_secret() -> IntentClientSecret {
    IntentClientSecret::PaymentIntent(PAYMENT_INTENT_SECRET.to_string())
}

fn setup_intent_secret() -> IntentClientSecret {
    IntentClientSecret::SetupIntent(SETUP_INTENT_SECRET.to_string())
}

// =============================================================================
// Intent fetch
// =============================================================================

/// Tests that a failed preferences fetch falls back to the plain fetch exactly once
#[tokio::test]
async fn test_preferences_failure_falls_back_to_plain_fetch() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());

    backend
        .api
        .set_intent_with_preferences(Err(ServiceError::new("preferences unavailable")));
    backend.api.set_intent(Ok(Some(open_payment_intent())));
    backend.api.set_payment_methods(Ok(Some(vec![PaymentMethod::new(
        "pm_1",
        PaymentMethodType::Card,
    )])));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert_eq!(loaded.intent, open_payment_intent());
    assert_eq!(
        loaded.saved_payment_methods,
        vec![PaymentMethod::new("pm_1", PaymentMethodType::Card)]
    );

    let calls = backend.api.calls();
    assert!(calls.contains(&ApiCall::RetrieveIntentWithPreferences(
        payment_intent_secret()
    )));
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, ApiCall::RetrieveIntent(_)))
            .count(),
        1
    );

    Ok(())
}

/// Tests that the plain fetch error is surfaced when both fetches fail
#[tokio::test]
async fn test_fallback_failure_surfaces_plain_fetch_error() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(base_configuration());

    backend
        .api
        .set_intent_with_preferences(Err(ServiceError::new("preferences unavailable")));
    backend
        .api
        .set_intent(Err(ServiceError::new("no such intent").with_code("resource_missing")));

    let err = sheet.load(payment_intent_secret()).await.unwrap_err();

    assert_eq!(
        err,
        Error::Service(ServiceError::new("no such intent").with_code("resource_missing"))
    );

    Ok(())
}

/// Tests that a plain fetch failing without an error gets a generic one
#[tokio::test]
async fn test_fallback_without_error_is_generic_failure() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(base_configuration());

    backend
        .api
        .set_intent_with_preferences(Err(ServiceError::new("preferences unavailable")));
    backend.api.set_intent(Ok(None));

    let err = sheet.load(setup_intent_secret()).await.unwrap_err();

    assert_eq!(err, Error::Unknown("Failed to retrieve SetupIntent".to_string()));

    Ok(())
}

/// Tests that every terminal payment intent status fails the load
#[tokio::test]
async fn test_terminal_payment_intents_rejected() -> Result<()> {
    setup_tracing();

    for status in [
        PaymentIntentStatus::Succeeded,
        PaymentIntentStatus::Canceled,
        PaymentIntentStatus::RequiresCapture,
    ] {
        let (sheet, backend) = create_test_sheet(base_configuration());
        backend.api.set_intent_with_preferences(Ok(payment_intent(
            status,
            vec![PaymentMethodType::Card],
        )));

        let err = sheet.load(payment_intent_secret()).await.unwrap_err();

        assert_eq!(
            err,
            Error::TerminalIntent {
                kind: "PaymentIntent",
                status: status.to_string(),
            }
        );
    }

    Ok(())
}

/// Tests that terminal setup intents fail the load
#[tokio::test]
async fn test_terminal_setup_intents_rejected() -> Result<()> {
    setup_tracing();

    for status in [SetupIntentStatus::Succeeded, SetupIntentStatus::Canceled] {
        let (sheet, backend) = create_test_sheet(base_configuration());
        backend
            .api
            .set_intent_with_preferences(Ok(setup_intent(status, vec![PaymentMethodType::Card])));

        let err = sheet.load(setup_intent_secret()).await.unwrap_err();

        assert!(matches!(err, Error::TerminalIntent { kind: "SetupIntent", .. }));
    }

    Ok(())
}

/// Tests that non-terminal statuses load
#[tokio::test]
async fn test_processing_intent_loads() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(base_configuration());
    backend.api.set_intent_with_preferences(Ok(payment_intent(
        PaymentIntentStatus::Processing,
        vec![PaymentMethodType::Card],
    )));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert!(!loaded.intent.is_terminal());
    assert_eq!(backend.address_specs.loads(), 1);

    Ok(())
}

// =============================================================================
// Saved payment methods
// =============================================================================

/// Tests that missing customer credentials mean no listing and an empty result
#[tokio::test]
async fn test_missing_credentials_yield_empty_list() -> Result<()> {
    setup_tracing();
    let mut configuration = customer_configuration();
    if let Some(customer) = configuration.customer.as_mut() {
        customer.ephemeral_key_secret = None;
    }
    let (sheet, backend) = create_test_sheet(configuration);
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert!(loaded.saved_payment_methods.is_empty());
    assert!(!backend
        .api
        .calls()
        .iter()
        .any(|call| matches!(call, ApiCall::ListPaymentMethods { .. })));

    Ok(())
}

/// Tests that listing asks for card only, with the configured credentials
#[tokio::test]
async fn test_listing_uses_credentials_and_allow_list() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));

    sheet.load(payment_intent_secret()).await?;

    assert!(backend.api.calls().contains(&ApiCall::ListPaymentMethods {
        customer_id: CUSTOMER_ID.to_string(),
        ephemeral_key: EPHEMERAL_KEY.to_string(),
        types: vec![PaymentMethodType::Card],
    }));

    Ok(())
}

/// Tests that saved payment methods are filtered by recommendation and reuse eligibility
#[tokio::test]
async fn test_saved_methods_filtered() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());
    backend.api.set_intent_with_preferences(Ok(payment_intent(
        PaymentIntentStatus::RequiresPaymentMethod,
        vec![
            PaymentMethodType::Card,
            PaymentMethodType::SepaDebit,
            PaymentMethodType::Klarna,
        ],
    )));
    backend.api.set_payment_methods(Ok(Some(vec![
        PaymentMethod::new("pm_card", PaymentMethodType::Card),
        // Not recommended
        PaymentMethod::new("pm_bank", PaymentMethodType::UsBankAccount),
        // Delayed settlement without the configuration allowing it
        PaymentMethod::new("pm_sepa", PaymentMethodType::SepaDebit),
        // Never reusable
        PaymentMethod::new("pm_klarna", PaymentMethodType::Klarna),
    ])));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert_eq!(
        loaded.saved_payment_methods,
        vec![PaymentMethod::new("pm_card", PaymentMethodType::Card)]
    );

    Ok(())
}

/// Tests that allowing delayed payment methods keeps delayed settlement types
#[tokio::test]
async fn test_delayed_methods_kept_when_allowed() -> Result<()> {
    setup_tracing();
    let mut configuration = customer_configuration();
    configuration.allows_delayed_payment_methods = true;
    let (sheet, backend) = create_test_sheet(configuration);
    backend.api.set_intent_with_preferences(Ok(payment_intent(
        PaymentIntentStatus::RequiresPaymentMethod,
        vec![PaymentMethodType::Card, PaymentMethodType::SepaDebit],
    )));
    backend.api.set_payment_methods(Ok(Some(vec![
        PaymentMethod::new("pm_sepa", PaymentMethodType::SepaDebit),
        PaymentMethod::new("pm_card", PaymentMethodType::Card),
    ])));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert_eq!(
        loaded.saved_payment_methods,
        vec![
            PaymentMethod::new("pm_sepa", PaymentMethodType::SepaDebit),
            PaymentMethod::new("pm_card", PaymentMethodType::Card),
        ]
    );

    Ok(())
}

/// Tests that a listing failing without an error gets a generic one
#[tokio::test]
async fn test_listing_without_error_is_generic_failure() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    backend.api.set_payment_methods(Ok(None));

    let err = sheet.load(payment_intent_secret()).await.unwrap_err();

    assert_eq!(
        err,
        Error::Unknown("Failed to retrieve PaymentMethods for the customer".to_string())
    );

    Ok(())
}

// =============================================================================
// Linked accounts
// =============================================================================

/// Tests that a session cookie wins over the configured email
#[tokio::test]
async fn test_session_cookie_looks_up_without_email() -> Result<()> {
    setup_tracing();
    let mut configuration = customer_configuration();
    configuration.customer_email = Some("jane@example.com".to_string());
    let (sheet, backend) = create_test_sheet(configuration);
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    backend.link.set_session_cookie(true);

    sheet.load(payment_intent_secret()).await?;

    assert_eq!(backend.link.lookups(), vec![None]);
    assert!(!backend
        .api
        .calls()
        .iter()
        .any(|call| matches!(call, ApiCall::RetrieveCustomer { .. })));

    Ok(())
}

/// Tests that a logged-out email falls through to the customer record's email
#[tokio::test]
async fn test_logged_out_email_uses_customer_record() -> Result<()> {
    setup_tracing();
    let mut configuration = customer_configuration();
    configuration.customer_email = Some("jane@example.com".to_string());
    let (sheet, backend) = create_test_sheet(configuration);
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    backend.link.log_out("jane@example.com");
    backend.api.set_customer(Ok(Customer {
        id: CUSTOMER_ID.to_string(),
        email: Some("jane.doe@example.com".to_string()),
    }));

    sheet.load(payment_intent_secret()).await?;

    assert_eq!(
        backend.link.lookups(),
        vec![Some("jane.doe@example.com".to_string())]
    );

    Ok(())
}

/// Tests that a failed customer fetch still looks up, without an email
#[tokio::test]
async fn test_customer_failure_does_not_abort_load() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    backend
        .api
        .set_customer(Err(ServiceError::new("customer unavailable")));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert_eq!(loaded.link_account, None);
    assert_eq!(backend.link.lookups(), vec![None]);

    Ok(())
}

/// Tests that without cookie, email or customer there is no lookup at all
#[tokio::test]
async fn test_no_lookup_without_anything_to_look_up_with() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(base_configuration());
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert_eq!(loaded.link_account, None);
    assert!(backend.link.lookups().is_empty());

    Ok(())
}

/// Tests that the linked account is only returned when link is recommended
#[tokio::test]
async fn test_link_account_gated_by_recommendation() -> Result<()> {
    setup_tracing();
    let session = Arc::new(FakeLinkSession::new());
    let account = session.account(Some("jane@example.com"), LinkAccountSessionState::Verified);

    let (sheet, backend) = create_test_sheet(base_configuration());
    backend.link.set_session_cookie(true);
    backend.link.set_account(Ok(Some(account.clone())));

    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    let loaded = sheet.load(payment_intent_secret()).await?;
    assert_eq!(loaded.link_account, Some(account));

    backend.api.set_intent_with_preferences(Ok(payment_intent(
        PaymentIntentStatus::RequiresPaymentMethod,
        vec![PaymentMethodType::Card],
    )));
    let loaded = sheet.load(payment_intent_secret()).await?;
    assert_eq!(loaded.link_account, None);

    Ok(())
}

/// Tests that a lookup failure fails the load
#[tokio::test]
async fn test_lookup_failure_fails_load() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(base_configuration());
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    backend.link.set_session_cookie(true);
    backend
        .link
        .set_account(Err(ServiceError::new("lookup failed")));

    let err = sheet.load(payment_intent_secret()).await.unwrap_err();

    assert_eq!(err, Error::Service(ServiceError::new("lookup failed")));

    Ok(())
}

// =============================================================================
// Join order
// =============================================================================

/// Tests that all fetches start before the slow intent fetch finishes
#[tokio::test]
async fn test_fetches_start_eagerly() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    backend.api.set_intent_delay(Duration::from_millis(50));
    backend.link.set_session_cookie(true);

    let load = tokio::spawn({
        let sheet = sheet.clone();
        async move { sheet.load(payment_intent_secret()).await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(backend
        .api
        .calls()
        .iter()
        .any(|call| matches!(call, ApiCall::ListPaymentMethods { .. })));
    assert_eq!(backend.link.lookups(), vec![None]);
    assert_eq!(backend.address_specs.loads(), 1);

    load.await??;

    Ok(())
}

/// Tests that the intent failure wins even when a later source fails first
#[tokio::test]
async fn test_first_failure_in_join_order_wins() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(customer_configuration());
    backend
        .api
        .set_intent_with_preferences(Err(ServiceError::new("preferences unavailable")));
    backend
        .api
        .set_intent(Err(ServiceError::new("intent unavailable")));
    backend.api.set_intent_delay(Duration::from_millis(30));
    backend
        .api
        .set_payment_methods(Err(ServiceError::new("listing unavailable")));
    backend.link.set_session_cookie(true);
    backend
        .link
        .set_account(Err(ServiceError::new("lookup failed")));

    let err = sheet.load(payment_intent_secret()).await.unwrap_err();
    assert_eq!(err, Error::Service(ServiceError::new("intent unavailable")));

    // Intent fine now, so the listing failure is next in line
    backend
        .api
        .set_intent_with_preferences(Ok(open_payment_intent()));
    let err = sheet.load(payment_intent_secret()).await.unwrap_err();
    assert_eq!(err, Error::Service(ServiceError::new("listing unavailable")));

    Ok(())
}

/// Tests that unactivated payment method types only warn
#[tokio::test]
async fn test_unactivated_types_do_not_fail_load() -> Result<()> {
    setup_tracing();
    let (sheet, backend) = create_test_sheet(base_configuration());
    let mut intent = open_payment_intent();
    if let paysheet::Intent::PaymentIntent(payment_intent) = &mut intent {
        payment_intent.unactivated_payment_method_types =
            vec![PaymentMethodType::Klarna, PaymentMethodType::Ideal];
    }
    backend.api.set_intent_with_preferences(Ok(intent.clone()));

    let loaded = sheet.load(payment_intent_secret()).await?;

    assert_eq!(loaded.intent, intent);

    Ok(())
}
