//! Fake wallet sheet and address spec loader

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use paysheet::config::ApplePayConfiguration;
use paysheet::confirm::ConfirmationResult;
use paysheet::intent::Intent;
use paysheet::services::{AddressSpecLoader, WalletContext, WalletContextFactory};

use crate::lock;

/// Fake wallet sheet factory
///
/// Creates nothing until a presentation result is scripted, as on a device
/// without wallet support.
#[derive(Debug, Default)]
pub struct FakeWalletFactory {
    result: Mutex<Option<ConfirmationResult>>,
    presented_for: Mutex<Vec<String>>,
}

impl FakeWalletFactory {
    /// Create a factory for an unsupported device
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the device support the wallet; presenting yields `result`
    pub fn set_result(&self, result: ConfirmationResult) {
        *lock(&self.result) = Some(result);
    }

    /// Client secret of every intent a wallet context was created for
    pub fn presented_for(&self) -> Vec<String> {
        lock(&self.presented_for).clone()
    }
}

impl WalletContextFactory for FakeWalletFactory {
    fn create(
        &self,
        intent: &Intent,
        merchant_name: &str,
        configuration: &ApplePayConfiguration,
    ) -> Option<Box<dyn WalletContext>> {
        let result = lock(&self.result).clone()?;

        tracing::debug!(
            "Fake wallet for {} ({})",
            merchant_name,
            configuration.merchant_id
        );
        lock(&self.presented_for).push(intent.client_secret().to_string());

        Some(Box::new(FakeWalletContext { result }))
    }
}

struct FakeWalletContext {
    result: ConfirmationResult,
}

#[async_trait]
impl WalletContext for FakeWalletContext {
    async fn present(self: Box<Self>) -> ConfirmationResult {
        self.result
    }
}

/// Fake address spec loader that counts loads
#[derive(Debug, Default)]
pub struct FakeAddressSpecLoader {
    loads: AtomicUsize,
}

impl FakeAddressSpecLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loads so far
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressSpecLoader for FakeAddressSpecLoader {
    async fn load_address_specs(&self) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }
}
