//! BoxProviderAdapter -- object-safe dynamic dispatch wrapper for ProviderAdapter.
//!
//! 1. Define an object-safe `ProviderAdapterDyn` trait with boxed futures
//! 2. Blanket-impl `ProviderAdapterDyn` for all `T: ProviderAdapter`
//! 3. `BoxProviderAdapter` wraps `Box<dyn ProviderAdapterDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use agentdesk_types::llm::{AdapterCapabilities, AdapterError};

use super::adapter::{AdapterStream, AdapterTurn, ExecuteOptions, ProviderAdapter};

/// Object-safe version of [`ProviderAdapter`] with boxed futures.
pub trait ProviderAdapterDyn: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> &AdapterCapabilities;

    fn supports_images(&self) -> bool;

    fn check_available_boxed<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), AdapterError>> + Send + 'a>>;

    fn execute_boxed(&self, turn: AdapterTurn, options: ExecuteOptions) -> AdapterStream;
}

impl<T: ProviderAdapter> ProviderAdapterDyn for T {
    fn name(&self) -> &str {
        ProviderAdapter::name(self)
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        ProviderAdapter::capabilities(self)
    }

    fn supports_images(&self) -> bool {
        ProviderAdapter::supports_images(self)
    }

    fn check_available_boxed<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), AdapterError>> + Send + 'a>> {
        Box::pin(self.check_available())
    }

    fn execute_boxed(&self, turn: AdapterTurn, options: ExecuteOptions) -> AdapterStream {
        self.execute(turn, options)
    }
}

/// Type-erased adapter selected at runtime through the registry.
///
/// Since `ProviderAdapter` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxProviderAdapter` provides equivalent methods that delegate
/// to the inner `ProviderAdapterDyn` trait object.
pub struct BoxProviderAdapter {
    inner: Box<dyn ProviderAdapterDyn + Send + Sync>,
}

impl BoxProviderAdapter {
    pub fn new<T: ProviderAdapter + 'static>(adapter: T) -> Self {
        Self {
            inner: Box::new(adapter),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn capabilities(&self) -> &AdapterCapabilities {
        self.inner.capabilities()
    }

    pub fn supports_images(&self) -> bool {
        self.inner.supports_images()
    }

    pub async fn check_available(&self) -> Result<(), AdapterError> {
        self.inner.check_available_boxed().await
    }

    pub fn execute(&self, turn: AdapterTurn, options: ExecuteOptions) -> AdapterStream {
        self.inner.execute_boxed(turn, options)
    }
}

impl std::fmt::Debug for BoxProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxProviderAdapter")
            .field("name", &self.name())
            .finish()
    }
}
