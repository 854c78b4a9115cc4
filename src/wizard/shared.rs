use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::errors::{LendingError, Result};
use crate::services::SubmissionReceipt;
use crate::state::WizardState;
use crate::wizard::controller::{CancelHandle, Wizard};
use crate::wizard::record::FieldValue;

/// cloneable handle for driving one wizard from async UI code
///
/// At most one operation runs at a time; a second call while one is in
/// flight fails with `Busy` instead of queueing. Disposing the handle
/// cancels the wizard and any in-flight result is discarded.
#[derive(Clone)]
pub struct SharedWizard {
    inner: Arc<Mutex<Wizard>>,
    cancel: CancelHandle,
}

impl SharedWizard {
    pub fn new(wizard: Wizard) -> Self {
        let cancel = wizard.cancel_handle();
        Self {
            inner: Arc::new(Mutex::new(wizard)),
            cancel,
        }
    }

    pub async fn advance(&self) -> Result<usize> {
        let mut wizard = self.acquire()?;
        wizard.advance().await
    }

    pub async fn retreat(&self) -> Result<usize> {
        let mut wizard = self.acquire()?;
        wizard.retreat()
    }

    pub async fn update_field(&self, name: impl Into<String>, value: impl Into<FieldValue>) -> Result<()> {
        let mut wizard = self.acquire()?;
        wizard.update_field(name, value)
    }

    pub async fn submit(&self, time_provider: &SafeTimeProvider) -> Result<SubmissionReceipt> {
        let mut wizard = self.acquire()?;
        wizard.submit(time_provider).await
    }

    pub fn dispose(&self) {
        debug!("wizard handle disposed");
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// copy of the current state; readable after disposal
    pub fn state(&self) -> Result<WizardState> {
        self.inner
            .try_lock()
            .map(|wizard| wizard.state().clone())
            .map_err(|_| LendingError::Busy)
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Wizard>> {
        if self.cancel.is_cancelled() {
            return Err(LendingError::Cancelled);
        }
        self.inner.try_lock().map_err(|_| {
            debug!("operation rejected; another is in flight");
            LendingError::Busy
        })
    }
}
