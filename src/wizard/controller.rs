use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::errors::{LendingError, Result};
use crate::events::{Event, EventStore};
use crate::services::{SubmissionReceipt, Submitter};
use crate::state::{StateSnapshot, WizardState};
use crate::types::WizardId;
use crate::wizard::record::{FieldValue, Record};
use crate::wizard::step::{StepDefinition, Validation};

/// flag shared between a wizard and whoever may dispose of it
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// builder for a wizard over a fixed list of steps
pub struct WizardBuilder {
    flow: String,
    steps: Vec<StepDefinition>,
    submitter: Option<Arc<dyn Submitter>>,
}

impl WizardBuilder {
    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = StepDefinition>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn build(self, time_provider: &SafeTimeProvider) -> Result<Wizard> {
        if self.steps.is_empty() {
            return Err(LendingError::InvalidConfiguration {
                message: format!("wizard '{}' has no steps", self.flow),
            });
        }
        let submitter = self.submitter.ok_or_else(|| LendingError::InvalidConfiguration {
            message: format!("wizard '{}' has no submitter", self.flow),
        })?;

        let state = WizardState::new(self.flow, self.steps.len(), time_provider.now());
        let mut events = EventStore::new();
        events.emit(Event::WizardStarted {
            wizard_id: state.id,
            flow: state.flow.clone(),
            step_count: state.step_count,
            timestamp: state.started_at,
        });
        info!(wizard_id = %state.id, flow = %state.flow, steps = state.step_count, "wizard started");

        Ok(Wizard {
            state,
            steps: self.steps,
            submitter,
            cancel: CancelHandle::default(),
            events,
        })
    }
}

/// multi-step form controller
///
/// Owns the accumulated record and the current position. Each forward move
/// is gated on the current step's validator; a step hook may enrich the
/// record before the move completes. Submission hands the record to the
/// configured `Submitter` once, from the last step.
pub struct Wizard {
    state: WizardState,
    steps: Vec<StepDefinition>,
    submitter: Arc<dyn Submitter>,
    cancel: CancelHandle,
    pub events: EventStore,
}

impl Wizard {
    pub fn builder(flow: impl Into<String>) -> WizardBuilder {
        WizardBuilder {
            flow: flow.into(),
            steps: Vec::new(),
            submitter: None,
        }
    }

    pub fn id(&self) -> WizardId {
        self.state.id
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn record(&self) -> &Record {
        &self.state.record
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn current_step_name(&self) -> &str {
        &self.steps[self.state.current_step].name
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    pub fn is_submitted(&self) -> bool {
        self.state.is_submitted()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// mark the wizard disposed; any result still in flight is discarded
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn snapshot(&self, trigger: impl Into<String>, time_provider: &SafeTimeProvider) -> StateSnapshot {
        StateSnapshot::capture(&self.state, trigger, time_provider.now())
    }

    /// run the current step's validator without moving
    pub fn validate_current(&self) -> Validation {
        self.steps[self.state.current_step].validate(&self.state.record)
    }

    pub fn update_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Result<()> {
        self.ensure_open()?;
        let name = name.into();
        debug!(wizard_id = %self.state.id, field = %name, "field updated");
        self.state.record.set(name.clone(), value);
        self.events.emit(Event::FieldUpdated {
            wizard_id: self.state.id,
            field: name,
        });
        Ok(())
    }

    /// validate the current step, run its hook and move forward
    ///
    /// On the last step the wizard stays put after validating. Returns the
    /// new step index.
    pub async fn advance(&mut self) -> Result<usize> {
        self.ensure_open()?;
        let from = self.state.current_step;
        self.check_step(from)?;

        if let Some(hook) = self.steps[from].hook() {
            let outcome = hook.on_step_complete(&self.state.record).await;
            self.ensure_not_cancelled(from)?;

            let updates = outcome.map_err(|e| {
                warn!(wizard_id = %self.state.id, step = from, error = %e, "step hook failed");
                e
            })?;
            self.events.emit(Event::HookCompleted {
                wizard_id: self.state.id,
                step: from,
                fields: updates.iter().map(|(name, _)| name.clone()).collect(),
            });
            self.state.record.merge(updates);
        }

        let to = self.state.step_forward();
        info!(wizard_id = %self.state.id, from, to, "step advanced");
        self.events.emit(Event::StepAdvanced {
            wizard_id: self.state.id,
            from,
            to,
        });
        Ok(to)
    }

    /// move back one step; a no-op on the first step. Fields are kept.
    pub fn retreat(&mut self) -> Result<usize> {
        self.ensure_open()?;
        let from = self.state.current_step;
        let to = self.state.step_back();
        if from != to {
            info!(wizard_id = %self.state.id, from, to, "step retreated");
            self.events.emit(Event::StepRetreated {
                wizard_id: self.state.id,
                from,
                to,
            });
        }
        Ok(to)
    }

    /// hand the record to the submitter; only from a valid last step
    pub async fn submit(&mut self, time_provider: &SafeTimeProvider) -> Result<SubmissionReceipt> {
        self.ensure_open()?;
        let current = self.state.current_step;
        let last = self.state.last_step();
        if current != last {
            return Err(LendingError::NotAtFinalStep { current, last });
        }
        self.check_step(last)?;

        let submitted_at = time_provider.now();
        let submitter = Arc::clone(&self.submitter);
        let outcome = submitter.submit(&self.state.flow, &self.state.record).await;
        self.ensure_not_cancelled(last)?;

        match outcome {
            Ok(receipt) => {
                self.state.visited_steps.insert(last);
                self.state.mark_submitted(receipt.resource_id.clone(), submitted_at);
                info!(wizard_id = %self.state.id, resource_id = %receipt.resource_id, "wizard submitted");
                self.events.emit(Event::Submitted {
                    wizard_id: self.state.id,
                    resource_id: receipt.resource_id.clone(),
                    timestamp: submitted_at,
                });
                Ok(receipt)
            }
            Err(source) => {
                warn!(wizard_id = %self.state.id, error = %source, "submission failed");
                self.events.emit(Event::SubmissionFailed {
                    wizard_id: self.state.id,
                    message: source.to_string(),
                });
                Err(LendingError::external("submission", source))
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(LendingError::Cancelled);
        }
        if self.state.is_submitted() {
            return Err(LendingError::AlreadySubmitted);
        }
        Ok(())
    }

    fn ensure_not_cancelled(&mut self, step: usize) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(wizard_id = %self.state.id, step, "wizard disposed; discarding result");
            self.events.emit(Event::ResultDiscarded {
                wizard_id: self.state.id,
                step,
            });
            return Err(LendingError::Cancelled);
        }
        Ok(())
    }

    fn check_step(&mut self, step: usize) -> Result<()> {
        match self.steps[step].validate(&self.state.record) {
            Validation::Valid => Ok(()),
            Validation::Invalid(reasons) => {
                warn!(wizard_id = %self.state.id, step, reasons = ?reasons, "step validation failed");
                self.events.emit(Event::ValidationFailed {
                    wizard_id: self.state.id,
                    step,
                    reasons: reasons.clone(),
                });
                Err(LendingError::ValidationFailed { step, reasons })
            }
        }
    }
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
