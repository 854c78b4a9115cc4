use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{WizardId, WizardStatus};
use crate::wizard::Record;

/// state of one in-progress multi-step form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardState {
    // identification
    pub id: WizardId,
    pub flow: String,

    // position
    pub current_step: usize,
    pub step_count: usize,
    pub visited_steps: BTreeSet<usize>,

    // collected data
    pub record: Record,

    // lifecycle
    pub status: WizardStatus,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl WizardState {
    /// create new state positioned at the first step
    pub fn new(flow: impl Into<String>, step_count: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            flow: flow.into(),
            current_step: 0,
            step_count,
            visited_steps: BTreeSet::new(),
            record: Record::new(),
            status: WizardStatus::InProgress,
            started_at,
            submitted_at: None,
        }
    }

    pub fn last_step(&self) -> usize {
        self.step_count.saturating_sub(1)
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.last_step()
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.status, WizardStatus::Submitted { .. })
    }

    /// a step counts as reached once every earlier step has validated
    pub fn can_visit(&self, step: usize) -> bool {
        step < self.step_count && (0..step).all(|s| self.visited_steps.contains(&s))
    }

    /// move forward one step, never past the last
    pub(crate) fn step_forward(&mut self) -> usize {
        self.visited_steps.insert(self.current_step);
        self.current_step = (self.current_step + 1).min(self.last_step());
        self.current_step
    }

    /// move back one step, never before the first
    pub(crate) fn step_back(&mut self) -> usize {
        self.current_step = self.current_step.saturating_sub(1);
        self.current_step
    }

    pub(crate) fn mark_submitted(&mut self, resource_id: String, timestamp: DateTime<Utc>) {
        self.status = WizardStatus::Submitted { resource_id };
        self.submitted_at = Some(timestamp);
    }
}

/// state snapshot for inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub snapshot_id: Uuid,
    pub wizard_id: WizardId,
    pub timestamp: DateTime<Utc>,
    pub state: WizardState,
    pub trigger: String,
}

impl StateSnapshot {
    pub fn capture(state: &WizardState, trigger: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            wizard_id: state.id,
            timestamp,
            state: state.clone(),
            trigger: trigger.into(),
        }
    }

    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_step_bounds() {
        let mut state = WizardState::new("registration", 3, started());
        assert!(state.is_first_step());
        assert_eq!(state.step_back(), 0);

        assert_eq!(state.step_forward(), 1);
        assert_eq!(state.step_forward(), 2);
        assert_eq!(state.step_forward(), 2);
        assert!(state.is_last_step());
        assert_eq!(state.visited_steps.len(), 3);
    }

    #[test]
    fn test_can_visit_requires_earlier_steps() {
        let mut state = WizardState::new("loan_application", 3, started());
        assert!(state.can_visit(0));
        assert!(!state.can_visit(2));

        state.step_forward();
        state.step_forward();
        assert!(state.can_visit(2));
        assert!(!state.can_visit(3));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = WizardState::new("registration", 3, started());
        state.record.set("email", "ada@example.com");
        state.mark_submitted("usr_1".to_string(), started());

        let snapshot = StateSnapshot::capture(&state, "submitted", started());
        let json = snapshot.to_json().unwrap();
        let back: StateSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back.state.status, WizardStatus::Submitted { resource_id: "usr_1".to_string() });
        assert_eq!(back.state.record, state.record);
    }
}
