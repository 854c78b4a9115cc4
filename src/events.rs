use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::WizardId;

/// all events that can be emitted by a wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    WizardStarted {
        wizard_id: WizardId,
        flow: String,
        step_count: usize,
        timestamp: DateTime<Utc>,
    },
    Submitted {
        wizard_id: WizardId,
        resource_id: String,
        timestamp: DateTime<Utc>,
    },
    SubmissionFailed {
        wizard_id: WizardId,
        message: String,
    },

    // navigation events
    StepAdvanced {
        wizard_id: WizardId,
        from: usize,
        to: usize,
    },
    StepRetreated {
        wizard_id: WizardId,
        from: usize,
        to: usize,
    },
    ValidationFailed {
        wizard_id: WizardId,
        step: usize,
        reasons: Vec<String>,
    },

    // record events
    FieldUpdated {
        wizard_id: WizardId,
        field: String,
    },
    HookCompleted {
        wizard_id: WizardId,
        step: usize,
        fields: Vec<String>,
    },
    ResultDiscarded {
        wizard_id: WizardId,
        step: usize,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains() {
        let mut store = EventStore::new();
        let wizard_id = Uuid::new_v4();
        store.emit(Event::FieldUpdated {
            wizard_id,
            field: "email".to_string(),
        });
        store.emit(Event::StepAdvanced { wizard_id, from: 0, to: 1 });

        assert_eq!(store.events().len(), 2);
        let drained = store.take_events();
        assert_eq!(drained.len(), 2);
        assert!(store.events().is_empty());
    }
}
