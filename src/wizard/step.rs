use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::wizard::record::{FieldValue, Record};

/// outcome of a step's validation predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// never empty
    Invalid(Vec<String>),
}

impl Validation {
    /// valid when no reasons were collected
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(reasons)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Validation::Valid => &[],
            Validation::Invalid(reasons) => reasons,
        }
    }

    /// combine two outcomes, keeping every reason
    pub fn and(self, other: Validation) -> Validation {
        match (self, other) {
            (Validation::Valid, v) | (v, Validation::Valid) => v,
            (Validation::Invalid(mut a), Validation::Invalid(b)) => {
                a.extend(b);
                Validation::Invalid(a)
            }
        }
    }
}

/// pure predicate over the accumulated record
pub type Validator = Box<dyn Fn(&Record) -> Validation + Send + Sync>;

/// side effect run after a step validates and before the wizard moves on
///
/// Returns field updates to merge into the record. The record is only
/// touched once the hook finishes, so a dropped or discarded call leaves the
/// wizard as it was.
#[async_trait]
pub trait StepHook: Send + Sync {
    async fn on_step_complete(&self, record: &Record) -> Result<Vec<(String, FieldValue)>>;
}

/// one named step of a wizard
pub struct StepDefinition {
    pub name: String,
    validator: Validator,
    hook: Option<Arc<dyn StepHook>>,
}

impl StepDefinition {
    /// step that always validates
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validator: Box::new(|_| Validation::Valid),
            hook: None,
        }
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Record) -> Validation + Send + Sync + 'static,
    {
        self.validator = Box::new(validator);
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn StepHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn validate(&self, record: &Record) -> Validation {
        (self.validator)(record)
    }

    pub fn hook(&self) -> Option<Arc<dyn StepHook>> {
        self.hook.clone()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}
