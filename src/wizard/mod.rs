pub mod controller;
pub mod record;
pub mod schema;
pub mod shared;
pub mod step;

pub use controller::{CancelHandle, Wizard, WizardBuilder};
pub use record::{FieldValue, Record};
pub use schema::{FieldRule, FieldSpec, StepSchema, Variant};
pub use shared::SharedWizard;
pub use step::{StepDefinition, StepHook, Validation, Validator};
