//! Declarative field sets. A step's validator and its visible fields both
//! derive from one `StepSchema`, with conditional fields expressed as
//! variants keyed on a discriminator field instead of nested conditionals.

use rust_decimal::Decimal;

use crate::wizard::record::Record;
use crate::wizard::step::Validation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    /// optional; no format constraint
    Optional,
    /// required with at least this many characters
    MinLength(usize),
    /// optional, but exactly this many characters when present
    ExactLengthIfPresent(usize),
    /// required and equal to another field
    MatchesField(&'static str),
    /// required and one of the listed values
    OneOf(&'static [&'static str]),
    /// optional, but one of the listed values when present
    OneOfIfPresent(&'static [&'static str]),
    /// required number greater than zero
    PositiveNumber,
    /// optional, but a non-negative number when present
    NumberIfPresent,
    /// checkbox that must be ticked
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rule: FieldRule,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, rule: FieldRule) -> Self {
        Self { name, label, rule }
    }

    /// reasons this field fails its rule against the record
    pub fn check(&self, record: &Record) -> Option<String> {
        let present = record.is_present(self.name);
        let text_len = record.text(self.name).map(|s| s.chars().count());
        let raw_len = record.raw_text(self.name).map(|s| s.chars().count());

        match &self.rule {
            FieldRule::Optional => None,
            FieldRule::Required if !present => Some(self.required()),
            FieldRule::Required => None,
            FieldRule::MinLength(_) | FieldRule::MatchesField(_) | FieldRule::OneOf(_) | FieldRule::PositiveNumber
                if !present =>
            {
                Some(self.required())
            }
            FieldRule::MinLength(min) => match raw_len {
                Some(len) if len >= *min => None,
                _ => Some(format!("{} must be at least {} characters", self.label, min)),
            },
            FieldRule::ExactLengthIfPresent(_) if !present => None,
            FieldRule::ExactLengthIfPresent(len) => match text_len {
                Some(actual) if actual == *len => None,
                _ => Some(format!("{} must be {} characters", self.label, len)),
            },
            FieldRule::MatchesField(other) => {
                if record.get(self.name) == record.get(other) {
                    None
                } else {
                    Some(format!("{} does not match", self.label))
                }
            }
            FieldRule::OneOf(allowed) => self.check_one_of(record, allowed),
            FieldRule::OneOfIfPresent(_) if !present => None,
            FieldRule::OneOfIfPresent(allowed) => self.check_one_of(record, allowed),
            FieldRule::PositiveNumber => match record.number(self.name) {
                Some(n) if n > Decimal::ZERO => None,
                _ => Some(format!("{} must be a number greater than zero", self.label)),
            },
            FieldRule::NumberIfPresent if !present => None,
            FieldRule::NumberIfPresent => match record.number(self.name) {
                Some(n) if n >= Decimal::ZERO => None,
                _ => Some(format!("{} must be a number", self.label)),
            },
            FieldRule::Accepted => match record.flag(self.name) {
                Some(true) => None,
                _ => Some(format!("{} must be accepted", self.label)),
            },
        }
    }

    fn check_one_of(&self, record: &Record, allowed: &[&str]) -> Option<String> {
        match record.text(self.name) {
            Some(value) if allowed.contains(&value) => None,
            _ => Some(format!("{} must be one of: {}", self.label, allowed.join(", "))),
        }
    }

    fn required(&self) -> String {
        format!("{} is required", self.label)
    }
}

/// extra fields that apply when `discriminator` holds `value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub discriminator: &'static str,
    pub value: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl Variant {
    pub fn applies_to(&self, record: &Record) -> bool {
        record.text(self.discriminator) == Some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub variants: Vec<Variant>,
}

impl StepSchema {
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name,
            fields,
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, discriminator: &'static str, value: &'static str, fields: Vec<FieldSpec>) -> Self {
        self.variants.push(Variant {
            discriminator,
            value,
            fields,
        });
        self
    }

    /// fields shown for the current record: base fields plus matching variants
    pub fn active_fields<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields.iter().chain(
            self.variants
                .iter()
                .filter(move |v| v.applies_to(record))
                .flat_map(|v| v.fields.iter()),
        )
    }

    pub fn validate(&self, record: &Record) -> Validation {
        Validation::from_reasons(self.active_fields(record).filter_map(|f| f.check(record)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> StepSchema {
        StepSchema::new(
            "credentials",
            vec![
                FieldSpec::new("password", "Password", FieldRule::MinLength(6)),
                FieldSpec::new("confirmPassword", "Password confirmation", FieldRule::MatchesField("password")),
                FieldSpec::new("bvn", "BVN", FieldRule::ExactLengthIfPresent(11)),
                FieldSpec::new("status", "Status", FieldRule::OneOf(&["employed", "student"])),
            ],
        )
        .with_variant(
            "status",
            "employed",
            vec![FieldSpec::new("income", "Monthly income", FieldRule::NumberIfPresent)],
        )
    }

    #[test]
    fn test_missing_fields_are_reported_by_label() {
        let validation = schema().validate(&Record::new());
        assert_eq!(
            validation.reasons(),
            [
                "Password is required".to_string(),
                "Password confirmation is required".to_string(),
                "Status is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_rules() {
        let record: Record = [
            ("password", "abc"),
            ("confirmPassword", "abd"),
            ("bvn", "123"),
            ("status", "retired"),
        ]
        .into_iter()
        .collect();

        let reasons = schema().validate(&record);
        assert_eq!(reasons.reasons().len(), 4);
        assert!(reasons.reasons()[0].contains("at least 6"));
        assert!(reasons.reasons()[1].contains("does not match"));
        assert!(reasons.reasons()[2].contains("11 characters"));
        assert!(reasons.reasons()[3].contains("one of"));
    }

    #[test]
    fn test_min_length_counts_whitespace_as_entered() {
        let record: Record = [
            ("password", "  abcd"),
            ("confirmPassword", "  abcd"),
            ("status", "student"),
        ]
        .into_iter()
        .collect();
        assert!(schema().validate(&record).is_valid());

        // confirmation must match the password as typed
        let record: Record = [
            ("password", "  abcd"),
            ("confirmPassword", "abcd"),
            ("status", "student"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            schema().validate(&record).reasons(),
            ["Password confirmation does not match".to_string()]
        );
    }

    #[test]
    fn test_variant_fields_follow_discriminator() {
        let schema = schema();
        let mut record: Record = [
            ("password", "secret1"),
            ("confirmPassword", "secret1"),
            ("status", "student"),
            ("income", "lots"),
        ]
        .into_iter()
        .collect();

        // income is not part of the student field set
        assert!(schema.validate(&record).is_valid());
        assert_eq!(schema.active_fields(&record).count(), 4);

        record.set("status", "employed");
        assert_eq!(schema.active_fields(&record).count(), 5);
        assert_eq!(schema.validate(&record).reasons(), ["Monthly income must be a number".to_string()]);
    }
}
