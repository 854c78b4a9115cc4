use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::quote::LoanQuote;

/// a single form value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Flag(bool),
    Quote(LoanQuote),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        FieldValue::Number(d)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(Decimal::from(n))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(Decimal::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<LoanQuote> for FieldValue {
    fn from(q: LoanQuote) -> Self {
        FieldValue::Quote(q)
    }
}

/// the partial record accumulated across all steps of a wizard
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// set a field, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// trimmed text; blank text counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Some(s.trim()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// text exactly as entered, surrounding whitespace included
    pub fn raw_text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// a field holds something other than blank text
    pub fn is_present(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(FieldValue::Text(_)) => self.text(name).is_some(),
            Some(_) => true,
            None => false,
        }
    }

    /// numeric value, parsing text input when needed
    pub fn number(&self, name: &str) -> Option<Decimal> {
        match self.fields.get(name) {
            Some(FieldValue::Number(d)) => Some(*d),
            Some(FieldValue::Text(_)) => self.text(name).and_then(|s| Decimal::from_str(s).ok()),
            _ => None,
        }
    }

    /// whole, non-negative number (durations, counts)
    pub fn whole_number(&self, name: &str) -> Option<u32> {
        let n = self.number(name)?;
        if n.fract().is_zero() {
            n.to_u32()
        } else {
            None
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.fields.get(name) {
            Some(FieldValue::Flag(b)) => Some(*b),
            Some(FieldValue::Text(_)) => match self.text(name) {
                Some("true" | "on" | "yes") => Some(true),
                Some("false" | "off" | "no") => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn quote(&self, name: &str) -> Option<&LoanQuote> {
        match self.fields.get(name) {
            Some(FieldValue::Quote(q)) => Some(q),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn merge(&mut self, updates: impl IntoIterator<Item = (String, FieldValue)>) {
        self.fields.extend(updates);
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_text_is_absent() {
        let mut record = Record::new();
        record.set("purpose", "   ");
        assert!(!record.is_present("purpose"));
        assert_eq!(record.text("purpose"), None);

        record.set("purpose", " stock ");
        assert_eq!(record.text("purpose"), Some("stock"));
    }

    #[test]
    fn test_numbers_parse_from_text() {
        let record: Record = [("amountRequested", "100000"), ("loanDuration", "12"), ("bad", "12x")]
            .into_iter()
            .collect();

        assert_eq!(record.number("amountRequested"), Some(dec!(100000)));
        assert_eq!(record.whole_number("loanDuration"), Some(12));
        assert_eq!(record.number("bad"), None);
    }

    #[test]
    fn test_whole_number_rejects_fractions() {
        let mut record = Record::new();
        record.set("loanDuration", dec!(6.5));
        assert_eq!(record.whole_number("loanDuration"), None);
        record.set("loanDuration", dec!(6.0));
        assert_eq!(record.whole_number("loanDuration"), Some(6));
    }

    #[test]
    fn test_flags() {
        let mut record = Record::new();
        record.set("termsAccepted", true);
        assert_eq!(record.flag("termsAccepted"), Some(true));
        record.set("termsAccepted", "off");
        assert_eq!(record.flag("termsAccepted"), Some(false));
    }

    #[test]
    fn test_serializes_as_tagged_map() {
        let mut record = Record::new();
        record.set("email", "ada@example.com");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["email"]["kind"], "text");
        assert_eq!(json["email"]["value"], "ada@example.com");
    }
}
