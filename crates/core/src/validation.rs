//! Ordered, per-entity field validation.
//!
//! A [`Schema`] is a list of fields in declaration order, each with an ordered
//! list of rules. Validation visits every field and collects all failures, so a
//! caller sees one violation per failing rule across the whole entity. Within a
//! field, a *halting* rule (such as `required`) stops the remaining rules for
//! that field only.

use crate::error::{DomainError, DomainResult, FieldViolation};

/// Reads a field's value out of the entity. `None` means "not supplied".
pub type Accessor<T> = fn(&T) -> Option<&str>;

struct Rule {
    test: Box<dyn Fn(&str) -> bool + Send + Sync>,
    message: String,
    halt: bool,
}

struct FieldSpec<T: ?Sized> {
    name: &'static str,
    get: Accessor<T>,
    required: Option<String>,
    not_blank: Option<String>,
    rules: Vec<Rule>,
}

/// Ordered validation rules for an entity of type `T`.
pub struct Schema<T: ?Sized> {
    fields: Vec<FieldSpec<T>>,
}

impl<T: ?Sized> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Schema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Start a new field. Rule methods called after this apply to it.
    pub fn field(mut self, name: &'static str, get: Accessor<T>) -> Self {
        self.fields.push(FieldSpec {
            name,
            get,
            required: None,
            not_blank: None,
            rules: Vec::new(),
        });
        self
    }

    /// The field must be supplied and non-empty. Halts the field on failure.
    pub fn required(mut self, message: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.required = Some(message.into());
        }
        self
    }

    /// If the field is supplied it must be non-empty; absence is fine.
    pub fn not_blank(mut self, message: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.not_blank = Some(message.into());
        }
        self
    }

    pub fn min_chars(self, min: usize, message: impl Into<String>) -> Self {
        self.rule(move |v| v.chars().count() >= min, message)
    }

    pub fn max_chars(self, max: usize, message: impl Into<String>) -> Self {
        self.rule(move |v| v.chars().count() <= max, message)
    }

    /// Add a rule that passes when `test` returns true.
    pub fn rule<F>(self, test: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.push_rule(test, message.into(), false)
    }

    /// Like [`Schema::rule`], but a failure skips the field's later rules.
    pub fn halting_rule<F>(self, test: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.push_rule(test, message.into(), true)
    }

    fn push_rule<F>(mut self, test: F, message: String, halt: bool) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        if let Some(field) = self.fields.last_mut() {
            field.rules.push(Rule {
                test: Box::new(test),
                message,
                halt,
            });
        }
        self
    }

    /// Run every field's rules and collect the failures in declaration order.
    pub fn violations(&self, value: &T) -> Vec<FieldViolation> {
        let mut out = Vec::new();

        for field in &self.fields {
            let raw = (field.get)(value);

            let Some(v) = raw.filter(|v| !v.is_empty()) else {
                let blank = if raw.is_some() { field.not_blank.as_ref() } else { None };
                if let Some(msg) = field.required.as_ref().or(blank) {
                    out.push(FieldViolation::new(field.name, msg.clone()));
                }
                continue;
            };

            for rule in &field.rules {
                if (rule.test)(v) {
                    continue;
                }
                out.push(FieldViolation::new(field.name, rule.message.clone()));
                if rule.halt {
                    break;
                }
            }
        }

        out
    }

    /// `Ok(())` when every rule passes, otherwise an aggregated validation error.
    pub fn validate(&self, value: &T) -> DomainResult<()> {
        let violations = self.violations(value);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(DomainError::invalid_fields(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Draft {
        name: String,
        note: Option<String>,
    }

    fn schema() -> Schema<Draft> {
        Schema::new()
            .field("name", |d: &Draft| Some(d.name.as_str()))
            .required("name is required")
            .min_chars(3, "name too short")
            .rule(|v| v.chars().all(char::is_alphanumeric), "name not alphanumeric")
            .field("note", |d: &Draft| d.note.as_deref())
            .max_chars(5, "note too long")
    }

    #[test]
    fn collects_failures_across_fields_in_declaration_order() {
        let d = Draft {
            name: "a-".to_string(),
            note: Some("toolong".to_string()),
        };
        let v = schema().violations(&d);
        let messages: Vec<_> = v.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["name too short", "name not alphanumeric", "note too long"]);
        assert_eq!(v[2].field, "note");
    }

    #[test]
    fn required_halts_only_its_field() {
        let d = Draft {
            name: String::new(),
            note: Some("toolong".to_string()),
        };
        let v = schema().violations(&d);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].message, "name is required");
        assert_eq!(v[1].message, "note too long");
    }

    #[test]
    fn absent_optional_field_is_skipped() {
        let d = Draft {
            name: "abc".to_string(),
            note: None,
        };
        assert!(schema().validate(&d).is_ok());
    }

    #[test]
    fn halting_rule_stops_remaining_rules() {
        let s: Schema<Draft> = Schema::new()
            .field("name", |d: &Draft| Some(d.name.as_str()))
            .halting_rule(|v| v.len() > 3, "first")
            .rule(|_| false, "second");
        let d = Draft {
            name: "ab".to_string(),
            note: None,
        };
        let err = s.validate(&d).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.message(), "first");
    }

    #[test]
    fn not_blank_only_applies_to_supplied_values() {
        let s: Schema<Draft> = Schema::new()
            .field("note", |d: &Draft| d.note.as_deref())
            .not_blank("note cannot be blank");

        let absent = Draft {
            name: String::new(),
            note: None,
        };
        assert!(s.validate(&absent).is_ok());

        let blank = Draft {
            name: String::new(),
            note: Some(String::new()),
        };
        assert_eq!(s.violations(&blank)[0].message, "note cannot be blank");
    }

    #[test]
    fn length_rules_count_characters_not_bytes() {
        let d = Draft {
            name: "héé".to_string(),
            note: Some("ééééé".to_string()),
        };
        assert!(schema().validate(&d).is_ok());
    }
}
