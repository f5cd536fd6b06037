//! Field-level command validation.

use common::Enumeration;
use domain::Email;

/// One rule a command field failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Name of the offending command field.
    pub field: &'static str,
    /// Human-readable description of the violation.
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every failure reported for one command, in validator order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationFailure>);

impl ValidationErrors {
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if any failure is attributed to `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|failure| failure.field == field)
    }

    pub(crate) fn extend(&mut self, failures: impl IntoIterator<Item = ValidationFailure>) {
        self.0.extend(failures);
    }
}

impl From<Vec<ValidationFailure>> for ValidationErrors {
    fn from(failures: Vec<ValidationFailure>) -> Self {
        Self(failures)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// A validator registered for command type `C`.
///
/// Validators are pure: they inspect the command and never touch storage or
/// external services.
pub trait Validator<C>: Send + Sync {
    /// Returns every rule `command` breaks; empty when it is valid.
    fn validate(&self, command: &C) -> Vec<ValidationFailure>;
}

impl<C, F> Validator<C> for F
where
    F: Fn(&C) -> Vec<ValidationFailure> + Send + Sync,
{
    fn validate(&self, command: &C) -> Vec<ValidationFailure> {
        self(command)
    }
}

/// Collects failures for one command, field by field.
#[derive(Debug, Default)]
pub struct Rules {
    failures: Vec<ValidationFailure>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_blank(mut self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.failures
                .push(ValidationFailure::new(field, "must not be empty"));
        }
        self
    }

    pub fn email(mut self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.failures
                .push(ValidationFailure::new(field, "must not be empty"));
        } else if !Email::is_well_formed(value.trim()) {
            self.failures
                .push(ValidationFailure::new(field, "must be a valid email address"));
        }
        self
    }

    /// Requires `id` to be a declared member of enumeration `T`.
    pub fn declared<T: Enumeration>(mut self, field: &'static str, id: i32) -> Self {
        if !T::is_declared(id) {
            let allowed: Vec<String> = T::all().iter().map(|m| m.id().to_string()).collect();
            self.failures.push(ValidationFailure::new(
                field,
                format!(
                    "{id} is not a valid {}; expected one of {}",
                    T::TYPE_NAME,
                    allowed.join(", ")
                ),
            ));
        }
        self
    }

    pub fn not_empty<T>(mut self, field: &'static str, values: &[T]) -> Self {
        if values.is_empty() {
            self.failures
                .push(ValidationFailure::new(field, "must not be empty"));
        }
        self
    }

    pub fn finish(self) -> Vec<ValidationFailure> {
        self.failures
    }
}
