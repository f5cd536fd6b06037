//! Value objects for the merch request domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identity of a merch request.
///
/// `0` is the unset value carried by a request that has not been created yet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MerchRequestId(i64);

impl MerchRequestId {
    /// The identity of a request that has not been persisted yet.
    pub const UNSET: MerchRequestId = MerchRequestId(0);

    /// Creates an ID from a raw value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns true for the unset identity.
    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }
}

impl std::fmt::Display for MerchRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MerchRequestId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// An employee's email address, normalized to lowercase.
///
/// Equality is structural on the normalized address, so `IIvanov@Mail.com`
/// and `iivanov@mail.com` are the same employee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parses and normalizes an email address.
    pub fn parse(address: impl AsRef<str>) -> Result<Self, DomainError> {
        let normalized = address.as_ref().trim().to_lowercase();
        if !Self::is_well_formed(&normalized) {
            return Err(DomainError::InvalidEmail(address.as_ref().to_string()));
        }
        Ok(Self(normalized))
    }

    /// Returns true if `address` has a non-empty local part and a dotted domain.
    pub fn is_well_formed(address: &str) -> bool {
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !domain.contains('@')
            && !address.chars().any(char::is_whitespace)
            && domain.contains('.')
            && domain.split('.').all(|label| !label.is_empty())
    }

    /// Returns the normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        Self::parse(address)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An employee's full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeFullName {
    first_name: String,
    last_name: String,
    /// May be empty; not every employee has one.
    patronymic: String,
}

impl EmployeeFullName {
    /// Creates a full name. First and last names must not be blank.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        patronymic: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        let patronymic = patronymic.into().trim().to_string();

        if first_name.is_empty() {
            return Err(DomainError::EmptyName {
                field: "first_name",
            });
        }
        if last_name.is_empty() {
            return Err(DomainError::EmptyName { field: "last_name" });
        }

        Ok(Self {
            first_name,
            last_name,
            patronymic,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn patronymic(&self) -> &str {
        &self.patronymic
    }
}

impl std::fmt::Display for EmployeeFullName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.patronymic.is_empty() {
            write!(f, "{} {}", self.first_name, self.last_name)
        } else {
            write!(
                f,
                "{} {} {}",
                self.last_name, self.first_name, self.patronymic
            )
        }
    }
}

/// The employee a merch request is issued to.
///
/// Owned by the request; it has no lifecycle of its own here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Employee {
    pub email: Email,
    pub full_name: EmployeeFullName,
}

impl Employee {
    /// Creates a new employee.
    pub fn new(email: Email, full_name: EmployeeFullName) -> Self {
        Self { email, full_name }
    }
}

/// When a merch request was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchRequestDateTime(DateTime<Utc>);

impl MerchRequestDateTime {
    /// Captures the current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing timestamp.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Returns the underlying timestamp.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for MerchRequestDateTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl std::fmt::Display for MerchRequestDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
