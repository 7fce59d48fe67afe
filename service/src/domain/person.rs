//! Contact details shared by people and organizations.

use std::{fmt, sync::LazyLock};

use common::define_text;
use derive_more::{AsRef, Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};

define_text! {
    #[doc = "Name of a person or an organization."]
    struct Name(max = 255);
}

define_text! {
    #[doc = "Postal address."]
    struct Address(max = 500);
}

/// Email address.
///
/// Stored lowercased.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, Into, PartialEq, Serialize,
)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Option<Self> {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("valid regex")
        });

        let address = address.as_ref().trim().to_lowercase();
        (address.len() <= 254 && REGEX.is_match(&address))
            .then_some(Self(address))
    }
}

impl TryFrom<String> for Email {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number.
///
/// Formatting characters (`(`, `)`, `-`, spaces and dots) are stripped on
/// construction, so only an optional leading `+` and digits are stored.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, Into, PartialEq, Serialize,
)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        /// Regular expression checking normalized [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?\d{7,15}$").expect("valid regex")
        });

        let number = number
            .as_ref()
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | '-' | ' ' | '.'))
            .collect::<String>();
        REGEX.is_match(&number).then_some(Self(number))
    }
}

impl TryFrom<String> for Phone {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// Social Security Number.
///
/// Stored as 9 digits without dashes. [`fmt::Debug`] output is masked.
#[derive(AsRef, Clone, Deserialize, Eq, Hash, Into, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct Ssn(String);

impl Ssn {
    /// Creates a new [`Ssn`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        let number = number.as_ref().trim().replace('-', "");
        (number.len() == 9 && number.bytes().all(|b| b.is_ascii_digit()))
            .then_some(Self(number))
    }

    /// Returns the last four digits of this [`Ssn`].
    #[must_use]
    pub fn last_four(&self) -> &str {
        &self.0[5..]
    }
}

impl fmt::Debug for Ssn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ssn(***-**-{})", self.last_four())
    }
}

impl TryFrom<String> for Ssn {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Ssn`: expected 9 digits")
    }
}
