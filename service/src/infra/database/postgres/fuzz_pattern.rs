//! [`FuzzPattern`] definition.

use postgres_types::{FromSql, ToSql};

/// `ILIKE` patterns matching any word of a search input, to be used as
/// `column ILIKE ANY($n::TEXT[])`.
#[derive(Clone, Debug, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(Vec<String>);

impl FuzzPattern {
    /// Creates a new [`FuzzPattern`] out of the given `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self(
            input
                .split_whitespace()
                .map(|word| {
                    let escaped = word
                        .replace('\\', r"\\")
                        .replace('%', r"\%")
                        .replace('_', r"\_");
                    format!("%{escaped}%")
                })
                .collect(),
        )
    }

    /// Checks whether this [`FuzzPattern`] has no words to match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
