//! [`Database`]-related implementations.

#[cfg(test)]
pub(crate) mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    /// Stored data violates a domain invariant.
    #[display("Stored data is inconsistent: {_0}")]
    #[from(ignore)]
    Integrity(#[error(not(source))] String),

    #[cfg(test)]
    /// In-memory [`Database`] error.
    Memory(memory::Error),
}

impl Error {
    /// Checks whether this [`Error`] is caused by a unique constraint
    /// violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(None),
            #[cfg(test)]
            Self::Memory(e) => matches!(e, memory::Error::UniqueViolation(_)),
            Self::Integrity(_) => false,
        }
    }

    /// Checks whether this [`Error`] is caused by a foreign key constraint
    /// violation, like a reference to a missing row.
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_foreign_key_violation(None),
            #[cfg(test)]
            Self::Memory(e) => {
                matches!(e, memory::Error::ForeignKeyViolation(_))
            }
            Self::Integrity(_) => false,
        }
    }
}
