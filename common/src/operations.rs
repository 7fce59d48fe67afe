//! [`Handler`] abstraction and the abstract operations it is executed with.

use std::{future::Future, marker::PhantomData};

/// Executable handler.
///
/// Commands, queries and database operations are all [`Handler`]s of
/// different argument types.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

/// Operation to insert a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to update an existing value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation to delete values.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Operation to select values.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to call a named procedure.
#[derive(Clone, Copy, Debug)]
pub struct Call<T>(pub T);

/// Operation to store a value outside of the database (files, blobs).
#[derive(Clone, Debug)]
pub struct Store<T>(pub T);

/// Operation to start a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Transact`]ed value.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation to commit a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by `B`.
///
/// `W` describes what is affected by an operation, while `B` holds the value
/// the affected rows are found by.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the affected value.
    _what: PhantomData<W>,

    /// Value to find the affected rows by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] with the given value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns a reference to the inner value.
    #[must_use]
    pub fn as_inner(&self) -> &B {
        &self.by
    }

    /// Consumes this [`By`] and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
