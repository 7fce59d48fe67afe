//! Infrastructure layer.

pub mod database;
pub mod images;

pub use self::{database::Database, images::Images};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
