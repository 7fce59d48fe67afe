//! Read models definitions.

pub mod dashboard;
pub mod health;
pub mod list;
pub mod property;
