//! API endpoint handlers.

pub mod form;
pub mod health;
