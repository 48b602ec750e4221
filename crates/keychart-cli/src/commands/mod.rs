//! Command implementations.

pub mod convert;
pub mod inspect;
