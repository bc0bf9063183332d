//! Application services behind the callkey binary.

pub mod error;
pub mod inspect;
