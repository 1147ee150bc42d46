//! The administration pages. Every handler here takes an [`Admin`] as its
//! first argument, so none of them run without a valid session.
//!
//! [`Admin`]: crate::auth::Admin

pub mod dashboard;
pub mod matches;
pub mod teams;
pub mod tournaments;
