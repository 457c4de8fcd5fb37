//! Common utility functions

pub mod email;
pub mod phone;
