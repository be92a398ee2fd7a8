//! Entity Module

pub mod user;
