//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - Client identification (IP, header fingerprint)
//! - Signed bearer tokens
//! - A small TTL cache for read-through caching

pub mod cache;
pub mod client;
pub mod crypto;
pub mod token;
