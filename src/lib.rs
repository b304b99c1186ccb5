//! Tably secure storage
//!
//! Client-side storage for Tably restaurant apps: classifies every key,
//! encrypts PII and auth material at rest, migrates legacy plaintext
//! entries once, and manages the session token lifecycle.

pub mod config;
pub mod diagnostics;
pub mod manager;
pub mod migration;
pub mod storage;
pub mod token;
