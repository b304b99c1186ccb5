//! Storage layer for app state
//!
//! Manages key classification, encryption, and persistence.

pub mod backend;
pub mod classify;
pub mod crypto;
pub mod models;
pub mod secure;
