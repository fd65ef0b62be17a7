//! Frontdesk Core - Domain types and configuration
//!
//! This crate contains:
//! - **Domain entities** - `SyncConflict`, `ConflictResolutionStrategy`, `ConflictId`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! The domain module is pure data with no I/O. Resolution logic lives in
//! `frontdesk-conflict`; presentation lives in `frontdesk-cli`.

pub mod config;
pub mod domain;
