// crates/snapqueue-config/src/lib.rs
// ============================================================================
// Module: Snapqueue Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for snapqueue.toml semantics.
// Dependencies: snapqueue-store-sqlite, serde, toml, url
// ============================================================================

//! ## Overview
//! `snapqueue-config` defines the configuration model for the capture queue
//! and its sync engine. Loading is strict and fail-closed: oversized,
//! non-UTF-8, or inconsistent files are rejected before anything runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
