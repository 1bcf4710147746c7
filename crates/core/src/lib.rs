//! Copper Otter Core - Shared types library.
//!
//! This crate provides common types used across all Copper Otter components:
//! - `cart` - Client-side cart synchronization engine
//! - the storefront UI shell (separate repository)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and product categories

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
