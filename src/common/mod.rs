//! Common utilities and shared functionality
//!
//! Helpers used by both the feed adapters and the settlement decoders.

pub mod numeric;
