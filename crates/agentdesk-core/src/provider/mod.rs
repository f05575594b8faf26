//! Provider adapter abstractions.
//!
//! - `ProviderAdapter`: RPITIT trait for concrete backends
//! - `BoxProviderAdapter`: object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: agent id -> adapter resolution
//! - `fragments`: terminal-fragment and cancellation guarantees

pub mod adapter;
pub mod box_adapter;
pub mod fragments;
pub mod registry;
