//! Storage abstraction and implementations for FitSync.
//!
//! This crate provides a trait-based storage interface with an in-memory
//! reference implementation that stands in for the product's network layer.

#![warn(missing_docs)]

pub mod memory;
pub mod trait_;

pub use memory::MemoryStorage;
pub use trait_::{Result, Storage, StorageError};
