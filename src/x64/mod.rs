//! x86/x86-64 architecture-specific components.
//!
//! This module contains all x86 family specific code:
//! - The [`ArchAdapter`](crate::core::ArchAdapter) implementation for the
//!   32- and 64-bit profiles
//! - Decoder stub templates assembled with iced-x86
//! - Garbage instruction generation
//! - Cipher schema generation and decoder embedding

pub mod adapter;
pub mod decoder;
pub mod garbage;
pub mod schema;

pub use adapter::{X64Adapter, ARCH_X64, ARCH_X86};
