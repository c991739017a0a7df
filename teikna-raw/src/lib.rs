//! Parsing for variable composite glyph tables.
//!
//! This crate provides zero-copy access to the binary tables consumed by the
//! variable composite evaluation engines in the `teikna` crate: the `VARC`
//! variable composite table, the `hvgl` part table, and the item variation
//! store both of them lean on for design-space deltas.
//!
//! Nothing here locates tables inside a font file; callers hand each table's
//! raw bytes to the matching [`FontRead`] implementation.

#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

mod font_data;
mod read;
pub mod tables;

#[cfg(any(test, feature = "test_data"))]
#[path = "tests/test_helpers.rs"]
pub mod test_helpers;

pub use font_data::{Cursor, FontData};
pub use read::{FontRead, ReadError};

/// Public re-export of the font-types crate.
pub use font_types as types;
