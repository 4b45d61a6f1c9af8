//! Utils module - Shared utilities and helpers
//!
//! Stateless helpers invoked by the rest of the toolchain. None of them hold
//! state of their own.

/// Critical-severity logging with the `FMLTC_LOG - ` prefix
pub mod logging;

/// Conversion between timestamps and epoch milliseconds
pub mod time;

/// Label map text generation
pub mod label_map;

/// Label occurrence count merging
pub mod counts;
