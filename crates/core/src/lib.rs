//! Core types for rowpack
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Closed enum over the nine field value kinds
//! - OpaqueValue: Type-erased escape hatch for non-primitive values
//! - Fields: Insertion-ordered field map
//! - Record: Destination-tagged record with an optional identifier
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fields;
pub mod record;
pub mod value;

pub use error::{BoxError, Error, Result};
pub use fields::Fields;
pub use record::Record;
pub use value::{OpaqueObject, OpaqueValue, Value};
