//! Models module
//!
//! Defines the in-memory table representation shared by every pipeline stage.

pub mod table;
pub mod value;

pub use table::Table;
pub use value::{SqlType, Value};
