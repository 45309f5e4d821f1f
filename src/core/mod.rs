//! Error taxonomy and reference code lists shared by every layer.

mod codes;
mod error;

pub use codes::CodeList;
pub use error::*;
