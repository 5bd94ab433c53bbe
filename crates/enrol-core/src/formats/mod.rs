//! # Formats
//!
//! Binary encodings for data kept outside the JSON form store.

mod bundle;

pub use bundle::*;
