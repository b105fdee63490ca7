//! Encoding normalization for source files handed to external tools
//!
//! [`EncodingNormalizer`] detects the encoding of a text file and, if it is
//! not UTF-8, rewrites the file as UTF-8 in place.
//!
//! ```rust,no_run
//! use clyze_encoding::{EncodingNormalizer, Normalization};
//! use std::path::Path;
//!
//! let normalizer = EncodingNormalizer::new();
//! match normalizer.ensure_canonical(Path::new("src/Main.java")).unwrap() {
//!     Normalization::Converted { from, .. } => println!("was {from}"),
//!     Normalization::Unchanged(reason) => println!("left alone: {reason:?}"),
//! }
//! ```

pub mod detect;
pub mod error;
pub mod normalize;

pub use detect::{Detector, detect_bytes};
pub use encoding_rs::Encoding;
pub use error::NormalizeError;
pub use normalize::{DEFAULT_CHUNK_SIZE, EncodingNormalizer, Normalization, UnchangedReason};
