//! Analysis records exchanged with clyze tools
//!
//! Records are plain structs. They become string-keyed JSON maps only at the
//! boundary, through `save_to` / `load_from`.

mod method_invocation;
mod position;

pub use method_invocation::MethodInvocation;
pub use position::Position;

use thiserror::Error;

/// A map could not be read back as a record
#[derive(Error, Debug)]
pub enum RecordError {
    /// A required key is missing or a value has the wrong type
    #[error("Malformed {record} record: {source}")]
    Shape {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be written out as a map
    #[error("Cannot encode {record} record: {source}")]
    Encode {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
