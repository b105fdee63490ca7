use serde::{Deserialize, Serialize};

/// Source span of a symbol, as reported by the front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub start_line: u64,
    pub start_column: u64,
    pub end_line: u64,
    pub end_column: u64,
}

impl Position {
    #[must_use]
    pub const fn new(start_line: u64, start_column: u64, end_line: u64, end_column: u64) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}
