use std::fmt;

use serde::Serialize;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ingest,
    Metadata,
    Review,
    Evaluate,
    Done,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Ingest,
        Stage::Metadata,
        Stage::Review,
        Stage::Evaluate,
        Stage::Done,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Metadata => "metadata",
            Stage::Review => "review",
            Stage::Evaluate => "evaluate",
            Stage::Done => "done",
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Ingest => Some(Stage::Metadata),
            Stage::Metadata => Some(Stage::Review),
            Stage::Review => Some(Stage::Evaluate),
            Stage::Evaluate => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
