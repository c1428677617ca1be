use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One proofing concern handled by an interchangeable adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Address,
    Resolution,
    StateId,
    Financial,
    Phone,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Address,
        Stage::Resolution,
        Stage::StateId,
        Stage::Financial,
        Stage::Phone,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Stage::Address => "address",
            Stage::Resolution => "resolution",
            Stage::StateId => "state_id",
            Stage::Financial => "financial",
            Stage::Phone => "phone",
        }
    }

    /// Key under which a delegated executor delivers this stage's result.
    pub fn callback_field(self) -> String {
        format!("{}_result", self.label())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown proofing stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "address" => Ok(Stage::Address),
            "resolution" | "profile" => Ok(Stage::Resolution),
            "state_id" | "state-id" => Ok(Stage::StateId),
            "financial" | "finance" => Ok(Stage::Financial),
            "phone" => Ok(Stage::Phone),
            _ => Err(UnknownStage(value.to_string())),
        }
    }
}
