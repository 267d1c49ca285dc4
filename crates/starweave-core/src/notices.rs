//! User-visible notices queued for the presentation layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use starweave_logic::galaxy::{QueueTarget, SystemId};
use starweave_logic::progression::TechId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColonizedBy {
    Scan,
    Ship,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The stored save could not be parsed; a new galaxy was generated.
    SaveDiscarded { reason: String },
    /// The stored save was inconsistent; a new galaxy was generated.
    SaveCorrupted { reason: String },
    /// Writing the save failed. The game keeps running in memory.
    StorageFailure { message: String },
    SystemColonized { system: SystemId, by: ColonizedBy },
    ConstructionComplete { system: SystemId, target: QueueTarget },
    ResearchComplete { tech: TechId },
}

impl Notice {
    /// Problems the player should be warned about, as opposed to progress.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Notice::SaveDiscarded { .. } | Notice::SaveCorrupted { .. } | Notice::StorageFailure { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SaveDiscarded { reason } => {
                write!(f, "Saved game was unreadable and has been reset ({})", reason)
            }
            Notice::SaveCorrupted { reason } => {
                write!(f, "Saved game was corrupted and has been reset ({})", reason)
            }
            Notice::StorageFailure { message } => write!(f, "Could not save game: {}", message),
            Notice::SystemColonized { system, by } => match by {
                ColonizedBy::Scan => write!(f, "System {} surveyed and claimed", system),
                ColonizedBy::Ship => write!(f, "Colony ship settled system {}", system),
            },
            Notice::ConstructionComplete { system, target } => match target {
                QueueTarget::Building(kind) => {
                    write!(f, "{} upgraded in system {}", kind.spec().name, system)
                }
                QueueTarget::Ship(class) => {
                    write!(f, "{} ready at system {}", class.spec().name, system)
                }
            },
            Notice::ResearchComplete { tech } => write!(f, "Research complete: {}", tech.spec().name),
        }
    }
}
