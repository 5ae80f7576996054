use crate::id::{AbilityId, TeamId};
use crate::trace::GameTraceLog;

/// The three failure classes the engine distinguishes. Malformed ability
/// distributions are repaired in place and only surface here when they are
/// beyond repair (an empty distribution on an ability the resolver must roll).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("team {team} cannot field a {needed}")]
    InvalidRoster { team: TeamId, needed: &'static str },
    #[error("ability {ability} has a {problem} outcome distribution")]
    MalformedAbility {
        ability: AbilityId,
        problem: &'static str,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// What the caller receives when a simulation cannot produce a result: the
/// error variant plus whatever trace had been accumulated before the abort.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SimFailure {
    pub error: EngineError,
    pub partial_trace: Option<Box<GameTraceLog>>,
}

impl SimFailure {
    pub fn bare(error: EngineError) -> SimFailure {
        SimFailure {
            error,
            partial_trace: None,
        }
    }
}

impl From<EngineError> for SimFailure {
    fn from(error: EngineError) -> SimFailure {
        SimFailure::bare(error)
    }
}
