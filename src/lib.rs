//! Deterministic match simulation engine for a turn-based baseball
//! management game: a layered stat pipeline, a two-sided ability clash
//! resolver, speed-based baserunning, pitcher fatigue and substitution, a
//! pluggable random source, and a structured trace of every roll.

#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

mod ability;
mod approach;
mod atbat;
mod baserunning;
mod error;
mod game;
pub mod id;
mod pipeline;
mod player;
mod rng;
mod sim;
mod synergy;
mod team;
mod trace;

pub use crate::ability::{
    catalog, lookup, Ability, AbilityEffect, ActiveAbilityContext, OutcomeBonuses, OutcomeChance,
    PASSIVE_BUNDLE_ID,
};
pub use crate::approach::{adaptation_multiplier, Approach, PitchStrategy};
pub use crate::atbat::{resolve as resolve_at_bat, AtBatContext, AtBatResult};
pub use crate::baserunning::{resolve_extra_bases, BaserunningOutcome};
pub use crate::error::{EngineError, SimFailure};
pub use crate::game::{
    Advance, AtBatOutcome, AwayHome, BaseState, BattingLine, BoxScore, Half, PitchingLine,
    TeamBoxScore, TeamSelect,
};
pub use crate::pipeline::{
    defense_glove, effective_batter, effective_pitcher, fatigue_modifier, BatterLayers,
    PitcherLayers,
};
pub use crate::player::{
    Archetype, BatterStats, EquipmentItem, OwnedTechnique, PitcherStats, Player, Role, Spirit,
    Trait, EQUIPMENT_SLOTS, MAX_TRAITS,
};
pub use crate::rng::{
    install_default, reset_default, with_default, RandomSource, ScriptedRng, SeededRng,
};
pub use crate::sim::{
    simulate, Decisions, MatchResult, MatchSim, RewardConfig, SimOptions, StepReport,
};
pub use crate::synergy::{compute as compute_synergies, SideSynergies, Synergies};
pub use crate::team::{Team, TeamColors};
pub use crate::trace::{
    AtBatStart, AtBatTrace, ClashSide, ExtraBaseTrace, GameEventTrace, GameTraceLog,
    ResolutionTrace, RollLog, SpiritDelta, TraceRecorder, TRACE_VERSION,
};
