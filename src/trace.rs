use crate::ability::{ActiveAbilityContext, OutcomeBonuses};
use crate::approach::{Approach, PitchStrategy};
use crate::game::{AtBatOutcome, AwayHome, Half, TeamSelect};
use crate::id::PlayerId;
use crate::pipeline::{BatterLayers, PitcherLayers};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TRACE_VERSION: u32 = 1;

/// One labeled RNG draw: the raw `[0, 1)` value, the scaled form the check
/// compared, and the threshold it was compared against.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollLog {
    pub label: String,
    pub raw: f64,
    pub scaled: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClashSide {
    Batter,
    Pitcher,
}

/// Which branch of the resolver fired.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionTrace {
    Clash {
        winner: ClashSide,
        batter_roll: f64,
        pitcher_roll: f64,
    },
    GuaranteedBatter {
        outcome: AtBatOutcome,
    },
    GuaranteedPitcher {
        outcome: AtBatOutcome,
    },
    Normal,
}

/// One extra-base attempt, taken or declined.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraBaseTrace {
    pub runner: PlayerId,
    pub from_base: u8,
    pub to_base: u8,
    pub attempt_chance: f64,
    pub attempt_roll: f64,
    pub attempted: bool,
    pub success_chance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_roll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe: Option<bool>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpiritDelta {
    pub batter: i32,
    pub pitcher: i32,
    pub team_on_run: i32,
}

/// The full audit record of one plate appearance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtBatTrace {
    pub index: u32,
    pub inning: u32,
    pub half: Half,
    pub batter: PlayerId,
    pub pitcher: PlayerId,
    pub outcome: AtBatOutcome,
    pub clash_occurred: bool,
    pub resolution: ResolutionTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<Approach>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<PitchStrategy>,
    pub approach_consecutive: u32,
    pub strategy_consecutive: u32,
    pub approach_adaptation: f64,
    pub strategy_adaptation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batter_pipeline: Option<BatterLayers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitcher_pipeline: Option<PitcherLayers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense_glove: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batter_ability: Option<ActiveAbilityContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitcher_ability: Option<ActiveAbilityContext>,
    pub modifier_totals: OutcomeBonuses,
    pub rolls: Vec<RollLog>,
    pub extra_bases: Vec<ExtraBaseTrace>,
    pub spirit: SpiritDelta,
    pub runs_scored: u32,
    pub bases_before: [bool; 3],
    pub bases_after: [bool; 3],
    pub outs_before: u8,
    pub outs_after: u8,
}

/// Game-level events parallel to the at-bat list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventTrace {
    InningStart {
        inning: u32,
        half: Half,
    },
    InningEnd {
        inning: u32,
        half: Half,
        runs: u32,
        hits: u32,
    },
    PitcherChange {
        team: TeamSelect,
        old_name: String,
        new_name: String,
        reason: String,
    },
}

/// The whole-game audit log. The field set is an external contract; breaking
/// changes bump `version`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTraceLog {
    pub version: u32,
    pub game_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub at_bats: Vec<AtBatTrace>,
    pub events: Vec<GameEventTrace>,
    pub warnings: Vec<String>,
    pub final_score: AwayHome<u32>,
    pub total_innings: u32,
}

/// Scoped sink collecting one game's audit. A disabled recorder swallows
/// everything, so the engine can call it unconditionally.
#[derive(Debug)]
pub struct TraceRecorder {
    enabled: bool,
    seed: Option<u64>,
    at_bats: Vec<AtBatTrace>,
    events: Vec<GameEventTrace>,
    warnings: Vec<String>,
    current: Option<AtBatTrace>,
}

pub struct AtBatStart {
    pub index: u32,
    pub inning: u32,
    pub half: Half,
    pub batter: PlayerId,
    pub pitcher: PlayerId,
    pub bases_before: [bool; 3],
    pub outs_before: u8,
}

impl TraceRecorder {
    pub fn enabled(seed: Option<u64>) -> TraceRecorder {
        TraceRecorder {
            enabled: true,
            seed,
            at_bats: Vec::new(),
            events: Vec::new(),
            warnings: Vec::new(),
            current: None,
        }
    }

    pub fn disabled() -> TraceRecorder {
        TraceRecorder {
            enabled: false,
            seed: None,
            at_bats: Vec::new(),
            events: Vec::new(),
            warnings: Vec::new(),
            current: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn warning(&mut self, message: String) {
        if self.enabled {
            self.warnings.push(message);
        }
    }

    pub fn event(&mut self, event: GameEventTrace) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn begin_at_bat(&mut self, start: AtBatStart) {
        if !self.enabled {
            return;
        }
        self.current = Some(AtBatTrace {
            index: start.index,
            inning: start.inning,
            half: start.half,
            batter: start.batter,
            pitcher: start.pitcher,
            outcome: AtBatOutcome::Groundout,
            clash_occurred: false,
            resolution: ResolutionTrace::Normal,
            approach: None,
            strategy: None,
            approach_consecutive: 0,
            strategy_consecutive: 0,
            approach_adaptation: 1.0,
            strategy_adaptation: 1.0,
            batter_pipeline: None,
            pitcher_pipeline: None,
            defense_glove: None,
            batter_ability: None,
            pitcher_ability: None,
            modifier_totals: OutcomeBonuses::default(),
            rolls: Vec::new(),
            extra_bases: Vec::new(),
            spirit: SpiritDelta::default(),
            runs_scored: 0,
            bases_before: start.bases_before,
            bases_after: start.bases_before,
            outs_before: start.outs_before,
            outs_after: start.outs_before,
        });
    }

    pub fn choices(
        &mut self,
        approach: Approach,
        approach_consecutive: u32,
        approach_adaptation: f64,
        strategy: PitchStrategy,
        strategy_consecutive: u32,
        strategy_adaptation: f64,
    ) {
        if let Some(current) = &mut self.current {
            current.approach = Some(approach);
            current.approach_consecutive = approach_consecutive;
            current.approach_adaptation = approach_adaptation;
            current.strategy = Some(strategy);
            current.strategy_consecutive = strategy_consecutive;
            current.strategy_adaptation = strategy_adaptation;
        }
    }

    pub fn abilities(
        &mut self,
        batter: Option<&ActiveAbilityContext>,
        pitcher: Option<&ActiveAbilityContext>,
    ) {
        if let Some(current) = &mut self.current {
            current.batter_ability = batter.cloned();
            current.pitcher_ability = pitcher.cloned();
        }
    }

    pub fn roll(
        &mut self,
        label: &str,
        raw: f64,
        scaled: f64,
        threshold: Option<f64>,
        passed: Option<bool>,
    ) {
        if let Some(current) = &mut self.current {
            current.rolls.push(RollLog {
                label: label.to_owned(),
                raw,
                scaled,
                threshold,
                passed,
            });
        }
    }

    pub fn stage_batter(&mut self, layers: BatterLayers) {
        if let Some(current) = &mut self.current {
            current.batter_pipeline = Some(layers);
        }
    }

    pub fn stage_pitcher(&mut self, layers: PitcherLayers) {
        if let Some(current) = &mut self.current {
            current.pitcher_pipeline = Some(layers);
        }
    }

    pub fn stage_defense(&mut self, glove: f64) {
        if let Some(current) = &mut self.current {
            current.defense_glove = Some(glove);
        }
    }

    pub fn modifier_totals(&mut self, totals: OutcomeBonuses) {
        if let Some(current) = &mut self.current {
            current.modifier_totals = totals;
        }
    }

    pub fn resolution(&mut self, resolution: ResolutionTrace) {
        if let Some(current) = &mut self.current {
            current.clash_occurred = matches!(resolution, ResolutionTrace::Clash { .. });
            current.resolution = resolution;
        }
    }

    pub fn extra_base(&mut self, attempt: ExtraBaseTrace) {
        if let Some(current) = &mut self.current {
            current.extra_bases.push(attempt);
        }
    }

    pub fn spirit_delta(&mut self, delta: SpiritDelta) {
        if let Some(current) = &mut self.current {
            current.spirit = delta;
        }
    }

    pub fn finish_at_bat(
        &mut self,
        outcome: AtBatOutcome,
        runs_scored: u32,
        bases_after: [bool; 3],
        outs_after: u8,
    ) {
        if let Some(mut current) = self.current.take() {
            current.outcome = outcome;
            current.runs_scored = runs_scored;
            current.bases_after = bases_after;
            current.outs_after = outs_after;
            self.at_bats.push(current);
        }
    }

    /// Snapshot of the log so far; used when a simulation aborts and the
    /// failure carries the partial trace.
    pub fn partial(&self, final_score: AwayHome<u32>, total_innings: u32) -> Option<Box<GameTraceLog>> {
        if !self.enabled {
            return None;
        }
        Some(Box::new(GameTraceLog {
            version: TRACE_VERSION,
            game_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            seed: self.seed,
            at_bats: self.at_bats.clone(),
            events: self.events.clone(),
            warnings: self.warnings.clone(),
            final_score,
            total_innings,
        }))
    }

    pub fn into_log(self, final_score: AwayHome<u32>, total_innings: u32) -> GameTraceLog {
        GameTraceLog {
            version: TRACE_VERSION,
            game_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            seed: self.seed,
            at_bats: self.at_bats,
            events: self.events,
            warnings: self.warnings,
            final_score,
            total_innings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AtBatStart, GameEventTrace, ResolutionTrace, TraceRecorder};
    use crate::game::{AtBatOutcome, AwayHome, Half};

    fn start() -> AtBatStart {
        AtBatStart {
            index: 0,
            inning: 1,
            half: Half::Top,
            batter: "b1".into(),
            pitcher: "p1".into(),
            bases_before: [false; 3],
            outs_before: 0,
        }
    }

    #[test]
    fn disabled_recorder_swallows_everything() {
        let mut trace = TraceRecorder::disabled();
        trace.begin_at_bat(start());
        trace.roll("strikeoutCheck", 0.5, 50.0, Some(20.0), Some(false));
        trace.finish_at_bat(AtBatOutcome::Single, 0, [true, false, false], 0);
        trace.warning("nope".into());
        assert!(trace.partial(AwayHome::default(), 0).is_none());
        let log = trace.into_log(AwayHome::default(), 0);
        assert!(log.at_bats.is_empty());
        assert!(log.warnings.is_empty());
    }

    #[test]
    fn at_bat_lifecycle_accumulates_rolls() {
        let mut trace = TraceRecorder::enabled(Some(7));
        trace.begin_at_bat(start());
        trace.roll("strikeoutCheck", 0.5, 50.0, Some(20.0), Some(false));
        trace.roll("walkCheck", 0.1, 10.0, Some(12.0), Some(true));
        trace.resolution(ResolutionTrace::Normal);
        trace.finish_at_bat(AtBatOutcome::Walk, 0, [true, false, false], 0);
        let log = trace.into_log(AwayHome { away: 0, home: 0 }, 9);
        assert_eq!(log.version, 1);
        assert_eq!(log.seed, Some(7));
        assert_eq!(log.at_bats.len(), 1);
        assert_eq!(log.at_bats[0].rolls.len(), 2);
        assert_eq!(log.at_bats[0].outcome, AtBatOutcome::Walk);
        assert_eq!(log.at_bats[0].bases_after, [true, false, false]);
    }

    #[test]
    fn trace_log_serializes_with_camel_case_contract() {
        let mut trace = TraceRecorder::enabled(Some(42));
        trace.begin_at_bat(start());
        trace.roll("hitQuality", 0.9, 95.2, None, None);
        trace.finish_at_bat(AtBatOutcome::Double, 1, [false, true, false], 1);
        trace.event(GameEventTrace::InningEnd {
            inning: 1,
            half: Half::Top,
            runs: 1,
            hits: 1,
        });
        let log = trace.into_log(AwayHome { away: 1, home: 0 }, 9);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["seed"], 42);
        assert_eq!(json["finalScore"]["away"], 1);
        assert_eq!(json["totalInnings"], 9);
        let at_bat = &json["atBats"][0];
        assert_eq!(at_bat["clashOccurred"], false);
        assert_eq!(at_bat["basesAfter"][1], true);
        assert_eq!(at_bat["outsBefore"], 0);
        assert_eq!(at_bat["rolls"][0]["label"], "hitQuality");
        assert_eq!(json["events"][0]["type"], "inning_end");

        // Round-trips through the JSON contract.
        let back: super::GameTraceLog = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);
    }
}
