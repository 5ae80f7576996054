use crate::ability::{self, ActiveAbilityContext, OutcomeBonuses};
use crate::approach::{adaptation_multiplier, auto_approach, auto_strategy, Approach, PitchStrategy};
use crate::atbat::{self, AtBatContext};
use crate::baserunning;
use crate::error::{EngineError, SimFailure};
use crate::game::{
    AtBatOutcome, AwayHome, BaseState, BattingLine, BoxScore, Half, PitchingLine, TeamBoxScore,
    TeamSelect,
};
use crate::id::{AbilityId, PlayerId};
use crate::player::Player;
use crate::rng::RandomSource;
use crate::synergy::{self, Synergies};
use crate::team::Team;
use crate::trace::{
    AtBatStart, GameEventTrace, GameTraceLog, SpiritDelta, TraceRecorder,
};
use serde::{Deserialize, Serialize};

const OUTS_PER_HALF: u8 = 3;
const REGULATION_INNINGS: u32 = 9;
// Termination backstop; a tie surviving this long means the loop is broken.
const MAX_INNINGS: u32 = 99;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimOptions {
    pub seed: Option<u64>,
    pub enable_trace: bool,
}

/// Per-at-bat choices for the interactive form. Unset fields fall back to
/// the deterministic auto policy, which is also what batch simulation uses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Decisions {
    pub batter_approach: Option<Approach>,
    pub pitch_strategy: Option<PitchStrategy>,
    pub batter_ability: Option<AbilityId>,
    pub pitcher_ability: Option<AbilityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardConfig {
    pub base: u32,
    pub per_run: u32,
    pub win_bonus: u32,
}

impl Default for RewardConfig {
    fn default() -> RewardConfig {
        RewardConfig {
            base: 40,
            per_run: 12,
            win_bonus: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub my_runs: u32,
    pub opponent_runs: u32,
    pub is_win: bool,
    pub cash_earned: u32,
    pub total_innings: u32,
    pub box_score: BoxScore,
    pub play_by_play: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loot_drops: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_log: Option<GameTraceLog>,
}

/// What one `step_at_bat` produced, for interactive callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub outcome: AtBatOutcome,
    pub clash_occurred: bool,
    pub description: String,
    pub finished: bool,
}

#[derive(Debug)]
struct SideState {
    name: String,
    batters: Vec<Player>,
    pitchers: Vec<Player>,
    batter_bundles: Vec<Option<ActiveAbilityContext>>,
    pitcher_bundles: Vec<Option<ActiveAbilityContext>>,
    batting_index: usize,
    pitcher_index: usize,
    pitcher_outs: Vec<u32>,
    extra_fatigue: Vec<f64>,
    batting_lines: Vec<BattingLine>,
    pitching_lines: Vec<PitchingLine>,
    approach_streak: Vec<(Option<Approach>, u32)>,
    strategy_streak: Vec<(Option<PitchStrategy>, u32)>,
    runs: u32,
    hits: u32,
    synergies: Synergies,
    consecutive_baserunners: u32,
    subbed_this_half: bool,
    previous_pitcher_technique: Option<AbilityId>,
}

impl SideState {
    fn build(team: &Team, trace: &mut TraceRecorder) -> SideState {
        let batters = team.lineup_players();
        let pitchers = team.pitcher_players();
        let batter_bundles = batters
            .iter()
            .map(|player| ActiveAbilityContext::passive_bundle(player, trace))
            .collect();
        let pitcher_bundles = pitchers
            .iter()
            .map(|player| ActiveAbilityContext::passive_bundle(player, trace))
            .collect();
        let synergies = synergy::compute(&batters);
        SideState {
            name: team.name.clone(),
            batter_bundles,
            pitcher_bundles,
            batting_index: 0,
            pitcher_index: 0,
            pitcher_outs: vec![0; pitchers.len()],
            extra_fatigue: vec![0.0; pitchers.len()],
            batting_lines: vec![BattingLine::default(); batters.len()],
            pitching_lines: vec![PitchingLine::default(); pitchers.len()],
            approach_streak: vec![(None, 0); batters.len()],
            strategy_streak: vec![(None, 0); pitchers.len()],
            runs: 0,
            hits: 0,
            synergies,
            consecutive_baserunners: 0,
            subbed_this_half: false,
            previous_pitcher_technique: None,
            batters,
            pitchers,
        }
    }

    fn current_pitcher(&self) -> &Player {
        &self.pitchers[self.pitcher_index]
    }

    fn innings_pitched_effective(&self) -> f64 {
        f64::from(self.pitcher_outs[self.pitcher_index]) / 3.0
            + self.extra_fatigue[self.pitcher_index]
    }

    fn box_score(&self) -> TeamBoxScore {
        TeamBoxScore {
            batting: self
                .batters
                .iter()
                .zip(&self.batting_lines)
                .map(|(player, line)| (player.id.clone(), *line))
                .collect(),
            pitching: self
                .pitchers
                .iter()
                .zip(&self.pitching_lines)
                .map(|(player, line)| (player.id.clone(), *line))
                .collect(),
        }
    }
}

/// The interactive engine: construct, step one at-bat at a time, finalize.
/// The batch form drives this with the auto policy, so the two are identical
/// for a given seed by construction.
#[derive(Debug)]
pub struct MatchSim {
    rng: RandomSource,
    trace: TraceRecorder,
    sides: AwayHome<SideState>,
    inning: u32,
    half: Half,
    outs: u8,
    bases: BaseState,
    half_runs: u32,
    half_hits: u32,
    half_started: bool,
    at_bat_index: u32,
    play_by_play: Vec<String>,
    finished: bool,
    total_innings: u32,
}

impl MatchSim {
    pub fn new(home: &Team, away: &Team, options: SimOptions) -> Result<MatchSim, SimFailure> {
        home.validate()?;
        away.validate()?;
        let rng = match options.seed {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::system(),
        };
        let mut trace = if options.enable_trace {
            TraceRecorder::enabled(options.seed)
        } else {
            TraceRecorder::disabled()
        };
        let sides = AwayHome {
            away: SideState::build(away, &mut trace),
            home: SideState::build(home, &mut trace),
        };
        Ok(MatchSim {
            rng,
            trace,
            sides,
            inning: 1,
            half: Half::Top,
            outs: 0,
            bases: BaseState::default(),
            half_runs: 0,
            half_hits: 0,
            half_started: false,
            at_bat_index: 0,
            play_by_play: Vec::new(),
            finished: false,
            total_innings: 0,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn score(&self) -> AwayHome<u32> {
        AwayHome {
            away: self.sides.away.runs,
            home: self.sides.home.runs,
        }
    }

    pub fn inning(&self) -> u32 {
        self.inning
    }

    pub fn half(&self) -> Half {
        self.half
    }

    pub fn play_by_play(&self) -> &[String] {
        &self.play_by_play
    }

    fn fail(&self, error: EngineError) -> SimFailure {
        SimFailure {
            partial_trace: self.trace.partial(self.score(), self.inning),
            error,
        }
    }

    /// Runs one plate appearance and everything attached to it: choices,
    /// activations, resolution, advancement, baserunning, momentum, the
    /// substitution check, and half/game transitions.
    pub fn step_at_bat(&mut self, decisions: &Decisions) -> Result<StepReport, SimFailure> {
        if self.finished {
            return Err(self.fail(EngineError::InvariantViolation(
                "step_at_bat called after the game ended".into(),
            )));
        }

        let batting_sel = self.half.batting();
        let fielding_sel = batting_sel.opponent();

        if !self.half_started {
            self.half_started = true;
            self.trace.event(GameEventTrace::InningStart {
                inning: self.inning,
                half: self.half,
            });
            self.play_by_play.push(format!(
                "{} of inning {}. {} batting.",
                self.half.word(),
                self.inning,
                self.sides.select(batting_sel).name,
            ));
        }

        // Select the batter and pitcher for this plate appearance.
        let batter_idx = {
            let side = self.sides.select(batting_sel);
            side.batting_index % side.batters.len()
        };
        let batter = self.sides.select(batting_sel).batters[batter_idx].clone();
        let pitcher_idx = self.sides.select(fielding_sel).pitcher_index;
        let pitcher = self.sides.select(fielding_sel).current_pitcher().clone();

        // Approach and strategy, chosen or auto, with consecutive-use
        // bookkeeping (reset to 1 on change, increment on repeat).
        let approach = decisions
            .batter_approach
            .unwrap_or_else(|| auto_approach(batter.batting, pitcher.pitching));
        let approach_count = {
            let streak = &mut self.sides.select_mut(batting_sel).approach_streak[batter_idx];
            *streak = match streak {
                (Some(previous), count) if *previous == approach => (Some(approach), *count + 1),
                _ => (Some(approach), 1),
            };
            streak.1
        };
        let strategy = decisions
            .pitch_strategy
            .unwrap_or_else(|| auto_strategy(pitcher.pitching, batter.batting));
        let strategy_count = {
            let streak = &mut self.sides.select_mut(fielding_sel).strategy_streak[pitcher_idx];
            *streak = match streak {
                (Some(previous), count) if *previous == strategy => (Some(strategy), *count + 1),
                _ => (Some(strategy), 1),
            };
            streak.1
        };

        // Active abilities: explicit ids, else the AI policy; the passive
        // bundle rides along when nothing activates.
        let batter_ctx = self.activate(batting_sel, ActorSlot::Batter(batter_idx), decisions.batter_ability.as_ref());
        let pitcher_ctx = self.activate(fielding_sel, ActorSlot::Pitcher(pitcher_idx), decisions.pitcher_ability.as_ref());

        let extra_modifiers = self.repertoire_penalty(fielding_sel, &pitcher);

        self.trace.begin_at_bat(AtBatStart {
            index: self.at_bat_index,
            inning: self.inning,
            half: self.half,
            batter: batter.id.clone(),
            pitcher: pitcher.id.clone(),
            bases_before: self.bases.occupancy(),
            outs_before: self.outs,
        });
        self.trace.choices(
            approach,
            approach_count,
            adaptation_multiplier(approach_count),
            strategy,
            strategy_count,
            adaptation_multiplier(strategy_count),
        );
        self.trace
            .abilities(batter_ctx.as_ref(), pitcher_ctx.as_ref());

        let innings_pitched = self.sides.select(fielding_sel).innings_pitched_effective();
        let offense_synergy = self.sides.select(batting_sel).synergies.side;
        let defense_synergy = self.sides.select(fielding_sel).synergies.side;

        let result = {
            let defense = &self.sides.select(fielding_sel).batters;
            let ctx = AtBatContext {
                batter: &batter,
                pitcher: &pitcher,
                defense,
                innings_pitched,
                batter_ability: batter_ctx.as_ref(),
                pitcher_ability: pitcher_ctx.as_ref(),
                approach: Some((approach, approach_count)),
                strategy: Some((strategy, strategy_count)),
                offense_synergy: Some(&offense_synergy),
                defense_synergy: Some(&defense_synergy),
                extra_modifiers,
            };
            atbat::resolve(&ctx, &mut self.rng, &mut self.trace)
        };
        let outcome = result.outcome;

        // Apply the outcome to the bases and the outs counter.
        let advance = self.bases.apply(outcome, &batter.id);
        self.bases.verify().map_err(|error| self.fail(error))?;
        if advance.out {
            self.outs += 1;
        }
        if self.outs > OUTS_PER_HALF {
            return Err(self.fail(EngineError::InvariantViolation(format!(
                "outs counter reached {}",
                self.outs
            ))));
        }

        // Extra-base attempts on singles and doubles, while the half lives.
        let baserunning = {
            let defense_glove = {
                let defense = &self.sides.select(fielding_sel).batters;
                crate::pipeline::defense_glove(defense, batter_ctx.as_ref())
            };
            let offense = &self.sides.select(batting_sel).batters;
            baserunning::resolve_extra_bases(
                outcome,
                &mut self.bases,
                offense,
                defense_glove,
                self.outs,
                &mut self.rng,
                &mut self.trace,
            )
        };
        let runs_this_play = advance.runs + baserunning.runs;

        self.settle_accounting(
            batting_sel,
            fielding_sel,
            batter_idx,
            pitcher_idx,
            outcome,
            &advance.scored,
            &baserunning.scored,
            advance.runs,
            runs_this_play,
            advance.out,
        );

        let description = self.narrate(
            &batter,
            outcome,
            runs_this_play,
            &advance.scored,
            &baserunning.scored,
            baserunning.thrown_out.as_ref(),
        );
        self.play_by_play.push(description.clone());

        self.trace
            .finish_at_bat(outcome, runs_this_play, self.bases.occupancy(), self.outs);
        self.at_bat_index += 1;
        self.sides.select_mut(batting_sel).batting_index += 1;

        if advance.out {
            self.check_substitution(fielding_sel);
        }
        if self.outs >= OUTS_PER_HALF {
            self.end_half();
        }

        Ok(StepReport {
            outcome,
            clash_occurred: result.clash_occurred,
            description,
            finished: self.finished,
        })
    }

    /// Settles score, box-score lines, spirit momentum, fatigue accrual, and
    /// the fielding side's traffic counter for one resolved play.
    #[allow(clippy::too_many_arguments)]
    fn settle_accounting(
        &mut self,
        batting_sel: TeamSelect,
        fielding_sel: TeamSelect,
        batter_idx: usize,
        pitcher_idx: usize,
        outcome: AtBatOutcome,
        advance_scored: &[PlayerId],
        extra_scored: &[PlayerId],
        rbi: u32,
        runs_this_play: u32,
        out_recorded: bool,
    ) {
        {
            let offense = self.sides.select_mut(batting_sel);
            offense.runs += runs_this_play;
            let line = &mut offense.batting_lines[batter_idx];
            if outcome.counts_as_at_bat() {
                line.at_bats += 1;
            }
            if outcome.is_hit() {
                line.hits += 1;
                offense.hits += 1;
            }
            match outcome {
                AtBatOutcome::Strikeout => line.strikeouts += 1,
                AtBatOutcome::Walk => line.walks += 1,
                _ => {}
            }
            line.rbi += rbi;
            for scorer in advance_scored.iter().chain(extra_scored) {
                if let Some(slot) = offense.batters.iter().position(|p| &p.id == scorer) {
                    offense.batting_lines[slot].runs += 1;
                }
            }

            // Spirit momentum, batter side.
            let delta = batter_spirit_delta(outcome, rbi);
            offense.batters[batter_idx].spirit.add(delta);
            let team_on_run = 2 * runs_this_play as i32;
            if team_on_run > 0 {
                for teammate in &mut offense.batters {
                    teammate.spirit.add(team_on_run);
                }
            }
            self.trace.spirit_delta(SpiritDelta {
                batter: delta,
                pitcher: pitcher_spirit_delta(outcome, runs_this_play),
                team_on_run,
            });
        }
        self.half_runs += runs_this_play;
        if outcome.is_hit() {
            self.half_hits += 1;
        }

        let defense = self.sides.select_mut(fielding_sel);
        let line = &mut defense.pitching_lines[pitcher_idx];
        if outcome.counts_as_at_bat() {
            line.at_bats_allowed += 1;
        }
        if outcome.is_hit() {
            line.hits_allowed += 1;
        }
        match outcome {
            AtBatOutcome::Strikeout => line.strikeouts += 1,
            AtBatOutcome::Walk => line.walks_allowed += 1,
            _ => {}
        }
        line.runs_allowed += runs_this_play;
        if out_recorded {
            line.outs_recorded += 1;
            defense.pitcher_outs[pitcher_idx] += 1;
            defense.consecutive_baserunners = 0;
        } else {
            defense.consecutive_baserunners += 1;
        }

        // Stressful innings wear faster than clean ones.
        let extra = match outcome {
            AtBatOutcome::Walk => 0.05,
            _ if outcome.is_hit() => 0.05,
            _ => 0.0,
        } + 0.1 * f64::from(runs_this_play);
        defense.extra_fatigue[pitcher_idx] += extra;

        defense.pitchers[pitcher_idx]
            .spirit
            .add(pitcher_spirit_delta(outcome, runs_this_play));
    }

    fn repertoire_penalty(&self, fielding_sel: TeamSelect, pitcher: &Player) -> OutcomeBonuses {
        let side = self.sides.select(fielding_sel);
        let has_repertoire = pitcher
            .techniques
            .iter()
            .any(|technique| technique.ability == "repertoire");
        if !has_repertoire {
            return OutcomeBonuses::default();
        }
        let signature = pitcher.techniques.first().map(|t| &t.ability);
        let stale = match (&side.previous_pitcher_technique, signature) {
            (Some(previous), Some(current)) => previous == current,
            _ => false,
        };
        if stale {
            // The lineup has already seen this look; the bonus is cancelled.
            OutcomeBonuses {
                strikeout: -ability::repertoire_bonus(),
                ..OutcomeBonuses::default()
            }
        } else {
            OutcomeBonuses::default()
        }
    }

    fn activate(
        &mut self,
        side_sel: TeamSelect,
        slot: ActorSlot,
        requested: Option<&AbilityId>,
    ) -> Option<ActiveAbilityContext> {
        let any_runner_on = self.bases.occupied_count() > 0;
        let side = self.sides.select_mut(side_sel);
        let (player, bundle) = match slot {
            ActorSlot::Batter(idx) => (&mut side.batters[idx], side.batter_bundles[idx].clone()),
            ActorSlot::Pitcher(idx) => (&mut side.pitchers[idx], side.pitcher_bundles[idx].clone()),
        };

        let chosen = match requested {
            Some(id) => match ability::lookup(id) {
                Some(ability) => Some(ability),
                None => {
                    let message = format!("requested unknown ability {id}; ignoring");
                    tracing::warn!("{message}");
                    self.trace.warning(message);
                    return bundle;
                }
            },
            // Auto policy: spend spirit when there is traffic to leverage.
            None if any_runner_on => player
                .techniques
                .iter()
                .filter_map(|technique| ability::lookup(&technique.ability))
                .find(|ability| {
                    !ability.is_passive
                        && player.spirit.can_pay(ability.spirit_cost)
                        && archetype_allows(ability, player)
                }),
            None => None,
        };

        let Some(ability) = chosen else {
            return bundle;
        };
        if ability.is_passive
            || !player
                .techniques
                .iter()
                .any(|technique| technique.ability == ability.id)
            || !archetype_allows(ability, player)
        {
            let message = format!(
                "{} cannot activate {}; falling back to passives",
                player.id, ability.id
            );
            tracing::warn!("{message}");
            self.trace.warning(message);
            return bundle;
        }
        if !player.spirit.pay(ability.spirit_cost) {
            return bundle;
        }
        Some(ActiveAbilityContext::from_ability(player, ability))
    }

    fn check_substitution(&mut self, fielding_sel: TeamSelect) {
        let inning = self.inning;
        let side = self.sides.select_mut(fielding_sel);
        if side.subbed_this_half || side.pitcher_index + 1 >= side.pitchers.len() {
            return;
        }
        let fatigued = side.innings_pitched_effective() >= 4.5;
        let traffic = side.consecutive_baserunners >= 3;
        let due = match side.pitcher_index {
            // Starter works until the fifth at the earliest.
            0 => inning >= 5 && (fatigued || traffic),
            // First reliever hands over from the seventh.
            1 => inning >= 7 && (side.innings_pitched_effective() >= 2.5 || traffic),
            _ => false,
        };
        if !due {
            return;
        }

        let outgoing = side.current_pitcher();
        let old_name = outgoing.name.clone();
        side.previous_pitcher_technique = outgoing.techniques.first().map(|t| t.ability.clone());
        side.pitcher_index += 1;
        side.subbed_this_half = true;
        side.consecutive_baserunners = 0;
        let new_name = side.current_pitcher().name.clone();
        let reason = if fatigued { "fatigue" } else { "traffic" };
        let team_name = side.name.clone();
        self.trace.event(GameEventTrace::PitcherChange {
            team: fielding_sel,
            old_name: old_name.clone(),
            new_name: new_name.clone(),
            reason: reason.to_owned(),
        });
        self.play_by_play.push(format!(
            "{new_name} takes the mound for {team_name} ({reason}), replacing {old_name}.",
        ));
    }

    fn end_half(&mut self) {
        self.trace.event(GameEventTrace::InningEnd {
            inning: self.inning,
            half: self.half,
            runs: self.half_runs,
            hits: self.half_hits,
        });
        self.play_by_play.push(format!(
            "End of the {} of inning {}: {} runs on {} hits.",
            self.half.word().to_lowercase(),
            self.inning,
            self.half_runs,
            self.half_hits,
        ));

        self.outs = 0;
        self.bases.clear();
        self.half_runs = 0;
        self.half_hits = 0;
        self.half_started = false;
        for side in self.sides.iter_mut() {
            side.subbed_this_half = false;
            side.consecutive_baserunners = 0;
        }

        match self.half {
            Half::Top => self.half = Half::Bottom,
            Half::Bottom => {
                let score = self.score();
                if self.inning >= REGULATION_INNINGS && score.away != score.home {
                    self.finished = true;
                    self.total_innings = self.inning;
                    self.play_by_play.push(format!(
                        "Final: {} {}, {} {}.",
                        self.sides.away.name, score.away, self.sides.home.name, score.home,
                    ));
                } else {
                    self.inning += 1;
                    self.half = Half::Top;
                }
            }
        }
    }

    fn narrate(
        &self,
        batter: &Player,
        outcome: AtBatOutcome,
        runs: u32,
        advance_scored: &[PlayerId],
        extra_scored: &[PlayerId],
        thrown_out: Option<&PlayerId>,
    ) -> String {
        use std::fmt::Write;
        let mut line = match outcome {
            AtBatOutcome::Strikeout => format!("{} strikes out.", batter.name),
            AtBatOutcome::Walk => format!("{} draws a walk.", batter.name),
            AtBatOutcome::Single => format!("{} hits a single!", batter.name),
            AtBatOutcome::Double => format!("{} hits a double!", batter.name),
            AtBatOutcome::Triple => format!("{} hits a triple!", batter.name),
            AtBatOutcome::Homerun => {
                if runs <= 1 {
                    format!("{} hits a solo home run!", batter.name)
                } else {
                    format!("{} hits a {}-run home run!", batter.name, runs)
                }
            }
            AtBatOutcome::Groundout => format!("{} grounds out.", batter.name),
            AtBatOutcome::Flyout => format!("{} flies out.", batter.name),
            AtBatOutcome::Lineout => format!("{} lines out.", batter.name),
            AtBatOutcome::Popout => format!("{} pops out.", batter.name),
        };
        for scorer in advance_scored.iter().chain(extra_scored) {
            if outcome == AtBatOutcome::Homerun && scorer == &batter.id {
                continue;
            }
            let name = self.player_name(scorer);
            write!(line, " {name} scores!").expect("writing to a String cannot fail");
        }
        if let Some(runner) = thrown_out {
            let name = self.player_name(runner);
            write!(line, " {name} is thrown out stretching!")
                .expect("writing to a String cannot fail");
        }
        line
    }

    fn player_name(&self, id: &PlayerId) -> String {
        self.sides
            .iter()
            .flat_map(|side| side.batters.iter().chain(&side.pitchers))
            .find(|player| &player.id == id)
            .map_or_else(|| id.to_string(), |player| player.name.clone())
    }

    /// Closes the books: rewards, box score, and the trace log.
    pub fn finalize(self, rewards: &RewardConfig, level: u32) -> Result<MatchResult, SimFailure> {
        if !self.finished {
            return Err(self.fail(EngineError::InvariantViolation(
                "finalize called before the game ended".into(),
            )));
        }
        let score = self.score();
        let my_runs = score.home;
        let opponent_runs = score.away;
        let is_win = my_runs > opponent_runs;
        let base_cash = rewards.base
            + rewards.per_run * my_runs
            + if is_win { rewards.win_bonus } else { 0 };
        let level_scale = 1.0 + 0.05 * f64::from(level.saturating_sub(1));
        let cash_earned = (f64::from(base_cash) * level_scale).round() as u32;

        let box_score = BoxScore {
            away: self.sides.away.box_score(),
            home: self.sides.home.box_score(),
        };
        let total_innings = self.total_innings;
        let trace_log = if self.trace.is_enabled() {
            Some(self.trace.into_log(score, total_innings))
        } else {
            None
        };
        Ok(MatchResult {
            my_runs,
            opponent_runs,
            is_win,
            cash_earned,
            total_innings,
            box_score,
            play_by_play: self.play_by_play,
            loot_drops: None,
            trace_log,
        })
    }
}

enum ActorSlot {
    Batter(usize),
    Pitcher(usize),
}

fn archetype_allows(ability: &crate::ability::Ability, player: &Player) -> bool {
    match ability.required_archetype {
        Some(required) => player.archetype == Some(required),
        None => true,
    }
}

/// Fixed momentum table, batter side. RBIs ride on top of the outcome base.
fn batter_spirit_delta(outcome: AtBatOutcome, rbi: u32) -> i32 {
    let base = match outcome {
        AtBatOutcome::Single => 4,
        AtBatOutcome::Double => 6,
        AtBatOutcome::Triple => 8,
        AtBatOutcome::Homerun => 10,
        AtBatOutcome::Walk => 2,
        AtBatOutcome::Strikeout => -3,
        AtBatOutcome::Groundout
        | AtBatOutcome::Flyout
        | AtBatOutcome::Lineout
        | AtBatOutcome::Popout => 0,
    };
    base + 3 * rbi as i32
}

/// Fixed momentum table, pitcher side. A home run costs its own entry, not
/// the generic hit penalty; runs stack on top.
fn pitcher_spirit_delta(outcome: AtBatOutcome, runs_allowed: u32) -> i32 {
    let base = match outcome {
        AtBatOutcome::Strikeout => 5,
        AtBatOutcome::Groundout
        | AtBatOutcome::Flyout
        | AtBatOutcome::Lineout
        | AtBatOutcome::Popout => 2,
        AtBatOutcome::Homerun => -8,
        AtBatOutcome::Single | AtBatOutcome::Double | AtBatOutcome::Triple => -2,
        AtBatOutcome::Walk => -3,
    };
    base - 5 * runs_allowed as i32
}

/// Batch simulation: drives the interactive engine to completion with the
/// auto policy and default rewards at level 1.
pub fn simulate(home: &Team, away: &Team, options: SimOptions) -> Result<MatchResult, SimFailure> {
    let mut sim = MatchSim::new(home, away, options)?;
    while !sim.is_finished() {
        if sim.inning > MAX_INNINGS {
            return Err(sim.fail(EngineError::InvariantViolation(format!(
                "game still tied after {MAX_INNINGS} innings"
            ))));
        }
        sim.step_at_bat(&Decisions::default())?;
    }
    sim.finalize(&RewardConfig::default(), 1)
}

#[cfg(test)]
mod tests {
    use super::{batter_spirit_delta, pitcher_spirit_delta, simulate, Decisions, MatchSim, SimOptions};
    use crate::game::AtBatOutcome;
    use crate::player::{BatterStats, PitcherStats, Player, Role, Spirit};
    use crate::team::Team;

    pub(crate) fn test_player(id: &str, role: Role, power: f64, contact: f64) -> Player {
        Player {
            id: id.into(),
            name: id.to_owned(),
            role,
            batting: BatterStats {
                power,
                contact,
                glove: 50.0,
                speed: 50.0,
            },
            pitching: PitcherStats {
                velocity: 55.0,
                control: 55.0,
                breaking: 50.0,
            },
            archetype: None,
            techniques: Vec::new(),
            equipment: Default::default(),
            spirit: Spirit::for_level(1),
            traits: Default::default(),
            level: 1,
        }
    }

    pub(crate) fn test_team(prefix: &str) -> Team {
        let mut roster = Vec::new();
        let mut lineup = Vec::new();
        for i in 0..9 {
            let id = format!("{prefix}-b{i}");
            roster.push(test_player(&id, Role::Batter, 45.0 + 3.0 * f64::from(i), 50.0));
            lineup.push(id.into());
        }
        let mut pitchers = Vec::new();
        for (i, role) in [Role::Starter, Role::Reliever, Role::Reliever]
            .into_iter()
            .enumerate()
        {
            let id = format!("{prefix}-p{i}");
            roster.push(test_player(&id, role, 30.0, 30.0));
            pitchers.push(id.into());
        }
        Team {
            id: prefix.into(),
            name: prefix.to_owned(),
            colors: Default::default(),
            roster,
            lineup,
            pitchers,
        }
    }

    #[test]
    fn spirit_momentum_table() {
        assert_eq!(batter_spirit_delta(AtBatOutcome::Single, 0), 4);
        assert_eq!(batter_spirit_delta(AtBatOutcome::Homerun, 2), 16);
        assert_eq!(batter_spirit_delta(AtBatOutcome::Strikeout, 0), -3);
        assert_eq!(batter_spirit_delta(AtBatOutcome::Groundout, 0), 0);
        assert_eq!(pitcher_spirit_delta(AtBatOutcome::Strikeout, 0), 5);
        assert_eq!(pitcher_spirit_delta(AtBatOutcome::Flyout, 0), 2);
        assert_eq!(pitcher_spirit_delta(AtBatOutcome::Single, 1), -7);
        assert_eq!(pitcher_spirit_delta(AtBatOutcome::Homerun, 1), -13);
        assert_eq!(pitcher_spirit_delta(AtBatOutcome::Walk, 0), -3);
    }

    #[test]
    fn seeded_games_are_reproducible() {
        let home = test_team("home");
        let away = test_team("away");
        let options = SimOptions {
            seed: Some(424_242),
            enable_trace: false,
        };
        let first = simulate(&home, &away, options).unwrap();
        let second = simulate(&home, &away, options).unwrap();
        assert_eq!(first, second);
        assert!(first.total_innings >= 9);
    }

    #[test]
    fn interactive_stepping_matches_batch() {
        let home = test_team("home");
        let away = test_team("away");
        let options = SimOptions {
            seed: Some(20_260_801),
            enable_trace: false,
        };
        let batch = simulate(&home, &away, options).unwrap();

        let mut sim = MatchSim::new(&home, &away, options).unwrap();
        while !sim.is_finished() {
            sim.step_at_bat(&Decisions::default()).unwrap();
        }
        let interactive = sim
            .finalize(&super::RewardConfig::default(), 1)
            .unwrap();
        assert_eq!(batch, interactive);
    }

    #[test]
    fn score_matches_traced_runs_and_box_score() {
        let home = test_team("home");
        let away = test_team("away");
        let result = simulate(
            &home,
            &away,
            SimOptions {
                seed: Some(77),
                enable_trace: true,
            },
        )
        .unwrap();
        let trace = result.trace_log.as_ref().unwrap();

        let traced_runs: u32 = trace.at_bats.iter().map(|at_bat| at_bat.runs_scored).sum();
        assert_eq!(traced_runs, result.my_runs + result.opponent_runs);
        assert_eq!(trace.final_score.home, result.my_runs);
        assert_eq!(trace.final_score.away, result.opponent_runs);

        // Box score internal consistency: runs credited equal runs scored,
        // and at-bats equal the at-bats pitchers recorded against that side.
        for (team, opponents, runs) in [
            (&result.box_score.away, &result.box_score.home, result.opponent_runs),
            (&result.box_score.home, &result.box_score.away, result.my_runs),
        ] {
            let batter_runs: u32 = team.batting.iter().map(|(_, line)| line.runs).sum();
            assert_eq!(batter_runs, runs);
            let at_bats: u32 = team.batting.iter().map(|(_, line)| line.at_bats).sum();
            let allowed: u32 = opponents
                .pitching
                .iter()
                .map(|(_, line)| line.at_bats_allowed)
                .sum();
            assert_eq!(at_bats, allowed);
        }
    }

    #[test]
    fn finalize_before_the_end_is_an_invariant_violation() {
        let home = test_team("home");
        let away = test_team("away");
        let sim = MatchSim::new(&home, &away, SimOptions::default()).unwrap();
        let failure = sim
            .finalize(&super::RewardConfig::default(), 1)
            .unwrap_err();
        assert!(matches!(
            failure.error,
            crate::error::EngineError::InvariantViolation(_)
        ));
    }

    #[test]
    fn invalid_roster_is_rejected_up_front() {
        let home = test_team("home");
        let mut away = test_team("away");
        away.pitchers.clear();
        let failure = MatchSim::new(&home, &away, SimOptions::default()).unwrap_err();
        assert!(matches!(
            failure.error,
            crate::error::EngineError::InvalidRoster { .. }
        ));
    }

    #[test]
    fn games_run_at_least_nine_innings_and_never_end_tied() {
        let home = test_team("home");
        let away = test_team("away");
        for seed in 0..30 {
            let result = simulate(
                &home,
                &away,
                SimOptions {
                    seed: Some(seed),
                    enable_trace: false,
                },
            )
            .unwrap();
            assert!(result.total_innings >= 9, "seed {seed}");
            assert_ne!(result.my_runs, result.opponent_runs, "seed {seed}");
        }
    }

    #[test]
    fn at_most_one_pitcher_change_per_half_inning() {
        let home = test_team("home");
        let away = test_team("away");
        let result = simulate(
            &home,
            &away,
            SimOptions {
                seed: Some(9),
                enable_trace: true,
            },
        )
        .unwrap();
        let trace = result.trace_log.unwrap();
        use crate::trace::GameEventTrace;
        let mut changes_this_half = 0;
        for event in &trace.events {
            match event {
                GameEventTrace::InningStart { .. } => changes_this_half = 0,
                GameEventTrace::PitcherChange { .. } => {
                    changes_this_half += 1;
                    assert!(changes_this_half <= 1);
                }
                GameEventTrace::InningEnd { .. } => {}
            }
        }
    }

    #[test]
    fn spirit_stays_within_bounds_all_game() {
        let home = test_team("home");
        let away = test_team("away");
        let mut sim = MatchSim::new(
            &home,
            &away,
            SimOptions {
                seed: Some(5),
                enable_trace: false,
            },
        )
        .unwrap();
        while !sim.is_finished() {
            sim.step_at_bat(&Decisions::default()).unwrap();
            for side in sim.sides.iter() {
                for player in side.batters.iter().chain(&side.pitchers) {
                    assert!(player.spirit.current >= 0);
                    assert!(player.spirit.current <= player.spirit.max);
                }
            }
        }
    }
}
