use crate::ability::{self, ActiveAbilityContext, OutcomeBonuses, OutcomeChance};
use crate::approach::{Approach, PitchStrategy};
use crate::game::AtBatOutcome;
use crate::pipeline;
use crate::player::Player;
use crate::rng::RandomSource;
use crate::synergy::SideSynergies;
use crate::trace::{ClashSide, ResolutionTrace, TraceRecorder};

/// Everything the resolver needs for one plate appearance. Stat blocks are
/// raw player state; the resolver runs the pipeline itself so the trace sees
/// every layer.
pub struct AtBatContext<'a> {
    pub batter: &'a Player,
    pub pitcher: &'a Player,
    pub defense: &'a [Player],
    /// Effective innings pitched: recorded thirds plus the extra-fatigue
    /// accumulator.
    pub innings_pitched: f64,
    pub batter_ability: Option<&'a ActiveAbilityContext>,
    pub pitcher_ability: Option<&'a ActiveAbilityContext>,
    pub approach: Option<(Approach, u32)>,
    pub strategy: Option<(PitchStrategy, u32)>,
    pub offense_synergy: Option<&'a SideSynergies>,
    pub defense_synergy: Option<&'a SideSynergies>,
    pub extra_modifiers: OutcomeBonuses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtBatResult {
    pub outcome: AtBatOutcome,
    pub clash_occurred: bool,
}

/// Out-type split when a ball in play fails the hit thresholds, as
/// cumulative weights over one roll.
const OUT_TYPE_WEIGHTS: [(AtBatOutcome, f64); 4] = [
    (AtBatOutcome::Groundout, 0.45),
    (AtBatOutcome::Flyout, 0.35),
    (AtBatOutcome::Lineout, 0.12),
    (AtBatOutcome::Popout, 0.08),
];

/// `total_eclipse` resolves over this fixed table in both the clash-winner
/// and pitcher-only paths, regardless of its declared distribution.
const TOTAL_ECLIPSE_TABLE: [OutcomeChance; 3] = [
    OutcomeChance {
        outcome: AtBatOutcome::Strikeout,
        chance: 80.0,
    },
    OutcomeChance {
        outcome: AtBatOutcome::Walk,
        chance: 15.0,
    },
    OutcomeChance {
        outcome: AtBatOutcome::Single,
        chance: 5.0,
    },
];

/// Resolves one at-bat. Never errors: malformed distributions are repaired
/// (or dropped) and the resolver always lands on a valid outcome. Roll order
/// is part of the observable contract; see the branch bodies.
pub fn resolve(
    ctx: &AtBatContext<'_>,
    rng: &mut RandomSource,
    trace: &mut TraceRecorder,
) -> AtBatResult {
    let batter_guaranteed = guaranteed_distribution(ctx.batter_ability, trace);
    let pitcher_guaranteed = guaranteed_distribution(ctx.pitcher_ability, trace);

    match (batter_guaranteed, pitcher_guaranteed) {
        (Some(batter_dist), Some(pitcher_dist)) => {
            resolve_clash(ctx, &batter_dist, &pitcher_dist, rng, trace)
        }
        (Some(batter_dist), None) => {
            let outcome = roll_guaranteed(&batter_dist, rng, trace, "guaranteedOutcome");
            trace.resolution(ResolutionTrace::GuaranteedBatter { outcome });
            AtBatResult {
                outcome,
                clash_occurred: false,
            }
        }
        (None, Some(pitcher_dist)) => {
            let dist = pitcher_table(ctx, &pitcher_dist);
            let outcome = roll_guaranteed(dist, rng, trace, "guaranteedOutcome");
            trace.resolution(ResolutionTrace::GuaranteedPitcher { outcome });
            AtBatResult {
                outcome,
                clash_occurred: false,
            }
        }
        (None, None) => resolve_normal(ctx, rng, trace),
    }
}

fn guaranteed_distribution(
    ability: Option<&ActiveAbilityContext>,
    trace: &mut TraceRecorder,
) -> Option<Vec<OutcomeChance>> {
    let ctx = ability?;
    let raw = ctx.guaranteed()?;
    let repaired = ability::repair_distribution(&ctx.ability_id, raw, trace);
    if repaired.is_empty() {
        None
    } else {
        Some(repaired)
    }
}

fn is_total_eclipse(ctx: &AtBatContext<'_>) -> bool {
    ctx.pitcher_ability
        .is_some_and(|ability| ability.ability_id == "total_eclipse")
}

fn pitcher_table<'d>(ctx: &AtBatContext<'_>, declared: &'d [OutcomeChance]) -> &'d [OutcomeChance] {
    if is_total_eclipse(ctx) {
        &TOTAL_ECLIPSE_TABLE
    } else {
        declared
    }
}

fn roll_guaranteed(
    distribution: &[OutcomeChance],
    rng: &mut RandomSource,
    trace: &mut TraceRecorder,
    label: &str,
) -> AtBatOutcome {
    let raw = rng.next_f64();
    let scaled = raw * 100.0;
    trace.roll(label, raw, scaled, None, None);
    ability::roll_distribution(distribution, scaled).unwrap_or(AtBatOutcome::Groundout)
}

/// Both sides brought a guaranteed outcome: contested power-weighted rolls,
/// higher wins, batter wins ties. The loser's ability is negated outright.
///
/// Roll order: batter power roll, pitcher power roll, then the winner's
/// outcome roll.
fn resolve_clash(
    ctx: &AtBatContext<'_>,
    batter_dist: &[OutcomeChance],
    pitcher_dist: &[OutcomeChance],
    rng: &mut RandomSource,
    trace: &mut TraceRecorder,
) -> AtBatResult {
    let batter_power = ability::clash_power(batter_dist);
    let pitcher_power = ability::clash_power(pitcher_dist);

    let batter_raw = rng.next_f64();
    let batter_roll = batter_raw * batter_power;
    trace.roll("clashBatterPower", batter_raw, batter_roll, None, None);

    let pitcher_raw = rng.next_f64();
    let pitcher_roll = pitcher_raw * pitcher_power;
    trace.roll("clashPitcherPower", pitcher_raw, pitcher_roll, None, None);

    let batter_wins = batter_roll >= pitcher_roll;
    let outcome = if batter_wins {
        roll_guaranteed(batter_dist, rng, trace, "clashOutcome")
    } else {
        roll_guaranteed(pitcher_table(ctx, pitcher_dist), rng, trace, "clashOutcome")
    };
    trace.resolution(ResolutionTrace::Clash {
        winner: if batter_wins {
            ClashSide::Batter
        } else {
            ClashSide::Pitcher
        },
        batter_roll,
        pitcher_roll,
    });
    AtBatResult {
        outcome,
        clash_occurred: true,
    }
}

/// The stat-based path. Roll order: strikeout check, walk check, hit
/// quality, then one out-type roll only when the ball in play fails the hit
/// thresholds.
fn resolve_normal(
    ctx: &AtBatContext<'_>,
    rng: &mut RandomSource,
    trace: &mut TraceRecorder,
) -> AtBatResult {
    let batter_layers = pipeline::effective_batter(
        ctx.batter,
        ctx.offense_synergy,
        ctx.approach,
        ctx.batter_ability,
    );
    let pitcher_layers = pipeline::effective_pitcher(
        ctx.pitcher,
        ctx.innings_pitched,
        ctx.defense_synergy,
        ctx.strategy,
        ctx.pitcher_ability,
    );
    let glove = pipeline::defense_glove(ctx.defense, ctx.batter_ability);
    trace.stage_batter(batter_layers);
    trace.stage_pitcher(pitcher_layers);
    trace.stage_defense(glove);

    let batter = batter_layers.effective();
    let pitcher = pitcher_layers.effective();
    let mods = accumulate_modifiers(ctx);
    trace.modifier_totals(mods);

    // Strikeout check.
    let strikeout_chance = ((pitcher.velocity + pitcher.breaking + pitcher.control * 0.4
        - batter.contact)
        / 1.8
        + mods.strikeout)
        .max(0.0);
    let raw = rng.next_f64();
    let scaled = raw * 100.0;
    let struck_out = scaled < strikeout_chance;
    trace.roll(
        "strikeoutCheck",
        raw,
        scaled,
        Some(strikeout_chance),
        Some(struck_out),
    );
    if struck_out {
        trace.resolution(ResolutionTrace::Normal);
        return AtBatResult {
            outcome: AtBatOutcome::Strikeout,
            clash_occurred: false,
        };
    }

    // Walk check.
    let wildness = (100.0 - pitcher.control) / 12.0;
    let discipline = ((batter.contact - 40.0) / 20.0).max(0.0);
    let walk_chance = (wildness + discipline + mods.walk).max(0.0);
    let raw = rng.next_f64();
    let scaled = raw * 100.0;
    let walked = scaled < walk_chance;
    trace.roll("walkCheck", raw, scaled, Some(walk_chance), Some(walked));
    if walked {
        trace.resolution(ResolutionTrace::Normal);
        return AtBatResult {
            outcome: AtBatOutcome::Walk,
            clash_occurred: false,
        };
    }

    // Ball in play.
    let batter_score = batter.power + batter.contact;
    let pitcher_score = pitcher.velocity + pitcher.breaking + pitcher.control;
    let net_score = (batter_score * 1.2 - pitcher_score * 0.9 - glove * 0.8).clamp(-15.0, 15.0)
        + mods.hit;

    let raw = rng.next_f64();
    let hit_roll = raw * 100.0 + net_score + (batter.power - 50.0) * 0.15 + mods.homerun;
    trace.roll("hitQuality", raw, hit_roll, None, None);

    let outcome = if hit_roll > 98.0 {
        AtBatOutcome::Homerun
    } else if hit_roll > 95.0 {
        AtBatOutcome::Triple
    } else if hit_roll > 85.0 {
        AtBatOutcome::Double
    } else if hit_roll > 55.0 {
        AtBatOutcome::Single
    } else {
        roll_out_type(rng, trace)
    };
    trace.resolution(ResolutionTrace::Normal);
    AtBatResult {
        outcome,
        clash_occurred: false,
    }
}

fn roll_out_type(rng: &mut RandomSource, trace: &mut TraceRecorder) -> AtBatOutcome {
    let raw = rng.next_f64();
    trace.roll("outType", raw, raw, None, None);
    let mut threshold = 0.0;
    for (outcome, weight) in OUT_TYPE_WEIGHTS {
        threshold += weight;
        if raw < threshold {
            return outcome;
        }
    }
    OUT_TYPE_WEIGHTS[OUT_TYPE_WEIGHTS.len() - 1].0
}

fn accumulate_modifiers(ctx: &AtBatContext<'_>) -> OutcomeBonuses {
    let mut mods = OutcomeBonuses::default();
    if let Some(ability) = ctx.batter_ability {
        mods = mods.plus(ability.outcome_bonuses());
    }
    if let Some(ability) = ctx.pitcher_ability {
        mods = mods.plus(ability.outcome_bonuses());
    }
    if let Some(synergy) = ctx.offense_synergy {
        mods = mods.plus(synergy.outcome_modifiers);
    }
    if let Some(synergy) = ctx.defense_synergy {
        mods = mods.plus(synergy.outcome_modifiers);
    }
    if let Some((approach, _)) = ctx.approach {
        mods = mods.plus(approach.outcome_bonuses());
    }
    if let Some((strategy, _)) = ctx.strategy {
        mods = mods.plus(strategy.outcome_bonuses());
    }
    mods.plus(ctx.extra_modifiers)
}

#[cfg(test)]
mod tests {
    use super::{resolve, AtBatContext, AtBatResult};
    use crate::ability::{self, ActiveAbilityContext, OutcomeBonuses};
    use crate::game::AtBatOutcome;
    use crate::player::{BatterStats, PitcherStats, Player, Role, Spirit};
    use crate::rng::RandomSource;
    use crate::trace::{ClashSide, ResolutionTrace, TraceRecorder};

    fn player(id: &str, role: Role) -> Player {
        Player {
            id: id.into(),
            name: id.to_owned(),
            role,
            batting: BatterStats {
                power: 50.0,
                contact: 50.0,
                glove: 50.0,
                speed: 50.0,
            },
            pitching: PitcherStats {
                velocity: 50.0,
                control: 50.0,
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

    fn ability_ctx(player: &Player, id: &str) -> ActiveAbilityContext {
        let ability = ability::lookup(&id.into()).unwrap();
        ActiveAbilityContext::from_ability(player, ability)
    }

    struct Fixture {
        batter: Player,
        pitcher: Player,
        defense: Vec<Player>,
    }

    impl Fixture {
        fn new() -> Fixture {
            Fixture {
                batter: player("batter", Role::Batter),
                pitcher: player("pitcher", Role::Starter),
                defense: (0..9)
                    .map(|i| player(&format!("fielder{i}"), Role::Batter))
                    .collect(),
            }
        }

        fn ctx(&self) -> AtBatContext<'_> {
            AtBatContext {
                batter: &self.batter,
                pitcher: &self.pitcher,
                defense: &self.defense,
                innings_pitched: 0.0,
                batter_ability: None,
                pitcher_ability: None,
                approach: None,
                strategy: None,
                offense_synergy: None,
                defense_synergy: None,
                extra_modifiers: OutcomeBonuses::default(),
            }
        }
    }

    fn resolve_scripted(ctx: &AtBatContext<'_>, script: Vec<f64>) -> AtBatResult {
        let mut rng = RandomSource::scripted(script);
        let mut trace = TraceRecorder::disabled();
        resolve(ctx, &mut rng, &mut trace)
    }

    #[test]
    fn low_roll_strikes_out() {
        let fixture = Fixture::new();
        // K chance with all-50s is (50 + 50 + 20 - 50) / 1.8 = 38.9.
        let result = resolve_scripted(&fixture.ctx(), vec![0.1]);
        assert_eq!(result.outcome, AtBatOutcome::Strikeout);
        assert!(!result.clash_occurred);
    }

    #[test]
    fn walk_fires_after_the_strikeout_check() {
        let fixture = Fixture::new();
        // Walk chance with all-50s is 50/12 + 10/20 = 4.67.
        let result = resolve_scripted(&fixture.ctx(), vec![0.9, 0.01]);
        assert_eq!(result.outcome, AtBatOutcome::Walk);
    }

    #[test]
    fn hit_quality_thresholds_map_to_hit_types() {
        let mut fixture = Fixture::new();
        // Max out the batter and zero the opposition so netScore clamps to
        // +15 and the power term adds 7.5: hitRoll = r*100 + 22.5.
        fixture.batter.batting = BatterStats {
            power: 100.0,
            contact: 100.0,
            glove: 50.0,
            speed: 50.0,
        };
        fixture.pitcher.pitching = PitcherStats::default();
        for fielder in &mut fixture.defense {
            fielder.batting.glove = 0.0;
        }
        let cases = [
            (0.80, AtBatOutcome::Homerun),
            (0.74, AtBatOutcome::Triple),
            (0.65, AtBatOutcome::Double),
            (0.40, AtBatOutcome::Single),
        ];
        for (roll, expected) in cases {
            // Strikeout chance clamps at 0 and walk chance is 11.33, so 0.5
            // clears both checks.
            let result = resolve_scripted(&fixture.ctx(), vec![0.5, 0.5, roll]);
            assert_eq!(result.outcome, expected, "roll {roll}");
        }
    }

    #[test]
    fn out_type_weights_are_cumulative() {
        let fixture = Fixture::new();
        let cases = [
            (0.10, AtBatOutcome::Groundout),
            (0.50, AtBatOutcome::Flyout),
            (0.85, AtBatOutcome::Lineout),
            (0.95, AtBatOutcome::Popout),
        ];
        for (out_roll, expected) in cases {
            // 0.9/0.9 clears K and walk; 0.2 lands below the single line.
            let result = resolve_scripted(&fixture.ctx(), vec![0.9, 0.9, 0.2, out_roll]);
            assert_eq!(result.outcome, expected, "roll {out_roll}");
        }
    }

    #[test]
    fn normal_path_consumes_rolls_in_contract_order() {
        let fixture = Fixture::new();
        let mut trace = TraceRecorder::disabled();

        let mut rng = RandomSource::scripted(vec![0.9, 0.9, 0.2, 0.5]);
        resolve(&fixture.ctx(), &mut rng, &mut trace);
        let RandomSource::Scripted(script) = &rng else {
            unreachable!()
        };
        assert_eq!(script.call_count(), 4);

        let mut rng = RandomSource::scripted(vec![0.9, 0.9, 0.99]);
        resolve(&fixture.ctx(), &mut rng, &mut trace);
        let RandomSource::Scripted(script) = &rng else {
            unreachable!()
        };
        // A clean hit never rolls an out type.
        assert_eq!(script.call_count(), 3);
    }

    #[test]
    fn batter_only_guaranteed_resolves_its_distribution() {
        let fixture = Fixture::new();
        let moonshot = ability_ctx(&fixture.batter, "moonshot");
        let mut ctx = fixture.ctx();
        ctx.batter_ability = Some(&moonshot);
        let hr = resolve_scripted(&ctx, vec![0.10]);
        assert_eq!(hr.outcome, AtBatOutcome::Homerun);
        let k = resolve_scripted(&ctx, vec![0.90]);
        assert_eq!(k.outcome, AtBatOutcome::Strikeout);
    }

    #[test]
    fn clash_higher_roll_wins() {
        let fixture = Fixture::new();
        let moonshot = ability_ctx(&fixture.batter, "moonshot");
        let knuckleball = ability_ctx(&fixture.pitcher, "knuckleball");
        let mut ctx = fixture.ctx();
        ctx.batter_ability = Some(&moonshot);
        ctx.pitcher_ability = Some(&knuckleball);

        // batter 0.2 * 55 = 11 < pitcher 0.5 * 60 = 30: pitcher wins, and
        // knuckleball's residual folds into its only entry.
        let mut rng = RandomSource::scripted(vec![0.2, 0.5, 0.99]);
        let mut trace = TraceRecorder::enabled(None);
        trace.begin_at_bat(crate::trace::AtBatStart {
            index: 0,
            inning: 1,
            half: crate::game::Half::Top,
            batter: fixture.batter.id.clone(),
            pitcher: fixture.pitcher.id.clone(),
            bases_before: [false; 3],
            outs_before: 0,
        });
        let result = resolve(&ctx, &mut rng, &mut trace);
        assert_eq!(result.outcome, AtBatOutcome::Strikeout);
        assert!(result.clash_occurred);
        trace.finish_at_bat(result.outcome, 0, [false; 3], 1);
        let log = trace.into_log(Default::default(), 1);
        match &log.at_bats[0].resolution {
            ResolutionTrace::Clash {
                winner,
                batter_roll,
                pitcher_roll,
            } => {
                assert_eq!(*winner, ClashSide::Pitcher);
                assert!((batter_roll - 11.0).abs() < 1e-9);
                assert!((pitcher_roll - 30.0).abs() < 1e-9);
            }
            other => panic!("expected clash resolution, got {other:?}"),
        }

        // batter 0.9 * 55 = 49.5 > pitcher 0.5 * 60 = 30: batter wins and
        // rolls a homerun at 0.1.
        let result = resolve_scripted(&ctx, vec![0.9, 0.5, 0.1]);
        assert_eq!(result.outcome, AtBatOutcome::Homerun);
        assert!(result.clash_occurred);
    }

    #[test]
    fn clash_tie_goes_to_the_batter() {
        let fixture = Fixture::new();
        let batter_side = ability_ctx(&fixture.batter, "two_strike_assassin");
        let pitcher_side = ability_ctx(&fixture.pitcher, "two_strike_assassin");
        let mut ctx = fixture.ctx();
        ctx.batter_ability = Some(&batter_side);
        ctx.pitcher_ability = Some(&pitcher_side);
        // Equal powers and equal raw rolls tie at the same scaled value.
        let result = resolve_scripted(&ctx, vec![0.5, 0.5, 0.1]);
        assert_eq!(result.outcome, AtBatOutcome::Single);
        assert!(result.clash_occurred);
    }

    #[test]
    fn total_eclipse_uses_the_fixed_table() {
        let fixture = Fixture::new();
        let eclipse = ability_ctx(&fixture.pitcher, "total_eclipse");
        let mut ctx = fixture.ctx();
        ctx.pitcher_ability = Some(&eclipse);
        let cases = [
            (0.10, AtBatOutcome::Strikeout),
            (0.85, AtBatOutcome::Walk),
            (0.97, AtBatOutcome::Single),
        ];
        for (roll, expected) in cases {
            let result = resolve_scripted(&ctx, vec![roll]);
            assert_eq!(result.outcome, expected, "roll {roll}");
        }
    }

    #[test]
    fn extra_modifiers_shift_the_strikeout_chance() {
        let fixture = Fixture::new();
        let mut ctx = fixture.ctx();
        // Base K chance is 38.9; a roll of 0.45 misses it without help.
        let result = resolve_scripted(&fixture.ctx(), vec![0.45, 0.9, 0.9]);
        assert_ne!(result.outcome, AtBatOutcome::Strikeout);
        ctx.extra_modifiers = OutcomeBonuses {
            strikeout: 10.0,
            ..OutcomeBonuses::default()
        };
        let result = resolve_scripted(&ctx, vec![0.45]);
        assert_eq!(result.outcome, AtBatOutcome::Strikeout);
    }
}
