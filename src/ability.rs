use crate::game::AtBatOutcome;
use crate::id::{AbilityId, PlayerId};
use crate::player::{Archetype, BatterStats, PitcherStats, Player};
use crate::trace::TraceRecorder;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Ability id of the merged passive bundle carried through a whole game.
pub const PASSIVE_BUNDLE_ID: &str = "__passive_bundle__";

/// Additive nudges to the at-bat outcome checks, in percentage points.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeBonuses {
    pub strikeout: f64,
    pub walk: f64,
    pub homerun: f64,
    pub hit: f64,
}

impl OutcomeBonuses {
    pub fn plus(self, other: OutcomeBonuses) -> OutcomeBonuses {
        OutcomeBonuses {
            strikeout: self.strikeout + other.strikeout,
            walk: self.walk + other.walk,
            homerun: self.homerun + other.homerun,
            hit: self.hit + other.hit,
        }
    }
}

/// One entry of a guaranteed-outcome distribution; `chance` is in
/// percentage points and the whole vector is expected to sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeChance {
    pub outcome: AtBatOutcome,
    pub chance: f64,
}

/// The closed set of effect shapes an ability can carry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    StatModifier {
        #[serde(default)]
        batting: BatterStats,
        #[serde(default)]
        pitching: PitcherStats,
    },
    OutcomeModifier {
        #[serde(default)]
        bonuses: OutcomeBonuses,
    },
    GuaranteedOutcome {
        distribution: Vec<OutcomeChance>,
    },
    DefensiveBoost {
        glove: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ability {
    pub id: AbilityId,
    pub name: &'static str,
    pub is_passive: bool,
    pub spirit_cost: i32,
    pub required_archetype: Option<Archetype>,
    pub effects: Vec<AbilityEffect>,
}

/// A resolved effect bundle in play for one at-bat (or, for the passive
/// bundle, for the whole game).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAbilityContext {
    pub player_id: PlayerId,
    pub ability_id: AbilityId,
    pub effects: Vec<AbilityEffect>,
}

impl ActiveAbilityContext {
    pub fn from_ability(player: &Player, ability: &Ability) -> ActiveAbilityContext {
        ActiveAbilityContext {
            player_id: player.id.clone(),
            ability_id: ability.id.clone(),
            effects: ability.effects.clone(),
        }
    }

    /// Merges every passive technique the player owns into one pre-built
    /// bundle. Stat modifiers are scaled by technique rank here, because the
    /// stat pipeline folds them in at the technique layer and must see the
    /// same numbers. Unknown ability ids are warned about and skipped.
    pub fn passive_bundle(player: &Player, trace: &mut TraceRecorder) -> Option<ActiveAbilityContext> {
        let mut effects = Vec::new();
        for technique in &player.techniques {
            let Some(ability) = lookup(&technique.ability) else {
                let message = format!(
                    "{} owns unknown ability {}; skipping",
                    player.id, technique.ability
                );
                tracing::warn!("{message}");
                trace.warning(message);
                continue;
            };
            if !ability.is_passive {
                continue;
            }
            for effect in &ability.effects {
                effects.push(match effect {
                    AbilityEffect::StatModifier { batting, pitching } => {
                        let factor = technique.rank_factor();
                        AbilityEffect::StatModifier {
                            batting: batting.scaled(factor),
                            pitching: pitching.scaled(factor),
                        }
                    }
                    other => other.clone(),
                });
            }
        }
        if effects.is_empty() {
            None
        } else {
            Some(ActiveAbilityContext {
                player_id: player.id.clone(),
                ability_id: PASSIVE_BUNDLE_ID.into(),
                effects,
            })
        }
    }

    pub fn is_passive_bundle(&self) -> bool {
        self.ability_id == PASSIVE_BUNDLE_ID
    }

    /// First guaranteed-outcome distribution, if the bundle carries one.
    pub fn guaranteed(&self) -> Option<&[OutcomeChance]> {
        self.effects.iter().find_map(|effect| match effect {
            AbilityEffect::GuaranteedOutcome { distribution } => Some(distribution.as_slice()),
            _ => None,
        })
    }

    pub fn outcome_bonuses(&self) -> OutcomeBonuses {
        self.effects
            .iter()
            .fold(OutcomeBonuses::default(), |acc, effect| match effect {
                AbilityEffect::OutcomeModifier { bonuses } => acc.plus(*bonuses),
                _ => acc,
            })
    }

    pub fn batting_modifier(&self) -> BatterStats {
        self.effects
            .iter()
            .fold(BatterStats::default(), |acc, effect| match effect {
                AbilityEffect::StatModifier { batting, .. } => acc.plus(*batting),
                _ => acc,
            })
    }

    pub fn pitching_modifier(&self) -> PitcherStats {
        self.effects
            .iter()
            .fold(PitcherStats::default(), |acc, effect| match effect {
                AbilityEffect::StatModifier { pitching, .. } => acc.plus(*pitching),
                _ => acc,
            })
    }

    pub fn defensive_boost(&self) -> f64 {
        self.effects
            .iter()
            .map(|effect| match effect {
                AbilityEffect::DefensiveBoost { glove } => *glove,
                _ => 0.0,
            })
            .sum()
    }

    /// Whether this context suspends pitcher fatigue for the at-bat.
    pub fn negates_fatigue(&self) -> bool {
        self.ability_id == "time_warp" || self.ability_id == "iron_arm"
    }
}

/// Sum of the player's passive stat modifiers, rank-scaled. This is the
/// technique layer of the stat pipeline; active abilities are excluded here
/// and applied at the end of the pipeline instead.
pub fn passive_batting_modifiers(player: &Player) -> BatterStats {
    passive_stat_fold(player, BatterStats::default(), |acc, effect, factor| {
        match effect {
            AbilityEffect::StatModifier { batting, .. } => acc.plus(batting.scaled(factor)),
            _ => acc,
        }
    })
}

pub fn passive_pitching_modifiers(player: &Player) -> PitcherStats {
    passive_stat_fold(player, PitcherStats::default(), |acc, effect, factor| {
        match effect {
            AbilityEffect::StatModifier { pitching, .. } => acc.plus(pitching.scaled(factor)),
            _ => acc,
        }
    })
}

fn passive_stat_fold<T>(
    player: &Player,
    init: T,
    fold: impl Fn(T, &AbilityEffect, f64) -> T,
) -> T {
    let mut acc = init;
    for technique in &player.techniques {
        let Some(ability) = lookup(&technique.ability) else {
            continue;
        };
        if !ability.is_passive {
            continue;
        }
        for effect in &ability.effects {
            acc = fold(acc, effect, technique.rank_factor());
        }
    }
    acc
}

/// Clamps negative chances to zero, logging a trace warning when the
/// distribution needed repair. An empty distribution comes back empty; the
/// resolver treats that as no guaranteed outcome at all.
pub fn repair_distribution(
    ability: &AbilityId,
    raw: &[OutcomeChance],
    trace: &mut TraceRecorder,
) -> Vec<OutcomeChance> {
    if raw.is_empty() {
        let message = format!("ability {ability} has an empty outcome distribution");
        tracing::warn!("{message}");
        trace.warning(message);
        return Vec::new();
    }
    let mut repaired = Vec::with_capacity(raw.len());
    let mut clamped = false;
    for entry in raw {
        if entry.chance < 0.0 {
            clamped = true;
            repaired.push(OutcomeChance {
                outcome: entry.outcome,
                chance: 0.0,
            });
        } else {
            repaired.push(*entry);
        }
    }
    if clamped {
        let message = format!("ability {ability} has a negative outcome chance; clamped to 0");
        tracing::warn!("{message}");
        trace.warning(message);
    }
    repaired
}

/// Contested-roll weight of a guaranteed effect: the largest single-outcome
/// chance (the legacy single-outcome form's success chance falls out of this
/// definition).
pub fn clash_power(distribution: &[OutcomeChance]) -> f64 {
    distribution
        .iter()
        .map(|entry| entry.chance.max(0.0))
        .fold(0.0, f64::max)
}

/// Walks the distribution as an ordered thresholded sequence over a
/// `[0, 100)` roll; any residual past the declared chances lands on the last
/// entry.
pub fn roll_distribution(distribution: &[OutcomeChance], scaled_roll: f64) -> Option<AtBatOutcome> {
    let mut threshold = 0.0;
    for entry in distribution {
        threshold += entry.chance.max(0.0);
        if scaled_roll < threshold {
            return Some(entry.outcome);
        }
    }
    distribution.last().map(|entry| entry.outcome)
}

/// Static ability catalog, looked up by string id. Unknown ids are the
/// caller's problem to warn about; lookup itself is just `None`.
pub fn lookup(id: &AbilityId) -> Option<&'static Ability> {
    catalog().iter().find(|ability| &ability.id == id)
}

pub fn catalog() -> &'static [Ability] {
    static CATALOG: OnceLock<Vec<Ability>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

fn build_catalog() -> Vec<Ability> {
    use AbilityEffect::{DefensiveBoost, GuaranteedOutcome, OutcomeModifier, StatModifier};
    let chance = |outcome, chance| OutcomeChance { outcome, chance };
    vec![
        Ability {
            id: "moonshot".into(),
            name: "Moonshot",
            is_passive: false,
            spirit_cost: 12,
            required_archetype: Some(Archetype::Slugger),
            effects: vec![GuaranteedOutcome {
                distribution: vec![
                    chance(AtBatOutcome::Homerun, 55.0),
                    chance(AtBatOutcome::Strikeout, 45.0),
                ],
            }],
        },
        Ability {
            id: "two_strike_assassin".into(),
            name: "Two-Strike Assassin",
            is_passive: false,
            spirit_cost: 8,
            required_archetype: None,
            effects: vec![GuaranteedOutcome {
                distribution: vec![
                    chance(AtBatOutcome::Single, 70.0),
                    chance(AtBatOutcome::Double, 20.0),
                    chance(AtBatOutcome::Groundout, 10.0),
                ],
            }],
        },
        Ability {
            id: "zen_focus".into(),
            name: "Zen Focus",
            is_passive: false,
            spirit_cost: 6,
            required_archetype: None,
            effects: vec![OutcomeModifier {
                bonuses: OutcomeBonuses {
                    walk: 6.0,
                    strikeout: -3.0,
                    ..OutcomeBonuses::default()
                },
            }],
        },
        Ability {
            id: "knuckleball".into(),
            name: "Knuckleball",
            is_passive: false,
            spirit_cost: 10,
            required_archetype: None,
            // Legacy single-outcome form: the residual folds into the last
            // (only) entry when rolled.
            effects: vec![GuaranteedOutcome {
                distribution: vec![chance(AtBatOutcome::Strikeout, 60.0)],
            }],
        },
        Ability {
            id: "total_eclipse".into(),
            name: "Total Eclipse",
            is_passive: false,
            spirit_cost: 18,
            required_archetype: Some(Archetype::Junkballer),
            effects: vec![GuaranteedOutcome {
                distribution: vec![
                    chance(AtBatOutcome::Strikeout, 80.0),
                    chance(AtBatOutcome::Walk, 15.0),
                    chance(AtBatOutcome::Single, 5.0),
                ],
            }],
        },
        Ability {
            id: "time_warp".into(),
            name: "Time Warp",
            is_passive: false,
            spirit_cost: 9,
            required_archetype: None,
            effects: vec![StatModifier {
                batting: BatterStats::default(),
                pitching: PitcherStats {
                    breaking: 8.0,
                    ..PitcherStats::default()
                },
            }],
        },
        Ability {
            id: "iron_arm".into(),
            name: "Iron Arm",
            is_passive: false,
            spirit_cost: 7,
            required_archetype: None,
            effects: vec![StatModifier {
                batting: BatterStats::default(),
                pitching: PitcherStats {
                    velocity: 5.0,
                    ..PitcherStats::default()
                },
            }],
        },
        Ability {
            id: "heavy_barrel".into(),
            name: "Heavy Barrel",
            is_passive: true,
            spirit_cost: 0,
            required_archetype: None,
            effects: vec![StatModifier {
                batting: BatterStats {
                    power: 6.0,
                    ..BatterStats::default()
                },
                pitching: PitcherStats::default(),
            }],
        },
        Ability {
            id: "quick_wrists".into(),
            name: "Quick Wrists",
            is_passive: true,
            spirit_cost: 0,
            required_archetype: None,
            effects: vec![StatModifier {
                batting: BatterStats {
                    contact: 5.0,
                    speed: 2.0,
                    ..BatterStats::default()
                },
                pitching: PitcherStats::default(),
            }],
        },
        Ability {
            id: "greased_lightning".into(),
            name: "Greased Lightning",
            is_passive: true,
            spirit_cost: 0,
            required_archetype: None,
            effects: vec![StatModifier {
                batting: BatterStats {
                    speed: 7.0,
                    ..BatterStats::default()
                },
                pitching: PitcherStats::default(),
            }],
        },
        Ability {
            id: "wall_of_leather".into(),
            name: "Wall of Leather",
            is_passive: true,
            spirit_cost: 0,
            required_archetype: None,
            effects: vec![DefensiveBoost { glove: 5.0 }],
        },
        Ability {
            id: "repertoire".into(),
            name: "Repertoire",
            is_passive: true,
            spirit_cost: 0,
            required_archetype: None,
            effects: vec![OutcomeModifier {
                bonuses: OutcomeBonuses {
                    strikeout: 4.0,
                    ..OutcomeBonuses::default()
                },
            }],
        },
        Ability {
            id: "painted_corners".into(),
            name: "Painted Corners",
            is_passive: true,
            spirit_cost: 0,
            required_archetype: None,
            effects: vec![
                StatModifier {
                    batting: BatterStats::default(),
                    pitching: PitcherStats {
                        control: 4.0,
                        ..PitcherStats::default()
                    },
                },
                OutcomeModifier {
                    bonuses: OutcomeBonuses {
                        walk: -2.0,
                        ..OutcomeBonuses::default()
                    },
                },
            ],
        },
    ]
}

/// The strikeout-suppression bonus `repertoire` loses when the previous
/// pitcher showed the same signature technique.
pub fn repertoire_bonus() -> f64 {
    4.0
}
