use crate::ability::{AbilityEffect, OutcomeBonuses};
use crate::player::{BatterStats, PitcherStats, Player, Trait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The flat additive tables one side's lineup earns from its traits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideSynergies {
    pub batter_stat_bonuses: BatterStats,
    pub pitcher_stat_bonuses: PitcherStats,
    pub outcome_modifiers: OutcomeBonuses,
}

/// Lineup-wide bonuses, computed once at match start and read-only after.
#[derive(Debug, Default, Clone, PartialEq, derive_more::Deref, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synergies {
    pub trait_counts: BTreeMap<Trait, usize>,
    pub fired: Vec<String>,
    #[deref]
    #[serde(flatten)]
    pub side: SideSynergies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    fn threshold(self) -> usize {
        match self {
            Tier::Bronze => 2,
            Tier::Silver => 3,
            Tier::Gold => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }
}

/// Counts traits across the lineup and merges every fired synergy's effects
/// into the side tables. Single-trait tiers are cumulative; combos fire once
/// when all their requirements are met.
pub fn compute(lineup: &[Player]) -> Synergies {
    let mut trait_counts: BTreeMap<Trait, usize> = BTreeMap::new();
    for player in lineup {
        for t in player.traits.iter().flatten() {
            *trait_counts.entry(*t).or_default() += 1;
        }
    }

    let mut synergies = Synergies {
        trait_counts,
        ..Synergies::default()
    };

    for t in Trait::ALL {
        let count = synergies.trait_counts.get(&t).copied().unwrap_or(0);
        for tier in [Tier::Bronze, Tier::Silver, Tier::Gold] {
            if count >= tier.threshold() {
                merge_effects(&mut synergies.side, &single_trait_effects(t, tier));
                synergies.fired.push(format!("{} ({})", trait_name(t), tier.label()));
            }
        }
    }

    for combo in combo_synergies() {
        let met = combo
            .requirements
            .iter()
            .all(|(t, needed)| synergies.trait_counts.get(t).copied().unwrap_or(0) >= *needed);
        if met {
            merge_effects(&mut synergies.side, &combo.effects);
            synergies.fired.push(combo.name.to_owned());
        }
    }

    synergies
}

fn merge_effects(side: &mut SideSynergies, effects: &[AbilityEffect]) {
    for effect in effects {
        match effect {
            AbilityEffect::StatModifier { batting, pitching } => {
                side.batter_stat_bonuses = side.batter_stat_bonuses.plus(*batting);
                side.pitcher_stat_bonuses = side.pitcher_stat_bonuses.plus(*pitching);
            }
            AbilityEffect::OutcomeModifier { bonuses } => {
                side.outcome_modifiers = side.outcome_modifiers.plus(*bonuses);
            }
            // Guaranteed outcomes and defensive boosts are per-player
            // mechanics; synergy definitions do not carry them.
            AbilityEffect::GuaranteedOutcome { .. } | AbilityEffect::DefensiveBoost { .. } => {}
        }
    }
}

fn trait_name(t: Trait) -> &'static str {
    match t {
        Trait::Clutch => "Clutch",
        Trait::Sparkplug => "Sparkplug",
        Trait::Anchor => "Anchor",
        Trait::Maverick => "Maverick",
        Trait::Professor => "Professor",
        Trait::Iceman => "Iceman",
        Trait::Firebrand => "Firebrand",
        Trait::Workhorse => "Workhorse",
        Trait::Gambler => "Gambler",
        Trait::Captain => "Captain",
    }
}

fn stat_effect(batting: BatterStats, pitching: PitcherStats) -> AbilityEffect {
    AbilityEffect::StatModifier { batting, pitching }
}

fn outcome_effect(bonuses: OutcomeBonuses) -> AbilityEffect {
    AbilityEffect::OutcomeModifier { bonuses }
}

fn single_trait_effects(t: Trait, tier: Tier) -> Vec<AbilityEffect> {
    let b = BatterStats::default;
    let p = PitcherStats::default;
    let o = OutcomeBonuses::default;
    match (t, tier) {
        (Trait::Clutch, Tier::Bronze) => vec![outcome_effect(OutcomeBonuses { hit: 1.0, ..o() })],
        (Trait::Clutch, Tier::Silver) => vec![outcome_effect(OutcomeBonuses { hit: 1.5, ..o() })],
        (Trait::Clutch, Tier::Gold) => vec![outcome_effect(OutcomeBonuses { homerun: 2.0, ..o() })],

        (Trait::Sparkplug, Tier::Bronze) => {
            vec![stat_effect(BatterStats { speed: 3.0, ..b() }, p())]
        }
        (Trait::Sparkplug, Tier::Silver) => vec![stat_effect(
            BatterStats {
                speed: 3.0,
                contact: 2.0,
                ..b()
            },
            p(),
        )],
        (Trait::Sparkplug, Tier::Gold) => {
            vec![stat_effect(BatterStats { speed: 4.0, ..b() }, p())]
        }

        (Trait::Anchor, Tier::Bronze) => vec![stat_effect(BatterStats { glove: 3.0, ..b() }, p())],
        (Trait::Anchor, Tier::Silver) => vec![stat_effect(BatterStats { glove: 3.0, ..b() }, p())],
        (Trait::Anchor, Tier::Gold) => vec![
            stat_effect(BatterStats { glove: 4.0, ..b() }, p()),
            outcome_effect(OutcomeBonuses {
                strikeout: 1.0,
                ..o()
            }),
        ],

        (Trait::Maverick, Tier::Bronze) => {
            vec![outcome_effect(OutcomeBonuses { homerun: 1.0, ..o() })]
        }
        (Trait::Maverick, Tier::Silver) => {
            vec![stat_effect(BatterStats { power: 4.0, ..b() }, p())]
        }
        (Trait::Maverick, Tier::Gold) => {
            vec![outcome_effect(OutcomeBonuses { homerun: 2.0, ..o() })]
        }

        (Trait::Professor, Tier::Bronze) => {
            vec![stat_effect(b(), PitcherStats { control: 3.0, ..p() })]
        }
        (Trait::Professor, Tier::Silver) => vec![
            stat_effect(b(), PitcherStats { control: 3.0, ..p() }),
            outcome_effect(OutcomeBonuses { walk: -1.0, ..o() }),
        ],
        (Trait::Professor, Tier::Gold) => {
            vec![stat_effect(b(), PitcherStats { breaking: 4.0, ..p() })]
        }

        (Trait::Iceman, Tier::Bronze) => vec![outcome_effect(OutcomeBonuses { walk: 1.0, ..o() })],
        (Trait::Iceman, Tier::Silver) => {
            vec![stat_effect(BatterStats { contact: 3.0, ..b() }, p())]
        }
        (Trait::Iceman, Tier::Gold) => vec![outcome_effect(OutcomeBonuses {
            walk: 1.5,
            strikeout: -1.0,
            ..o()
        })],

        (Trait::Firebrand, Tier::Bronze) => {
            vec![stat_effect(b(), PitcherStats { velocity: 3.0, ..p() })]
        }
        (Trait::Firebrand, Tier::Silver) => vec![
            stat_effect(b(), PitcherStats { velocity: 3.0, ..p() }),
            outcome_effect(OutcomeBonuses {
                strikeout: 1.0,
                ..o()
            }),
        ],
        (Trait::Firebrand, Tier::Gold) => {
            vec![stat_effect(b(), PitcherStats { velocity: 4.0, ..p() })]
        }

        (Trait::Workhorse, Tier::Bronze) => vec![stat_effect(
            b(),
            PitcherStats {
                control: 2.0,
                velocity: 1.0,
                ..p()
            },
        )],
        (Trait::Workhorse, Tier::Silver) => {
            vec![stat_effect(b(), PitcherStats { control: 2.0, ..p() })]
        }
        (Trait::Workhorse, Tier::Gold) => vec![stat_effect(
            b(),
            PitcherStats {
                velocity: 2.0,
                breaking: 2.0,
                ..p()
            },
        )],

        (Trait::Gambler, Tier::Bronze) => vec![outcome_effect(OutcomeBonuses {
            hit: 0.5,
            homerun: 0.5,
            ..o()
        })],
        (Trait::Gambler, Tier::Silver) => {
            vec![stat_effect(BatterStats { speed: 3.0, ..b() }, p())]
        }
        (Trait::Gambler, Tier::Gold) => {
            vec![outcome_effect(OutcomeBonuses { homerun: 1.5, ..o() })]
        }

        (Trait::Captain, Tier::Bronze) => {
            vec![stat_effect(BatterStats { contact: 2.0, ..b() }, p())]
        }
        (Trait::Captain, Tier::Silver) => vec![stat_effect(
            BatterStats {
                power: 2.0,
                contact: 2.0,
                ..b()
            },
            p(),
        )],
        (Trait::Captain, Tier::Gold) => vec![stat_effect(
            BatterStats {
                power: 2.0,
                contact: 2.0,
                glove: 2.0,
                speed: 2.0,
            },
            p(),
        )],
    }
}

struct ComboSynergy {
    name: &'static str,
    requirements: &'static [(Trait, usize)],
    effects: Vec<AbilityEffect>,
}

fn combo_synergies() -> Vec<ComboSynergy> {
    vec![
        ComboSynergy {
            name: "Thunder and Lightning",
            requirements: &[(Trait::Maverick, 2), (Trait::Sparkplug, 2)],
            effects: vec![stat_effect(
                BatterStats {
                    power: 3.0,
                    speed: 3.0,
                    ..BatterStats::default()
                },
                PitcherStats::default(),
            )],
        },
        ComboSynergy {
            name: "Lockdown Core",
            requirements: &[(Trait::Anchor, 2), (Trait::Professor, 2)],
            effects: vec![
                stat_effect(
                    BatterStats {
                        glove: 3.0,
                        ..BatterStats::default()
                    },
                    PitcherStats::default(),
                ),
                outcome_effect(OutcomeBonuses {
                    strikeout: 2.0,
                    ..OutcomeBonuses::default()
                }),
            ],
        },
        ComboSynergy {
            name: "Dugout Spark",
            requirements: &[(Trait::Captain, 1), (Trait::Firebrand, 2)],
            effects: vec![outcome_effect(OutcomeBonuses {
                hit: 1.0,
                strikeout: 1.0,
                ..OutcomeBonuses::default()
            })],
        },
    ]
}
