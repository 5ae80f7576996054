use crate::ability::OutcomeBonuses;
use crate::player::{BatterStats, PitcherStats};
use serde::{Deserialize, Serialize};

/// Per-at-bat free choice for the batter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    Power,
    Contact,
    Patient,
}

impl Approach {
    pub const ALL: [Approach; 3] = [Approach::Power, Approach::Contact, Approach::Patient];

    pub fn stat_delta(self) -> BatterStats {
        match self {
            Approach::Power => BatterStats {
                power: 8.0,
                contact: -4.0,
                ..BatterStats::default()
            },
            Approach::Contact => BatterStats {
                power: -3.0,
                contact: 6.0,
                ..BatterStats::default()
            },
            Approach::Patient => BatterStats::default(),
        }
    }

    pub fn outcome_bonuses(self) -> OutcomeBonuses {
        match self {
            Approach::Power => OutcomeBonuses {
                strikeout: 2.0,
                homerun: 1.5,
                ..OutcomeBonuses::default()
            },
            Approach::Contact => OutcomeBonuses {
                strikeout: -2.0,
                hit: 3.0,
                ..OutcomeBonuses::default()
            },
            Approach::Patient => OutcomeBonuses {
                strikeout: -1.0,
                walk: 4.0,
                hit: -2.0,
                ..OutcomeBonuses::default()
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Approach::Power => "power",
            Approach::Contact => "contact",
            Approach::Patient => "patient",
        }
    }
}

/// Per-at-bat free choice for the pitcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchStrategy {
    Challenge,
    Finesse,
    Paint,
}

impl PitchStrategy {
    pub const ALL: [PitchStrategy; 3] = [
        PitchStrategy::Challenge,
        PitchStrategy::Finesse,
        PitchStrategy::Paint,
    ];

    pub fn stat_delta(self) -> PitcherStats {
        match self {
            PitchStrategy::Challenge => PitcherStats {
                velocity: 6.0,
                control: -3.0,
                ..PitcherStats::default()
            },
            PitchStrategy::Finesse => PitcherStats {
                velocity: -4.0,
                control: 5.0,
                ..PitcherStats::default()
            },
            PitchStrategy::Paint => PitcherStats {
                velocity: -2.0,
                control: 7.0,
                breaking: 2.0,
            },
        }
    }

    pub fn outcome_bonuses(self) -> OutcomeBonuses {
        match self {
            PitchStrategy::Challenge => OutcomeBonuses {
                strikeout: 2.5,
                walk: -2.0,
                hit: 1.0,
                homerun: 0.5,
            },
            PitchStrategy::Finesse => OutcomeBonuses {
                strikeout: -1.0,
                hit: -2.0,
                homerun: -1.0,
                ..OutcomeBonuses::default()
            },
            PitchStrategy::Paint => OutcomeBonuses {
                strikeout: 1.0,
                walk: 2.0,
                homerun: -1.5,
                ..OutcomeBonuses::default()
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PitchStrategy::Challenge => "challenge",
            PitchStrategy::Finesse => "finesse",
            PitchStrategy::Paint => "paint",
        }
    }
}

/// Consecutive-use scaling on approach/strategy stat deltas. Currently the
/// identity; the mechanism stays so tuning flips one table.
pub fn adaptation_multiplier(_consecutive: u32) -> f64 {
    1.0
}

/// Stat-driven default when the caller supplies no approach. Deterministic:
/// the auto policy must not consume RNG, so replays stay aligned.
pub fn auto_approach(batting: BatterStats, pitching: PitcherStats) -> Approach {
    if batting.power >= 70.0 {
        Approach::Power
    } else if batting.contact >= 70.0 || pitching.control >= 75.0 {
        Approach::Contact
    } else if pitching.control < 45.0 {
        Approach::Patient
    } else {
        Approach::Contact
    }
}

pub fn auto_strategy(pitching: PitcherStats, batting: BatterStats) -> PitchStrategy {
    if pitching.velocity >= 70.0 && batting.contact < 75.0 {
        PitchStrategy::Challenge
    } else if pitching.control >= 70.0 {
        PitchStrategy::Paint
    } else {
        PitchStrategy::Finesse
    }
}
