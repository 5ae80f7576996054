use crate::id::{AbilityId, PlayerId};
use serde::{Deserialize, Serialize};

pub const EQUIPMENT_SLOTS: usize = 5;
pub const MAX_TRAITS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Batter,
    Starter,
    Reliever,
}

/// Offensive ratings, each on a 0–100 scale.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BatterStats {
    pub power: f64,
    pub contact: f64,
    pub glove: f64,
    pub speed: f64,
}

impl BatterStats {
    pub fn clamped(self) -> BatterStats {
        BatterStats {
            power: self.power.clamp(0.0, 100.0),
            contact: self.contact.clamp(0.0, 100.0),
            glove: self.glove.clamp(0.0, 100.0),
            speed: self.speed.clamp(0.0, 100.0),
        }
    }

    pub fn plus(self, other: BatterStats) -> BatterStats {
        BatterStats {
            power: self.power + other.power,
            contact: self.contact + other.contact,
            glove: self.glove + other.glove,
            speed: self.speed + other.speed,
        }
    }

    pub fn scaled(self, factor: f64) -> BatterStats {
        BatterStats {
            power: self.power * factor,
            contact: self.contact * factor,
            glove: self.glove * factor,
            speed: self.speed * factor,
        }
    }
}

/// Pitching ratings, each on a 0–100 scale.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PitcherStats {
    pub velocity: f64,
    pub control: f64,
    #[serde(rename = "break")]
    pub breaking: f64,
}

impl PitcherStats {
    pub fn clamped(self) -> PitcherStats {
        PitcherStats {
            velocity: self.velocity.clamp(0.0, 100.0),
            control: self.control.clamp(0.0, 100.0),
            breaking: self.breaking.clamp(0.0, 100.0),
        }
    }

    pub fn plus(self, other: PitcherStats) -> PitcherStats {
        PitcherStats {
            velocity: self.velocity + other.velocity,
            control: self.control + other.control,
            breaking: self.breaking + other.breaking,
        }
    }

    pub fn scaled(self, factor: f64) -> PitcherStats {
        PitcherStats {
            velocity: self.velocity * factor,
            control: self.control * factor,
            breaking: self.breaking * factor,
        }
    }
}

/// A batting or pitching style fixing a player's baseline ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Slugger,
    SprayHitter,
    Tablesetter,
    FiveTool,
    Painter,
    Flamethrower,
    Junkballer,
}

impl Archetype {
    pub fn batting_base(self) -> Option<BatterStats> {
        match self {
            Archetype::Slugger => Some(BatterStats {
                power: 82.0,
                contact: 48.0,
                glove: 42.0,
                speed: 38.0,
            }),
            Archetype::SprayHitter => Some(BatterStats {
                power: 44.0,
                contact: 78.0,
                glove: 55.0,
                speed: 58.0,
            }),
            Archetype::Tablesetter => Some(BatterStats {
                power: 36.0,
                contact: 66.0,
                glove: 60.0,
                speed: 80.0,
            }),
            Archetype::FiveTool => Some(BatterStats {
                power: 64.0,
                contact: 64.0,
                glove: 64.0,
                speed: 64.0,
            }),
            Archetype::Painter | Archetype::Flamethrower | Archetype::Junkballer => None,
        }
    }

    pub fn pitching_base(self) -> Option<PitcherStats> {
        match self {
            Archetype::Painter => Some(PitcherStats {
                velocity: 52.0,
                control: 84.0,
                breaking: 60.0,
            }),
            Archetype::Flamethrower => Some(PitcherStats {
                velocity: 88.0,
                control: 46.0,
                breaking: 54.0,
            }),
            Archetype::Junkballer => Some(PitcherStats {
                velocity: 44.0,
                control: 64.0,
                breaking: 82.0,
            }),
            Archetype::Slugger
            | Archetype::SprayHitter
            | Archetype::Tablesetter
            | Archetype::FiveTool => None,
        }
    }
}

/// One of the five equipment slots' contents; stat blocks are additive deltas.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct EquipmentItem {
    pub name: String,
    #[serde(default)]
    pub batting: BatterStats,
    #[serde(default)]
    pub pitching: PitcherStats,
}

/// An ability the player owns, at some rank.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OwnedTechnique {
    pub ability: AbilityId,
    pub rank: u8,
}

impl OwnedTechnique {
    /// Rank scaling for passive stat modifiers: rank 1 is neutral, each
    /// further rank adds a quarter.
    pub fn rank_factor(&self) -> f64 {
        1.0 + 0.25 * f64::from(self.rank.saturating_sub(1))
    }
}

/// Permanent tags feeding lineup synergies. Closed ten-element set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    Clutch,
    Sparkplug,
    Anchor,
    Maverick,
    Professor,
    Iceman,
    Firebrand,
    Workhorse,
    Gambler,
    Captain,
}

impl Trait {
    pub const ALL: [Trait; 10] = [
        Trait::Clutch,
        Trait::Sparkplug,
        Trait::Anchor,
        Trait::Maverick,
        Trait::Professor,
        Trait::Iceman,
        Trait::Firebrand,
        Trait::Workhorse,
        Trait::Gambler,
        Trait::Captain,
    ];

    /// Packs traits into the fixed per-player slots.
    pub fn slots(traits: &[Trait]) -> [Option<Trait>; MAX_TRAITS] {
        debug_assert!(traits.len() <= MAX_TRAITS, "a player carries at most {MAX_TRAITS} traits");
        let mut slots = [None; MAX_TRAITS];
        for (slot, t) in slots.iter_mut().zip(traits) {
            *slot = Some(*t);
        }
        slots
    }
}

/// The in-game resource active abilities spend. Regenerates to max between
/// games; the engine only ever sees a fresh pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Spirit {
    pub current: i32,
    pub max: i32,
}

impl Spirit {
    pub fn for_level(level: u32) -> Spirit {
        let max = 50 + 5 * level.saturating_sub(1) as i32;
        Spirit { current: max, max }
    }

    pub fn add(&mut self, delta: i32) {
        self.current = (self.current + delta).clamp(0, self.max);
    }

    pub fn can_pay(&self, cost: i32) -> bool {
        self.current >= cost
    }

    /// Deducts `cost` when affordable; reports whether it was paid.
    pub fn pay(&mut self, cost: i32) -> bool {
        if self.can_pay(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub batting: BatterStats,
    #[serde(default)]
    pub pitching: PitcherStats,
    #[serde(default)]
    pub archetype: Option<Archetype>,
    #[serde(default)]
    pub techniques: Vec<OwnedTechnique>,
    #[serde(default)]
    pub equipment: [Option<EquipmentItem>; EQUIPMENT_SLOTS],
    pub spirit: Spirit,
    #[serde(default)]
    pub traits: [Option<Trait>; MAX_TRAITS],
    pub level: u32,
}

impl Player {
    pub fn is_pitcher(&self) -> bool {
        matches!(self.role, Role::Starter | Role::Reliever)
    }

    pub fn equipment_batting_total(&self) -> BatterStats {
        self.equipment
            .iter()
            .flatten()
            .fold(BatterStats::default(), |acc, item| acc.plus(item.batting))
    }

    pub fn equipment_pitching_total(&self) -> PitcherStats {
        self.equipment
            .iter()
            .flatten()
            .fold(PitcherStats::default(), |acc, item| acc.plus(item.pitching))
    }
}
