use crate::error::EngineError;
use crate::id::{PlayerId, TeamId};
use crate::player::Player;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TeamColors {
    pub primary: String,
    pub secondary: String,
}

/// Engine input: a flat value copy of a club. The lineup orders batters;
/// `pitchers` orders the starter first and relievers after.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub colors: TeamColors,
    pub roster: Vec<Player>,
    pub lineup: Vec<PlayerId>,
    pub pitchers: Vec<PlayerId>,
}

impl Team {
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.roster.iter().find(|player| &player.id == id)
    }

    /// A roster that cannot put a batter at the plate or a pitcher on the
    /// mound cannot be simulated.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.lineup.is_empty() {
            return Err(EngineError::InvalidRoster {
                team: self.id.clone(),
                needed: "batter",
            });
        }
        if self.pitchers.is_empty() {
            return Err(EngineError::InvalidRoster {
                team: self.id.clone(),
                needed: "pitcher",
            });
        }
        for id in &self.lineup {
            if self.player(id).is_none() {
                return Err(EngineError::InvalidRoster {
                    team: self.id.clone(),
                    needed: "batter",
                });
            }
        }
        for id in &self.pitchers {
            if self.player(id).is_none() {
                return Err(EngineError::InvalidRoster {
                    team: self.id.clone(),
                    needed: "pitcher",
                });
            }
        }
        Ok(())
    }

    /// Local copies of the lineup, in batting order. Per-game mutation
    /// (spirit, box-score accounting) happens on these, never on the input.
    pub fn lineup_players(&self) -> Vec<Player> {
        self.lineup
            .iter()
            .filter_map(|id| self.player(id).cloned())
            .collect()
    }

    pub fn pitcher_players(&self) -> Vec<Player> {
        self.pitchers
            .iter()
            .filter_map(|id| self.player(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Team;
    use crate::error::EngineError;
    use crate::id::PlayerId;
    use crate::player::{BatterStats, PitcherStats, Player, Role, Spirit};

    fn player(id: &str, role: Role) -> Player {
        Player {
            id: id.into(),
            name: id.to_owned(),
            role,
            batting: BatterStats::default(),
            pitching: PitcherStats::default(),
            archetype: None,
            techniques: Vec::new(),
            equipment: Default::default(),
            spirit: Spirit::for_level(1),
            traits: Default::default(),
            level: 1,
        }
    }

    fn team() -> Team {
        Team {
            id: "club".into(),
            name: "Club".into(),
            colors: Default::default(),
            roster: vec![player("b1", Role::Batter), player("p1", Role::Starter)],
            lineup: vec!["b1".into()],
            pitchers: vec!["p1".into()],
        }
    }

    #[test]
    fn valid_roster_passes() {
        team().validate().unwrap();
    }

    #[test]
    fn empty_pitching_staff_is_invalid() {
        let mut team = team();
        team.pitchers.clear();
        match team.validate() {
            Err(EngineError::InvalidRoster { needed, .. }) => assert_eq!(needed, "pitcher"),
            other => panic!("expected InvalidRoster, got {other:?}"),
        }
    }

    #[test]
    fn dangling_lineup_reference_is_invalid() {
        let mut team = team();
        team.lineup.push("ghost".into());
        assert!(team.validate().is_err());
    }

    #[test]
    fn lineup_players_are_cloned_in_order() {
        let mut team = team();
        team.roster.push(player("b2", Role::Batter));
        team.lineup = vec!["b2".into(), "b1".into()];
        let players = team.lineup_players();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, PlayerId::from("b2"));
    }
}
