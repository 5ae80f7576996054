use crate::ability::{self, ActiveAbilityContext};
use crate::approach::{adaptation_multiplier, Approach, PitchStrategy};
use crate::player::{BatterStats, PitcherStats, Player};
use crate::synergy::SideSynergies;
use serde::{Deserialize, Serialize};

/// Snapshot of every layer the batter side of the pipeline emitted. The last
/// layer is the effective stat block used by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatterLayers {
    pub base: BatterStats,
    pub techniques: BatterStats,
    pub equipment: BatterStats,
    pub synergy: BatterStats,
    pub approach: BatterStats,
    pub ability: BatterStats,
}

impl BatterLayers {
    pub fn effective(&self) -> BatterStats {
        self.ability
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitcherLayers {
    pub base: PitcherStats,
    pub techniques: PitcherStats,
    pub equipment: PitcherStats,
    pub synergy: PitcherStats,
    pub fatigue: PitcherStats,
    pub strategy: PitcherStats,
    pub ability: PitcherStats,
}

impl PitcherLayers {
    pub fn effective(&self) -> PitcherStats {
        self.ability
    }
}

/// Pitching degradation as a function of effective innings pitched. Bounded
/// below at 55% of base.
pub fn fatigue_modifier(innings_pitched: f64) -> f64 {
    (1.0 - 0.08 * innings_pitched).max(0.55)
}

/// Batter side of the layered stat computation. Pure: same inputs, same
/// layers, no hidden mutation.
pub fn effective_batter(
    player: &Player,
    synergy: Option<&SideSynergies>,
    approach: Option<(Approach, u32)>,
    ability_ctx: Option<&ActiveAbilityContext>,
) -> BatterLayers {
    let base = player
        .archetype
        .and_then(|archetype| archetype.batting_base())
        .unwrap_or(player.batting)
        .clamped();
    let techniques = base.plus(ability::passive_batting_modifiers(player)).clamped();
    let equipment = techniques.plus(player.equipment_batting_total()).clamped();
    let synergy_layer = equipment
        .plus(
            synergy
                .map(|s| s.batter_stat_bonuses)
                .unwrap_or_default(),
        )
        .clamped();
    let approach_layer = match approach {
        Some((choice, consecutive)) => synergy_layer
            .plus(choice.stat_delta().scaled(adaptation_multiplier(consecutive)))
            .clamped(),
        None => synergy_layer,
    };
    // Active abilities land last; the passive bundle's stat modifiers were
    // already folded in at the technique layer and must not repeat here.
    let ability_layer = match ability_ctx {
        Some(ctx) if !ctx.is_passive_bundle() => {
            approach_layer.plus(ctx.batting_modifier()).clamped()
        }
        _ => approach_layer,
    };
    BatterLayers {
        base,
        techniques,
        equipment,
        synergy: synergy_layer,
        approach: approach_layer,
        ability: ability_layer,
    }
}

/// Pitcher side: base → techniques → equipment → synergies → fatigue →
/// strategy → ability, clamped at every emission.
pub fn effective_pitcher(
    player: &Player,
    innings_pitched: f64,
    synergy: Option<&SideSynergies>,
    strategy: Option<(PitchStrategy, u32)>,
    ability_ctx: Option<&ActiveAbilityContext>,
) -> PitcherLayers {
    let base = player
        .archetype
        .and_then(|archetype| archetype.pitching_base())
        .unwrap_or(player.pitching)
        .clamped();
    let techniques = base.plus(ability::passive_pitching_modifiers(player)).clamped();
    let equipment = techniques.plus(player.equipment_pitching_total()).clamped();
    let synergy_layer = equipment
        .plus(
            synergy
                .map(|s| s.pitcher_stat_bonuses)
                .unwrap_or_default(),
        )
        .clamped();
    let negates_fatigue = ability_ctx.is_some_and(ActiveAbilityContext::negates_fatigue);
    let fatigue_layer = if negates_fatigue {
        synergy_layer
    } else {
        synergy_layer.scaled(fatigue_modifier(innings_pitched)).clamped()
    };
    let strategy_layer = match strategy {
        Some((choice, consecutive)) => fatigue_layer
            .plus(choice.stat_delta().scaled(adaptation_multiplier(consecutive)))
            .clamped(),
        None => fatigue_layer,
    };
    let ability_layer = match ability_ctx {
        Some(ctx) if !ctx.is_passive_bundle() => {
            strategy_layer.plus(ctx.pitching_modifier()).clamped()
        }
        _ => strategy_layer,
    };
    PitcherLayers {
        base,
        techniques,
        equipment,
        synergy: synergy_layer,
        fatigue: fatigue_layer,
        strategy: strategy_layer,
        ability: ability_layer,
    }
}

/// Glove a runner or batter contends with: the defense's average glove at
/// the equipment layer, with any defensive boost from the batter's ability
/// context added on top.
pub fn defense_glove(fielders: &[Player], batter_ability: Option<&ActiveAbilityContext>) -> f64 {
    if fielders.is_empty() {
        return 0.0;
    }
    let total: f64 = fielders.iter().map(|player| equipment_layer_glove(player)).sum();
    let average = total / fielders.len() as f64;
    let boost = batter_ability.map_or(0.0, ActiveAbilityContext::defensive_boost);
    (average + boost).clamp(0.0, 100.0)
}

/// Equipment-layer speed, used by the baserunning resolver.
pub fn runner_speed(player: &Player) -> f64 {
    let base = player
        .archetype
        .and_then(|archetype| archetype.batting_base())
        .unwrap_or(player.batting)
        .clamped();
    let techniques = base.plus(ability::passive_batting_modifiers(player)).clamped();
    techniques.plus(player.equipment_batting_total()).clamped().speed
}

fn equipment_layer_glove(player: &Player) -> f64 {
    let base = player
        .archetype
        .and_then(|archetype| archetype.batting_base())
        .unwrap_or(player.batting)
        .clamped();
    let techniques = base.plus(ability::passive_batting_modifiers(player)).clamped();
    techniques.plus(player.equipment_batting_total()).clamped().glove
}
