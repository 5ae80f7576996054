//! Headless balance harness: simulates every matchup between the demo clubs
//! and prints win-rate, rate-stat, choice-distribution, and drama/fun
//! reports. `GAMES` in the environment overrides the per-matchup game count.

use dugout::{
    simulate, Approach, Archetype, AtBatOutcome, BatterStats, EquipmentItem, Half, MatchResult,
    OwnedTechnique, PitchStrategy, PitcherStats, Player, Role, SimOptions, Spirit, Team, Trait,
};
use prettytable::{format::consts::FORMAT_NO_LINESEP_WITH_TITLE, row, Table};
use std::collections::HashMap;

const DEFAULT_GAMES: u32 = 60;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let games = std::env::var("GAMES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_GAMES);

    let clubs = demo_clubs();
    tracing::info!(games, clubs = clubs.len(), "running balance sweep");

    let mut matchups = Vec::new();
    for (home_idx, home) in clubs.iter().enumerate() {
        for (away_idx, away) in clubs.iter().enumerate() {
            if home_idx == away_idx {
                continue;
            }
            let matchup_seed = (home_idx * clubs.len() + away_idx) as u64 * 1_000_003;
            matchups.push(run_matchup(home, away, games, matchup_seed));
        }
    }

    print_win_matrix(&clubs, &matchups);
    print_rate_stats(&matchups);
    print_choice_distributions(&matchups);
    print_scores(&matchups);
}

struct MatchupReport {
    home: String,
    away: String,
    games: u32,
    home_wins: u32,
    at_bats: u32,
    plate_appearances: u32,
    hits: u32,
    homeruns: u32,
    strikeouts: u32,
    walks: u32,
    approaches: HashMap<Approach, u32>,
    strategies: HashMap<PitchStrategy, u32>,
    drama: f64,
    fun: f64,
}

fn run_matchup(home: &Team, away: &Team, games: u32, matchup_seed: u64) -> MatchupReport {
    let mut report = MatchupReport {
        home: home.name.clone(),
        away: away.name.clone(),
        games,
        home_wins: 0,
        at_bats: 0,
        plate_appearances: 0,
        hits: 0,
        homeruns: 0,
        strikeouts: 0,
        walks: 0,
        approaches: HashMap::new(),
        strategies: HashMap::new(),
        drama: 0.0,
        fun: 0.0,
    };
    for game in 0..games {
        let options = SimOptions {
            seed: Some(matchup_seed + u64::from(game)),
            enable_trace: true,
        };
        let result = match simulate(home, away, options) {
            Ok(result) => result,
            Err(failure) => {
                tracing::error!(%failure, "simulation failed; skipping game");
                continue;
            }
        };
        if result.is_win {
            report.home_wins += 1;
        }
        accumulate(&mut report, &result);
    }
    report.drama /= f64::from(games.max(1));
    report.fun /= f64::from(games.max(1));
    report
}

fn accumulate(report: &mut MatchupReport, result: &MatchResult) {
    let Some(trace) = &result.trace_log else {
        return;
    };

    let mut homeruns = 0u32;
    let mut triples = 0u32;
    let mut clashes = 0u32;
    let mut extra_base_attempts = 0u32;
    for at_bat in &trace.at_bats {
        report.plate_appearances += 1;
        if at_bat.outcome.counts_as_at_bat() {
            report.at_bats += 1;
        }
        if at_bat.outcome.is_hit() {
            report.hits += 1;
        }
        match at_bat.outcome {
            AtBatOutcome::Homerun => homeruns += 1,
            AtBatOutcome::Triple => triples += 1,
            AtBatOutcome::Strikeout => report.strikeouts += 1,
            AtBatOutcome::Walk => report.walks += 1,
            _ => {}
        }
        if at_bat.clash_occurred {
            clashes += 1;
        }
        extra_base_attempts += at_bat
            .extra_bases
            .iter()
            .filter(|attempt| attempt.attempted)
            .count() as u32;
        if let Some(approach) = at_bat.approach {
            *report.approaches.entry(approach).or_default() += 1;
        }
        if let Some(strategy) = at_bat.strategy {
            *report.strategies.entry(strategy).or_default() += 1;
        }
    }
    report.homeruns += homeruns;

    // Drama: lead changes, late ties, extra innings, and a close finish.
    let mut away_score = 0u32;
    let mut home_score = 0u32;
    let mut lead: i64 = 0;
    let mut lead_changes = 0u32;
    let mut late_ties = 0u32;
    let mut last_inning_seen = 0;
    for at_bat in &trace.at_bats {
        // A new inning starting at 8 or later means the previous late inning
        // completed with the game still level.
        if at_bat.inning > last_inning_seen {
            if last_inning_seen >= 7 && away_score == home_score {
                late_ties += 1;
            }
            last_inning_seen = at_bat.inning;
        }
        match at_bat.half {
            Half::Top => away_score += at_bat.runs_scored,
            Half::Bottom => home_score += at_bat.runs_scored,
        }
        let diff = i64::from(home_score) - i64::from(away_score);
        if diff != 0 && lead != 0 && diff.signum() != lead.signum() {
            lead_changes += 1;
        }
        if diff != 0 {
            lead = diff;
        }
    }
    let extras = u32::from(result.total_innings > 9);
    let close = u32::from(result.my_runs.abs_diff(result.opponent_runs) <= 1);
    let drama = f64::from(lead_changes * 12 + late_ties * 8 + extras * 25 + close * 20);
    report.drama += drama.min(100.0);

    let total_runs = result.my_runs + result.opponent_runs;
    let fun = f64::from(
        total_runs * 3 + homeruns * 8 + triples * 6 + extra_base_attempts * 2 + clashes * 10,
    );
    report.fun += fun.min(100.0);
}

fn print_win_matrix(clubs: &[Team], matchups: &[MatchupReport]) {
    println!("\nWin rate (home side, row vs column):");
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    let mut titles = row!["home \\ away"];
    for club in clubs {
        titles.add_cell(prettytable::Cell::new(&club.name));
    }
    table.set_titles(titles);
    for home in clubs {
        let mut cells = row![home.name];
        for away in clubs {
            let cell = if home.name == away.name {
                "-".to_owned()
            } else {
                matchups
                    .iter()
                    .find(|m| m.home == home.name && m.away == away.name)
                    .map_or_else(String::new, |m| {
                        format!(
                            "{:.0}%",
                            100.0 * f64::from(m.home_wins) / f64::from(m.games.max(1))
                        )
                    })
            };
            cells.add_cell(prettytable::Cell::new(&cell));
        }
        table.add_row(cells);
    }
    table.printstd();
}

fn print_rate_stats(matchups: &[MatchupReport]) {
    println!("\nLeague rate stats by matchup:");
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["matchup", "K%", "BB%", "HR/AB", "AVG"]);
    for m in matchups {
        let pa = f64::from(m.plate_appearances.max(1));
        let ab = f64::from(m.at_bats.max(1));
        table.add_row(row![
            format!("{} vs {}", m.home, m.away),
            format!("{:.1}%", 100.0 * f64::from(m.strikeouts) / pa),
            format!("{:.1}%", 100.0 * f64::from(m.walks) / pa),
            format!("{:.3}", f64::from(m.homeruns) / ab),
            format!("{:.3}", f64::from(m.hits) / ab),
        ]);
    }
    table.printstd();
}

fn print_choice_distributions(matchups: &[MatchupReport]) {
    println!("\nApproach / strategy usage:");
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![
        "matchup", "power", "contact", "patient", "challenge", "finesse", "paint"
    ]);
    for m in matchups {
        let pa = f64::from(m.plate_appearances.max(1));
        let pct = |count: u32| format!("{:.0}%", 100.0 * f64::from(count) / pa);
        table.add_row(row![
            format!("{} vs {}", m.home, m.away),
            pct(m.approaches.get(&Approach::Power).copied().unwrap_or(0)),
            pct(m.approaches.get(&Approach::Contact).copied().unwrap_or(0)),
            pct(m.approaches.get(&Approach::Patient).copied().unwrap_or(0)),
            pct(m
                .strategies
                .get(&PitchStrategy::Challenge)
                .copied()
                .unwrap_or(0)),
            pct(m
                .strategies
                .get(&PitchStrategy::Finesse)
                .copied()
                .unwrap_or(0)),
            pct(m.strategies.get(&PitchStrategy::Paint).copied().unwrap_or(0)),
        ]);
    }
    table.printstd();
}

fn print_scores(matchups: &[MatchupReport]) {
    println!("\nDrama and fun (0-100):");
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["matchup", "drama", "fun"]);
    for m in matchups {
        table.add_row(row![
            format!("{} vs {}", m.home, m.away),
            format!("{:.0}", m.drama),
            format!("{:.0}", m.fun),
        ]);
    }
    table.printstd();
}

// Demo rosters: literal constants, themed so the synergy and ability paths
// all light up in a sweep.

struct BatterSpec {
    name: &'static str,
    power: f64,
    contact: f64,
    glove: f64,
    speed: f64,
    archetype: Option<Archetype>,
    techniques: &'static [(&'static str, u8)],
    traits: &'static [Trait],
}

struct PitcherSpec {
    name: &'static str,
    role: Role,
    velocity: f64,
    control: f64,
    breaking: f64,
    archetype: Option<Archetype>,
    techniques: &'static [(&'static str, u8)],
    traits: &'static [Trait],
}

fn make_batter(team: &str, spec: &BatterSpec) -> Player {
    Player {
        id: format!("{team}-{}", spec.name.to_lowercase().replace(' ', "-")).into(),
        name: spec.name.to_owned(),
        role: Role::Batter,
        batting: BatterStats {
            power: spec.power,
            contact: spec.contact,
            glove: spec.glove,
            speed: spec.speed,
        },
        pitching: PitcherStats::default(),
        archetype: spec.archetype,
        techniques: spec
            .techniques
            .iter()
            .map(|(id, rank)| OwnedTechnique {
                ability: (*id).into(),
                rank: *rank,
            })
            .collect(),
        equipment: [
            Some(EquipmentItem {
                name: "Ash Bat".into(),
                batting: BatterStats {
                    power: 2.0,
                    ..BatterStats::default()
                },
                ..EquipmentItem::default()
            }),
            None,
            None,
            None,
            None,
        ],
        spirit: Spirit::for_level(3),
        traits: Trait::slots(spec.traits),
        level: 3,
    }
}

fn make_pitcher(team: &str, spec: &PitcherSpec) -> Player {
    Player {
        id: format!("{team}-{}", spec.name.to_lowercase().replace(' ', "-")).into(),
        name: spec.name.to_owned(),
        role: spec.role,
        batting: BatterStats::default(),
        pitching: PitcherStats {
            velocity: spec.velocity,
            control: spec.control,
            breaking: spec.breaking,
        },
        archetype: spec.archetype,
        techniques: spec
            .techniques
            .iter()
            .map(|(id, rank)| OwnedTechnique {
                ability: (*id).into(),
                rank: *rank,
            })
            .collect(),
        equipment: Default::default(),
        spirit: Spirit::for_level(3),
        traits: Trait::slots(spec.traits),
        level: 3,
    }
}

fn build_club(
    name: &str,
    batters: &[BatterSpec],
    pitchers: &[PitcherSpec],
) -> Team {
    let tag = name.to_lowercase().replace(' ', "-");
    let mut roster = Vec::new();
    let mut lineup = Vec::new();
    for spec in batters {
        let player = make_batter(&tag, spec);
        lineup.push(player.id.clone());
        roster.push(player);
    }
    let mut staff = Vec::new();
    for spec in pitchers {
        let player = make_pitcher(&tag, spec);
        staff.push(player.id.clone());
        roster.push(player);
    }
    Team {
        id: tag.clone().into(),
        name: name.to_owned(),
        colors: Default::default(),
        roster,
        lineup,
        pitchers: staff,
    }
}

#[allow(clippy::too_many_lines)]
fn demo_clubs() -> Vec<Team> {
    use Trait::{Anchor, Captain, Clutch, Firebrand, Gambler, Iceman, Maverick, Professor, Sparkplug, Workhorse};

    let sluggers = build_club(
        "Harbor Hammers",
        &[
            BatterSpec { name: "Moss", power: 84.0, contact: 48.0, glove: 40.0, speed: 36.0, archetype: Some(Archetype::Slugger), techniques: &[("moonshot", 1), ("heavy_barrel", 2)], traits: &[Maverick, Clutch] },
            BatterSpec { name: "Drexler", power: 78.0, contact: 52.0, glove: 44.0, speed: 40.0, archetype: Some(Archetype::Slugger), techniques: &[("heavy_barrel", 1)], traits: &[Maverick] },
            BatterSpec { name: "Quill", power: 72.0, contact: 55.0, glove: 48.0, speed: 45.0, archetype: None, techniques: &[], traits: &[Maverick, Gambler] },
            BatterSpec { name: "Barnes", power: 70.0, contact: 50.0, glove: 50.0, speed: 44.0, archetype: None, techniques: &[("heavy_barrel", 1)], traits: &[Clutch] },
            BatterSpec { name: "Okafor", power: 66.0, contact: 58.0, glove: 52.0, speed: 48.0, archetype: None, techniques: &[], traits: &[Captain] },
            BatterSpec { name: "Reyes", power: 60.0, contact: 60.0, glove: 55.0, speed: 50.0, archetype: None, techniques: &[], traits: &[Gambler] },
            BatterSpec { name: "Tanaka", power: 55.0, contact: 62.0, glove: 58.0, speed: 52.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Silva", power: 52.0, contact: 56.0, glove: 60.0, speed: 55.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Crane", power: 48.0, contact: 50.0, glove: 62.0, speed: 58.0, archetype: None, techniques: &[], traits: &[] },
        ],
        &[
            PitcherSpec { name: "Vance", role: Role::Starter, velocity: 74.0, control: 52.0, breaking: 55.0, archetype: None, techniques: &[("repertoire", 1)], traits: &[Firebrand] },
            PitcherSpec { name: "Hollis", role: Role::Reliever, velocity: 70.0, control: 50.0, breaking: 52.0, archetype: None, techniques: &[], traits: &[Firebrand] },
            PitcherSpec { name: "Webb", role: Role::Reliever, velocity: 68.0, control: 48.0, breaking: 50.0, archetype: None, techniques: &[("iron_arm", 1)], traits: &[] },
        ],
    );

    let painters = build_club(
        "Kiln City Brushmen",
        &[
            BatterSpec { name: "Ash", power: 44.0, contact: 76.0, glove: 60.0, speed: 56.0, archetype: Some(Archetype::SprayHitter), techniques: &[("quick_wrists", 2)], traits: &[Iceman, Professor] },
            BatterSpec { name: "Holt", power: 42.0, contact: 72.0, glove: 62.0, speed: 54.0, archetype: None, techniques: &[("quick_wrists", 1)], traits: &[Iceman] },
            BatterSpec { name: "Juarez", power: 46.0, contact: 70.0, glove: 58.0, speed: 55.0, archetype: None, techniques: &[("two_strike_assassin", 1)], traits: &[Iceman] },
            BatterSpec { name: "Pell", power: 40.0, contact: 68.0, glove: 64.0, speed: 50.0, archetype: None, techniques: &[("zen_focus", 1)], traits: &[Anchor] },
            BatterSpec { name: "Novak", power: 48.0, contact: 66.0, glove: 66.0, speed: 48.0, archetype: None, techniques: &[("wall_of_leather", 1)], traits: &[Anchor] },
            BatterSpec { name: "Grange", power: 50.0, contact: 64.0, glove: 60.0, speed: 46.0, archetype: None, techniques: &[], traits: &[Professor] },
            BatterSpec { name: "Liu", power: 45.0, contact: 62.0, glove: 58.0, speed: 52.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Marsh", power: 43.0, contact: 60.0, glove: 56.0, speed: 50.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Price", power: 41.0, contact: 58.0, glove: 55.0, speed: 48.0, archetype: None, techniques: &[], traits: &[] },
        ],
        &[
            PitcherSpec { name: "Easel", role: Role::Starter, velocity: 52.0, control: 84.0, breaking: 62.0, archetype: Some(Archetype::Painter), techniques: &[("painted_corners", 2)], traits: &[Professor] },
            PitcherSpec { name: "Stroke", role: Role::Reliever, velocity: 50.0, control: 78.0, breaking: 58.0, archetype: None, techniques: &[("painted_corners", 1)], traits: &[Workhorse] },
            PitcherSpec { name: "Glaze", role: Role::Reliever, velocity: 48.0, control: 74.0, breaking: 56.0, archetype: None, techniques: &[], traits: &[Workhorse] },
        ],
    );

    let speedsters = build_club(
        "Delta Jackrabbits",
        &[
            BatterSpec { name: "Flint", power: 38.0, contact: 64.0, glove: 58.0, speed: 84.0, archetype: Some(Archetype::Tablesetter), techniques: &[("greased_lightning", 2)], traits: &[Sparkplug] },
            BatterSpec { name: "Rook", power: 36.0, contact: 66.0, glove: 60.0, speed: 80.0, archetype: None, techniques: &[("greased_lightning", 1)], traits: &[Sparkplug] },
            BatterSpec { name: "Vale", power: 40.0, contact: 62.0, glove: 56.0, speed: 78.0, archetype: None, techniques: &[], traits: &[Sparkplug] },
            BatterSpec { name: "Knox", power: 42.0, contact: 60.0, glove: 54.0, speed: 74.0, archetype: None, techniques: &[], traits: &[Sparkplug, Gambler] },
            BatterSpec { name: "Irons", power: 50.0, contact: 58.0, glove: 52.0, speed: 70.0, archetype: None, techniques: &[], traits: &[Captain] },
            BatterSpec { name: "Mercer", power: 48.0, contact: 56.0, glove: 55.0, speed: 66.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Dane", power: 44.0, contact: 54.0, glove: 58.0, speed: 64.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Soto", power: 42.0, contact: 52.0, glove: 60.0, speed: 62.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Byrd", power: 40.0, contact: 50.0, glove: 62.0, speed: 60.0, archetype: None, techniques: &[], traits: &[] },
        ],
        &[
            PitcherSpec { name: "Gale", role: Role::Starter, velocity: 68.0, control: 60.0, breaking: 58.0, archetype: None, techniques: &[("time_warp", 1)], traits: &[Workhorse] },
            PitcherSpec { name: "Brisk", role: Role::Reliever, velocity: 66.0, control: 58.0, breaking: 54.0, archetype: None, techniques: &[], traits: &[Workhorse] },
            PitcherSpec { name: "Squall", role: Role::Reliever, velocity: 64.0, control: 55.0, breaking: 52.0, archetype: None, techniques: &[], traits: &[] },
        ],
    );

    let balanced = build_club(
        "Meridian Standards",
        &[
            BatterSpec { name: "Ford", power: 62.0, contact: 62.0, glove: 62.0, speed: 62.0, archetype: Some(Archetype::FiveTool), techniques: &[], traits: &[Captain, Clutch] },
            BatterSpec { name: "Grant", power: 60.0, contact: 60.0, glove: 60.0, speed: 60.0, archetype: Some(Archetype::FiveTool), techniques: &[], traits: &[Captain] },
            BatterSpec { name: "Hale", power: 58.0, contact: 58.0, glove: 58.0, speed: 58.0, archetype: None, techniques: &[("heavy_barrel", 1)], traits: &[Clutch] },
            BatterSpec { name: "Ives", power: 56.0, contact: 60.0, glove: 56.0, speed: 56.0, archetype: None, techniques: &[("quick_wrists", 1)], traits: &[Anchor] },
            BatterSpec { name: "Jute", power: 54.0, contact: 58.0, glove: 58.0, speed: 54.0, archetype: None, techniques: &[], traits: &[Anchor] },
            BatterSpec { name: "Kerr", power: 56.0, contact: 56.0, glove: 56.0, speed: 56.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Lund", power: 54.0, contact: 54.0, glove: 54.0, speed: 54.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Moor", power: 52.0, contact: 52.0, glove: 52.0, speed: 52.0, archetype: None, techniques: &[], traits: &[] },
            BatterSpec { name: "Nash", power: 50.0, contact: 50.0, glove: 50.0, speed: 50.0, archetype: None, techniques: &[], traits: &[] },
        ],
        &[
            PitcherSpec { name: "Orr", role: Role::Starter, velocity: 62.0, control: 64.0, breaking: 60.0, archetype: None, techniques: &[("repertoire", 2)], traits: &[Professor] },
            PitcherSpec { name: "Pike", role: Role::Reliever, velocity: 60.0, control: 62.0, breaking: 58.0, archetype: Some(Archetype::Junkballer), techniques: &[("total_eclipse", 1)], traits: &[Professor] },
            PitcherSpec { name: "Rudd", role: Role::Reliever, velocity: 58.0, control: 60.0, breaking: 56.0, archetype: None, techniques: &[("knuckleball", 1)], traits: &[] },
        ],
    );

    vec![sluggers, painters, speedsters, balanced]
}
