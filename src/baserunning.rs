use crate::game::{AtBatOutcome, BaseState};
use crate::id::PlayerId;
use crate::pipeline;
use crate::player::Player;
use crate::rng::RandomSource;
use crate::trace::{ExtraBaseTrace, TraceRecorder};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BaserunningOutcome {
    pub runs: u32,
    pub scored: Vec<PlayerId>,
    pub thrown_out: Option<PlayerId>,
}

/// Post-hit extra-base attempts: speed against the defense's glove. Runs
/// only on singles and doubles, after normal advancement, and only while the
/// half-inning is live. A thrown-out runner is removed but adds no out; at
/// most one runner is thrown out per play, and an out ends the running.
///
/// Attempt order is part of the roll-order contract: the runner on third
/// goes before the runner on second.
pub fn resolve_extra_bases(
    outcome: AtBatOutcome,
    bases: &mut BaseState,
    offense: &[Player],
    defense_glove: f64,
    outs: u8,
    rng: &mut RandomSource,
    trace: &mut TraceRecorder,
) -> BaserunningOutcome {
    let mut result = BaserunningOutcome::default();
    if outs >= 3 {
        return result;
    }
    let two_outs = outs == 2;

    // Runner on third tries for home, on either hit.
    if matches!(outcome, AtBatOutcome::Single | AtBatOutcome::Double) && bases.is_occupied(2) {
        match attempt(bases, 2, offense, defense_glove, two_outs, rng, trace) {
            Attempt::Safe(runner) => {
                result.runs += 1;
                result.scored.push(runner);
            }
            Attempt::Out(runner) => {
                result.thrown_out = Some(runner);
                return result;
            }
            Attempt::Held => {}
        }
    }

    // On a single, the runner now on second tries for third when third is
    // open in front of him.
    if outcome == AtBatOutcome::Single && bases.is_occupied(1) && !bases.is_occupied(2) {
        match attempt(bases, 1, offense, defense_glove, two_outs, rng, trace) {
            Attempt::Safe(_) | Attempt::Held => {}
            Attempt::Out(runner) => {
                result.thrown_out = Some(runner);
            }
        }
    }

    result
}

enum Attempt {
    Safe(PlayerId),
    Out(PlayerId),
    Held,
}

fn attempt(
    bases: &mut BaseState,
    from_base: usize,
    offense: &[Player],
    defense_glove: f64,
    two_outs: bool,
    rng: &mut RandomSource,
    trace: &mut TraceRecorder,
) -> Attempt {
    let Some(runner) = bases.runner(from_base).cloned() else {
        return Attempt::Held;
    };
    // Missing runners read as zero speed.
    let speed = offense
        .iter()
        .find(|player| player.id == runner)
        .map_or(0.0, pipeline::runner_speed);

    let attempt_chance = (15.0 + (speed - 50.0) * 0.5 + if two_outs { 15.0 } else { 0.0 })
        .clamp(5.0, 55.0);
    let success_chance = (55.0 + (speed - defense_glove) * 0.6).clamp(25.0, 90.0);

    let attempt_raw = rng.next_f64();
    let attempt_roll = attempt_raw * 100.0;
    let attempted = attempt_roll < attempt_chance;
    trace.roll(
        "extraBaseAttempt",
        attempt_raw,
        attempt_roll,
        Some(attempt_chance),
        Some(attempted),
    );

    let mut record = ExtraBaseTrace {
        runner: runner.clone(),
        from_base: from_base as u8 + 1,
        to_base: from_base as u8 + 2,
        attempt_chance,
        attempt_roll,
        attempted,
        success_chance,
        success_roll: None,
        safe: None,
    };

    if !attempted {
        trace.extra_base(record);
        return Attempt::Held;
    }

    let success_raw = rng.next_f64();
    let success_roll = success_raw * 100.0;
    let safe = success_roll < success_chance;
    trace.roll(
        "extraBaseSuccess",
        success_raw,
        success_roll,
        Some(success_chance),
        Some(safe),
    );
    record.success_roll = Some(success_roll);
    record.safe = Some(safe);
    trace.extra_base(record);

    let runner = bases.take(from_base).unwrap_or(runner);
    if safe {
        if from_base < 2 {
            bases.put(from_base + 1, runner.clone());
            Attempt::Safe(runner)
        } else {
            Attempt::Safe(runner)
        }
    } else {
        Attempt::Out(runner)
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_extra_bases;
    use crate::game::{AtBatOutcome, BaseState};
    use crate::id::PlayerId;
    use crate::player::{BatterStats, PitcherStats, Player, Role, Spirit};
    use crate::rng::RandomSource;
    use crate::trace::TraceRecorder;

    fn runner(id: &str, speed: f64) -> Player {
        Player {
            id: id.into(),
            name: id.to_owned(),
            role: Role::Batter,
            batting: BatterStats {
                power: 50.0,
                contact: 50.0,
                glove: 50.0,
                speed,
            },
            pitching: PitcherStats::default(),
            archetype: None,
            techniques: Vec::new(),
            equipment: Default::default(),
            spirit: Spirit::for_level(1),
            traits: Default::default(),
            level: 1,
        }
    }

    fn bases_with_third(id: &str) -> BaseState {
        let mut bases = BaseState::default();
        bases.put(2, id.into());
        bases
    }

    #[test]
    fn no_attempts_on_non_hits_or_dead_halves() {
        let offense = vec![runner("r", 90.0)];
        let mut trace = TraceRecorder::disabled();

        let mut bases = bases_with_third("r");
        let mut rng = RandomSource::scripted(vec![0.0]);
        let out = resolve_extra_bases(
            AtBatOutcome::Homerun,
            &mut bases,
            &offense,
            30.0,
            0,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.runs, 0);

        let mut bases = bases_with_third("r");
        let out = resolve_extra_bases(
            AtBatOutcome::Single,
            &mut bases,
            &offense,
            30.0,
            3,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.runs, 0);
        assert!(bases.is_occupied(2));
    }

    #[test]
    fn fast_runner_scores_from_third() {
        let offense = vec![runner("r", 90.0)];
        let mut bases = bases_with_third("r");
        // attempt 50 (15 + 20 + 15, two outs), success 90 (clamped).
        let mut rng = RandomSource::scripted(vec![0.40, 0.50]);
        let mut trace = TraceRecorder::disabled();
        let out = resolve_extra_bases(
            AtBatOutcome::Single,
            &mut bases,
            &offense,
            30.0,
            2,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.runs, 1);
        assert_eq!(out.scored, vec![PlayerId::from("r")]);
        assert!(!bases.is_occupied(2));
    }

    #[test]
    fn thrown_out_runner_is_removed_without_an_out() {
        let offense = vec![runner("r", 90.0)];
        let mut bases = bases_with_third("r");
        let mut rng = RandomSource::scripted(vec![0.40, 0.95]);
        let mut trace = TraceRecorder::disabled();
        let out = resolve_extra_bases(
            AtBatOutcome::Single,
            &mut bases,
            &offense,
            30.0,
            2,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.runs, 0);
        assert_eq!(out.thrown_out, Some("r".into()));
        assert!(!bases.is_occupied(2));
    }

    #[test]
    fn third_base_runner_goes_before_second() {
        let offense = vec![runner("lead", 90.0), runner("trail", 90.0)];
        let mut bases = BaseState::default();
        bases.put(2, "lead".into());
        bases.put(1, "trail".into());
        // lead scores (0.40/0.50), then trail takes third (0.40/0.50).
        let mut rng = RandomSource::scripted(vec![0.40, 0.50, 0.40, 0.50]);
        let mut trace = TraceRecorder::enabled(None);
        trace.begin_at_bat(crate::trace::AtBatStart {
            index: 0,
            inning: 1,
            half: crate::game::Half::Top,
            batter: "b".into(),
            pitcher: "p".into(),
            bases_before: [false, true, true],
            outs_before: 2,
        });
        let out = resolve_extra_bases(
            AtBatOutcome::Single,
            &mut bases,
            &offense,
            30.0,
            2,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.runs, 1);
        assert!(bases.is_occupied(2));
        assert_eq!(bases.runner(2), Some(&"trail".into()));
        assert!(!bases.is_occupied(1));

        trace.finish_at_bat(AtBatOutcome::Single, 1, bases.occupancy(), 2);
        let log = trace.into_log(Default::default(), 1);
        let attempts = &log.at_bats[0].extra_bases;
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].runner, PlayerId::from("lead"));
        assert_eq!(attempts[1].runner, PlayerId::from("trail"));
    }

    #[test]
    fn an_out_ends_the_running() {
        let offense = vec![runner("lead", 90.0), runner("trail", 90.0)];
        let mut bases = BaseState::default();
        bases.put(2, "lead".into());
        bases.put(1, "trail".into());
        // lead is cut down at the plate; trail never goes.
        let mut rng = RandomSource::scripted(vec![0.40, 0.95]);
        let mut trace = TraceRecorder::disabled();
        let out = resolve_extra_bases(
            AtBatOutcome::Single,
            &mut bases,
            &offense,
            30.0,
            2,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.thrown_out, Some("lead".into()));
        assert!(bases.is_occupied(1));
        let RandomSource::Scripted(script) = &rng else {
            unreachable!()
        };
        assert_eq!(script.call_count(), 2);
    }

    #[test]
    fn second_base_runner_holds_when_third_is_occupied() {
        let offense = vec![runner("lead", 10.0), runner("trail", 90.0)];
        let mut bases = BaseState::default();
        bases.put(2, "lead".into());
        bases.put(1, "trail".into());
        // lead declines (slow: chance clamps to 5 with 2 outs at speed 10 ->
        // 15 - 20 + 15 = 10), roll 0.2 -> 20 >= 10 declines; trail may not go.
        let mut rng = RandomSource::scripted(vec![0.2]);
        let mut trace = TraceRecorder::disabled();
        let out = resolve_extra_bases(
            AtBatOutcome::Single,
            &mut bases,
            &offense,
            30.0,
            2,
            &mut rng,
            &mut trace,
        );
        assert_eq!(out.runs, 0);
        assert!(bases.is_occupied(2) && bases.is_occupied(1));
        let RandomSource::Scripted(script) = &rng else {
            unreachable!()
        };
        assert_eq!(script.call_count(), 1);
    }

    #[test]
    fn chances_clamp_at_their_bounds() {
        // Slow runner, no pressure: 15 - 25 = -10 clamps to 5. Elite defense
        // drives success to the 25 floor.
        let offense = vec![runner("slow", 0.0)];
        let mut bases = bases_with_third("slow");
        let mut rng = RandomSource::scripted(vec![0.04, 0.99]);
        let mut trace = TraceRecorder::enabled(None);
        trace.begin_at_bat(crate::trace::AtBatStart {
            index: 0,
            inning: 1,
            half: crate::game::Half::Top,
            batter: "b".into(),
            pitcher: "p".into(),
            bases_before: [false, false, true],
            outs_before: 0,
        });
        resolve_extra_bases(
            AtBatOutcome::Double,
            &mut bases,
            &offense,
            100.0,
            0,
            &mut rng,
            &mut trace,
        );
        trace.finish_at_bat(AtBatOutcome::Double, 0, bases.occupancy(), 0);
        let log = trace.into_log(Default::default(), 1);
        let attempt = &log.at_bats[0].extra_bases[0];
        assert_eq!(attempt.attempt_chance, 5.0);
        assert_eq!(attempt.success_chance, 25.0);

        // Elite runner with two outs caps at 55/90.
        let offense = vec![runner("fast", 100.0)];
        let mut bases = bases_with_third("fast");
        let mut rng = RandomSource::scripted(vec![0.5]);
        let mut trace = TraceRecorder::enabled(None);
        trace.begin_at_bat(crate::trace::AtBatStart {
            index: 0,
            inning: 1,
            half: crate::game::Half::Top,
            batter: "b".into(),
            pitcher: "p".into(),
            bases_before: [false, false, true],
            outs_before: 2,
        });
        resolve_extra_bases(
            AtBatOutcome::Double,
            &mut bases,
            &offense,
            0.0,
            2,
            &mut rng,
            &mut trace,
        );
        trace.finish_at_bat(AtBatOutcome::Double, 0, bases.occupancy(), 2);
        let log = trace.into_log(Default::default(), 1);
        let attempt = &log.at_bats[0].extra_bases[0];
        assert_eq!(attempt.attempt_chance, 55.0);
        assert_eq!(attempt.success_chance, 90.0);
    }
}
