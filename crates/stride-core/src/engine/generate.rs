//! Plan generation: phase split, volume progression, session distribution.

use stride_db::models::{Phase, SessionType};

use super::types::{
    EngineError, GeneratedPlan, GeneratedSession, GeneratedWeek, PlanRequest, TrainingStatus,
};

/// Weekly volume increase applied after each regular Base/Build week.
const PROGRESSION: f64 = 1.1;

/// Minutes per km-equivalent unit for a regular run.
const PACE_MINUTES: f64 = 6.0;

/// Minutes per km-equivalent unit for the long run (slower pace).
const LONG_RUN_PACE_MINUTES: f64 = 6.5;

/// Number of weeks allocated to each periodization phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSplit {
    pub base: i32,
    pub build: i32,
    pub peak: i32,
    pub taper: i32,
}

/// Split the total duration into phases: Base -> Build -> Peak -> Taper.
///
/// Taper and peak are floored percentages with a minimum of one week; base
/// absorbs the remainder so the four counts always sum to exactly
/// `duration_weeks`. With the minimum duration of 4 every phase gets one
/// week.
pub fn split_phases(duration_weeks: i32) -> Result<PhaseSplit, EngineError> {
    if duration_weeks < 4 {
        return Err(EngineError::DurationTooShort(duration_weeks));
    }

    let d = f64::from(duration_weeks);
    let taper = ((d * 0.15).floor() as i32).max(1);
    let peak = ((d * 0.20).floor() as i32).max(1);
    let build = (d * 0.30).floor() as i32;

    // Remainder goes to base so the sum lands exactly on duration_weeks.
    let base = duration_weeks - build - peak - taper;

    Ok(PhaseSplit {
        base,
        build,
        peak,
        taper,
    })
}

/// How weekly volume evolves within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolumePolicy {
    /// 10% weekly increase with every 4th week (absolute counter) a deload
    /// at 70% of the current volume.
    Grow,
    /// Volume held at whatever value progression reached.
    Hold,
    /// Report 60% of the running value while the running value itself drops
    /// by 30% per week -- the reduction is front-loaded on purpose.
    Taper,
}

/// Generate the week skeleton with volume progression. Sessions are filled
/// in by [`build_sessions`].
pub fn build_weeks(request: &PlanRequest) -> Result<Vec<GeneratedWeek>, EngineError> {
    let phases = split_phases(request.duration_weeks)?;
    let mut current = request.level.starting_volume();

    let mut weeks = Vec::with_capacity(request.duration_weeks as usize);
    let mut week_counter: i32 = 1;

    let plan = [
        (Phase::Base, phases.base, VolumePolicy::Grow),
        (Phase::Build, phases.build, VolumePolicy::Grow),
        (Phase::Peak, phases.peak, VolumePolicy::Hold),
        (Phase::Taper, phases.taper, VolumePolicy::Taper),
    ];

    for (phase, count, policy) in plan {
        for _ in 0..count {
            let volume = match policy {
                VolumePolicy::Grow => {
                    if week_counter % 4 == 0 {
                        // Deload week: reduced volume, no progression.
                        current * 0.7
                    } else {
                        let v = current;
                        current *= PROGRESSION;
                        v
                    }
                }
                VolumePolicy::Hold => current,
                VolumePolicy::Taper => {
                    let v = current * 0.6;
                    current *= 0.7;
                    v
                }
            };

            weeks.push(GeneratedWeek {
                week_number: week_counter,
                phase,
                volume_distance: volume.round() as i32,
                volume_duration: (volume * PACE_MINUTES).round() as i32,
                sessions: Vec::new(),
            });
            week_counter += 1;
        }
    }

    Ok(weeks)
}

/// Distribute sessions within each week.
///
/// One long run fixed on day 7 at 35% of the week's volume, the remaining
/// sessions splitting the other 65% evenly on days `1 + 2*i`, clamped to
/// day 6. The clamp means large session counts can place several sessions
/// on day 6; that collision is a known property of the distribution, not
/// corrected here.
pub fn build_sessions(mut weeks: Vec<GeneratedWeek>, request: &PlanRequest) -> Vec<GeneratedWeek> {
    let count = request.sessions_per_week;

    for week in &mut weeks {
        let mut sessions = Vec::with_capacity(count.max(1) as usize);

        let long_run_dist = (f64::from(week.volume_distance) * 0.35).round() as i32;
        let remaining_dist = week.volume_distance - long_run_dist;

        sessions.push(GeneratedSession {
            day_of_week: 7,
            session_type: SessionType::Run,
            target_distance: Some(long_run_dist),
            target_duration: Some((f64::from(long_run_dist) * LONG_RUN_PACE_MINUTES).round() as i32),
            description: "Long Run - Easy conversational pace".to_owned(),
        });

        if count >= 2 {
            let easy_run_dist = (f64::from(remaining_dist) / f64::from(count - 1)).round() as i32;

            for i in 0..count - 1 {
                let day = 1 + i * 2;
                let description = if week.phase == Phase::Peak && i == 0 {
                    "Intervals - Hard effort"
                } else {
                    "Easy Run"
                };

                sessions.push(GeneratedSession {
                    // Clamp to Saturday; overflow collides there.
                    day_of_week: day.min(6),
                    session_type: SessionType::Run,
                    target_distance: Some(easy_run_dist),
                    target_duration: Some(
                        (f64::from(easy_run_dist) * PACE_MINUTES).round() as i32,
                    ),
                    description: description.to_owned(),
                });
            }
        }

        sessions.sort_by_key(|s| s.day_of_week);
        week.sessions = sessions;
    }

    weeks
}

/// Run the full engine: phase split, week progression, session distribution.
///
/// Deterministic and total for any request with `duration_weeks >= 4`.
pub fn generate(request: &PlanRequest) -> Result<GeneratedPlan, EngineError> {
    let weeks = build_weeks(request)?;
    let weeks = build_sessions(weeks, request);

    Ok(GeneratedPlan {
        name: format!(
            "{} Plan ({})",
            request.objective.as_str().to_uppercase(),
            request.level
        ),
        description: format!(
            "Generated {}-week plan for {}.",
            request.duration_weeks, request.objective
        ),
        start_date: request.start_date,
        duration_weeks: request.duration_weeks,
        status: TrainingStatus::Active,
        weeks,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::engine::{Level, Objective};

    fn request(
        objective: Objective,
        level: Level,
        duration_weeks: i32,
        sessions_per_week: i32,
    ) -> PlanRequest {
        PlanRequest {
            objective,
            level,
            duration_weeks,
            sessions_per_week,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    // -----------------------------------------------------------------
    // Phase split
    // -----------------------------------------------------------------

    #[test]
    fn split_twelve_weeks() {
        // taper = floor(1.8) -> 1, peak = floor(2.4) -> 2,
        // build = floor(3.6) -> 3, base = 12 - 6 = 6
        let phases = split_phases(12).unwrap();
        assert_eq!(
            phases,
            PhaseSplit {
                base: 6,
                build: 3,
                peak: 2,
                taper: 1
            }
        );
    }

    #[test]
    fn split_minimum_duration() {
        let phases = split_phases(4).unwrap();
        assert_eq!(
            phases,
            PhaseSplit {
                base: 1,
                build: 1,
                peak: 1,
                taper: 1
            }
        );
    }

    #[test]
    fn split_rejects_short_duration() {
        assert_eq!(split_phases(3), Err(EngineError::DurationTooShort(3)));
        assert_eq!(split_phases(0), Err(EngineError::DurationTooShort(0)));
    }

    #[test]
    fn split_sums_exactly_for_all_valid_durations() {
        for d in 4..=52 {
            let p = split_phases(d).unwrap();
            assert_eq!(p.base + p.build + p.peak + p.taper, d, "duration {d}");
            assert!(p.base >= 1, "duration {d}: base {}", p.base);
            assert!(p.peak >= 1, "duration {d}");
            assert!(p.taper >= 1, "duration {d}");
        }
    }

    // -----------------------------------------------------------------
    // Week progression
    // -----------------------------------------------------------------

    #[test]
    fn builds_correct_number_of_weeks() {
        let req = request(Objective::HalfMarathon, Level::Intermediate, 12, 4);
        let weeks = build_weeks(&req).unwrap();
        assert_eq!(weeks.len(), 12);
        assert_eq!(weeks[0].week_number, 1);
        assert_eq!(weeks[11].week_number, 12);
        assert_eq!(weeks[0].phase, Phase::Base);
        assert_eq!(weeks[11].phase, Phase::Taper);
    }

    #[test]
    fn week_numbers_are_contiguous() {
        let req = request(Objective::Marathon, Level::Advanced, 20, 3);
        let weeks = build_weeks(&req).unwrap();
        for (i, week) in weeks.iter().enumerate() {
            assert_eq!(week.week_number, i as i32 + 1);
        }
    }

    #[test]
    fn every_fourth_week_is_a_deload() {
        // Beginner starts at 20: w1=20, w2=22, w3=24.2, w4=deload 26.62*0.7.
        let req = request(Objective::TenK, Level::Beginner, 12, 3);
        let weeks = build_weeks(&req).unwrap();
        assert_eq!(weeks[0].volume_distance, 20);
        assert_eq!(weeks[1].volume_distance, 22);
        assert_eq!(weeks[2].volume_distance, 24);
        assert_eq!(weeks[3].volume_distance, 19); // 26.62 * 0.7 = 18.634
        assert!(weeks[3].volume_distance < weeks[2].volume_distance);
        // Progression resumes from the undiscounted running value.
        assert_eq!(weeks[4].volume_distance, 27);
    }

    #[test]
    fn peak_holds_volume_steady() {
        let req = request(Objective::Marathon, Level::Intermediate, 12, 4);
        let weeks = build_weeks(&req).unwrap();
        let peak: Vec<_> = weeks.iter().filter(|w| w.phase == Phase::Peak).collect();
        assert_eq!(peak.len(), 2);
        assert_eq!(peak[0].volume_distance, peak[1].volume_distance);
    }

    #[test]
    fn taper_volumes_drop_week_over_week() {
        let req = request(Objective::Marathon, Level::Advanced, 20, 4);
        let weeks = build_weeks(&req).unwrap();
        let taper: Vec<_> = weeks.iter().filter(|w| w.phase == Phase::Taper).collect();
        assert!(taper.len() >= 2);
        for pair in taper.windows(2) {
            assert!(pair[1].volume_distance < pair[0].volume_distance);
        }
        // Taper weeks sit well below the peak volume.
        let peak_volume = weeks
            .iter()
            .find(|w| w.phase == Phase::Peak)
            .unwrap()
            .volume_distance;
        assert!(taper[0].volume_distance < peak_volume);
    }

    #[test]
    fn taper_reports_sixty_percent_while_decaying_thirty() {
        // Advanced over 20 weeks holds 129.687... through Peak. Each taper
        // week records 60% of the running value while the running value
        // itself drops 30%: 77.81 -> 78, 54.47 -> 54, 38.13 -> 38. Any
        // other report/decay pair breaks these exact values.
        let req = request(Objective::Marathon, Level::Advanced, 20, 4);
        let weeks = build_weeks(&req).unwrap();
        let taper: Vec<_> = weeks
            .iter()
            .filter(|w| w.phase == Phase::Taper)
            .map(|w| w.volume_distance)
            .collect();
        assert_eq!(taper, vec![78, 54, 38]);
    }

    #[test]
    fn duration_is_six_minutes_per_unit() {
        let req = request(Objective::FiveK, Level::Beginner, 8, 3);
        let weeks = build_weeks(&req).unwrap();
        // Week 1 records the unrounded volume times six.
        assert_eq!(weeks[0].volume_duration, 120);
    }

    // -----------------------------------------------------------------
    // Session distribution
    // -----------------------------------------------------------------

    #[test]
    fn distributes_sessions_across_the_week() {
        let req = request(Objective::TenK, Level::Beginner, 8, 3);
        let weeks = build_sessions(build_weeks(&req).unwrap(), &req);

        let week1 = &weeks[0];
        assert_eq!(week1.sessions.len(), 3);

        let long_run: Vec<_> = week1.sessions.iter().filter(|s| s.day_of_week == 7).collect();
        assert_eq!(long_run.len(), 1);
        assert_eq!(long_run[0].session_type, SessionType::Run);
        assert!(long_run[0].description.contains("Long Run"));

        // Volume 20: long run 7, remaining 13 split over 2 -> 7 each (rounded).
        assert_eq!(long_run[0].target_distance, Some(7));
        assert_eq!(long_run[0].target_duration, Some(46)); // 7 * 6.5 = 45.5
        let easy: Vec<_> = week1.sessions.iter().filter(|s| s.day_of_week != 7).collect();
        assert_eq!(easy.len(), 2);
        for s in easy {
            assert_eq!(s.target_distance, Some(7));
            assert_eq!(s.target_duration, Some(42));
        }
    }

    #[test]
    fn sessions_are_sorted_by_day() {
        let req = request(Objective::Marathon, Level::Advanced, 16, 5);
        let weeks = build_sessions(build_weeks(&req).unwrap(), &req);
        for week in &weeks {
            for pair in week.sessions.windows(2) {
                assert!(pair[0].day_of_week <= pair[1].day_of_week);
            }
        }
    }

    #[test]
    fn day_clamp_collides_on_saturday_for_large_session_counts() {
        // Days come out as 1, 3, 5, then 7/9/11 all clamped to 6. The
        // collision is a known property of the distribution; this pins the
        // current behavior rather than hiding it.
        let req = request(Objective::Marathon, Level::Advanced, 12, 7);
        let weeks = build_sessions(build_weeks(&req).unwrap(), &req);

        let week1 = &weeks[0];
        assert_eq!(week1.sessions.len(), 7);
        let on_saturday = week1
            .sessions
            .iter()
            .filter(|s| s.day_of_week == 6)
            .count();
        assert_eq!(on_saturday, 3);
        let on_sunday = week1.sessions.iter().filter(|s| s.day_of_week == 7).count();
        assert_eq!(on_sunday, 1);
    }

    #[test]
    fn peak_week_gets_an_interval_session() {
        let req = request(Objective::HalfMarathon, Level::Intermediate, 12, 4);
        let weeks = build_sessions(build_weeks(&req).unwrap(), &req);

        for week in &weeks {
            let has_intervals = week
                .sessions
                .iter()
                .any(|s| s.description == "Intervals - Hard effort");
            if week.phase == Phase::Peak {
                assert!(has_intervals, "peak week {} lacks intervals", week.week_number);
                // Type stays "run"; only the description is overridden.
                assert!(week.sessions.iter().all(|s| s.session_type == SessionType::Run));
            } else {
                assert!(!has_intervals, "week {} has intervals", week.week_number);
            }
        }
    }

    // -----------------------------------------------------------------
    // Full generation
    // -----------------------------------------------------------------

    #[test]
    fn generates_a_full_plan_structure() {
        let req = request(Objective::Marathon, Level::Advanced, 16, 5);
        let plan = generate(&req).unwrap();

        assert_eq!(plan.name, "MARATHON Plan (advanced)");
        assert_eq!(plan.description, "Generated 16-week plan for marathon.");
        assert_eq!(plan.duration_weeks, 16);
        assert_eq!(plan.status, TrainingStatus::Active);
        assert_eq!(plan.weeks.len(), 16);
        for week in &plan.weeks {
            assert_eq!(week.sessions.len(), 5);
        }
    }

    #[test]
    fn every_valid_request_shape_holds_invariants() {
        for duration in [4, 5, 8, 13, 26, 52] {
            for sessions in 2..=7 {
                let req = request(Objective::TenK, Level::Intermediate, duration, sessions);
                let plan = generate(&req).unwrap();
                assert_eq!(plan.weeks.len(), duration as usize);
                for week in &plan.weeks {
                    assert_eq!(week.sessions.len(), sessions as usize, "d={duration} s={sessions}");
                    let long_runs =
                        week.sessions.iter().filter(|s| s.day_of_week == 7).count();
                    assert_eq!(long_runs, 1);
                    assert!(week.volume_distance >= 0);
                    assert!(week.volume_duration >= 0);
                }
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let req = request(Objective::HalfMarathon, Level::Beginner, 10, 4);
        let first = generate(&req).unwrap();
        let second = generate(&req).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn generate_rejects_short_duration() {
        let req = request(Objective::FiveK, Level::Beginner, 3, 3);
        assert_eq!(generate(&req), Err(EngineError::DurationTooShort(3)));
    }
}
