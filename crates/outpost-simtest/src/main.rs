//! Outpost Headless Simulation Harness
//!
//! Validates the behavior engine end-to-end without any UI or shell.
//! Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p outpost-simtest
//!   cargo run -p outpost-simtest -- --verbose
//!   cargo run -p outpost-simtest -- --json

use serde::Serialize;

use outpost_core::components::{
    Location, NaturalAttributes, Person, PhysicalCondition, Robot, Skills,
};
use outpost_core::engine::SettlementEngine;
use outpost_core::generation::SettlementConfig;
use outpost_core::hooks::HookEvent;
use outpost_core::medical::{
    ComplaintType, MedicalStation, MedicationKind, StationId, StationKind,
};
use outpost_core::persistence::{load_settlement, save_settlement};

use outpost_logic::constants::scores;
use outpost_logic::medical::{
    adjusted_treatment_duration, estimated_exam_time, exam_leftover, skill_score_factor,
};
use outpost_logic::rating::RatingScore;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    passed: usize,
    failed: usize,
    results: Vec<TestResult>,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    if !json {
        println!("=== Outpost Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Rating math
    results.extend(validate_rating_math(json));

    // 2. Medical timing formulas
    results.extend(validate_medical_math(json));

    // 3. Scripted care pipeline: request → treat → rest → resolve
    results.extend(validate_care_pipeline(json));

    // 4. Death and postmortem exam flow
    results.extend(validate_postmortem_flow(json));

    // 5. Medication round
    results.extend(validate_medication(json));

    // 6. Settlement soak with invariant checks every tick
    results.extend(validate_settlement_soak(json, verbose));

    // 7. Snapshot persistence
    results.extend(validate_snapshot(json));

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();

    if json {
        let summary = Summary {
            passed,
            failed,
            results,
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("failed to serialize summary: {}", e);
                std::process::exit(2);
            }
        }
    } else {
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed,
            results.len(),
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn check(results: &mut Vec<TestResult>, name: &str, passed: bool, detail: String) {
    results.push(TestResult {
        name: name.to_string(),
        passed,
        detail,
    });
}

// ── 1. Rating math ──────────────────────────────────────────────────────

fn validate_rating_math(json: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Rating Math ---");
    }
    let mut results = Vec::new();

    let score = RatingScore::new("base", 100.0)
        .add("aging", 50.0)
        .multiply("skill", 2.0);
    check(
        &mut results,
        "rating_modifier_order",
        (score.score() - 300.0).abs() < 1e-9,
        format!("(100 + 50) * 2 = {}", score.score()),
    );

    check(
        &mut results,
        "rating_zero_not_candidate",
        !RatingScore::unfit().is_candidate(),
        "unfit score is never offered".into(),
    );

    let unskilled = skill_score_factor(0);
    check(
        &mut results,
        "rating_skill_floor",
        unskilled > 0.0 && unskilled < skill_score_factor(1),
        format!("skill 0 factor = {}", unskilled),
    );

    // Base constants keep medical work above routine labor
    let bases = [
        scores::BODY_EXAM_BASE,
        scores::TREAT_PATIENT_BASE,
        scores::SELF_TREAT_BASE,
        scores::REQUEST_TREATMENT_BASE,
        scores::BED_REST_BASE,
        scores::PRESCRIBE_BASE,
    ];
    check(
        &mut results,
        "rating_bases_positive",
        bases.iter().all(|&b| b > 0.0),
        format!("{} base constants all positive", bases.len()),
    );

    results
}

// ── 2. Medical timing formulas ──────────────────────────────────────────

fn validate_medical_math(json: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Medical Math ---");
    }
    let mut results = Vec::new();

    // Estimates shrink with skill, grow with weak attributes
    let novice = estimated_exam_time(0, 50, 50, 0.0);
    let expert = estimated_exam_time(5, 50, 50, 0.0);
    check(
        &mut results,
        "exam_estimate_skill",
        expert < novice,
        format!("novice {:.1} > expert {:.1}", novice, expert),
    );

    let weak = estimated_exam_time(2, 10, 10, 0.0);
    let strong = estimated_exam_time(2, 90, 90, 0.0);
    check(
        &mut results,
        "exam_estimate_attributes",
        strong < weak,
        format!("weak {:.1} > strong {:.1}", weak, strong),
    );

    // Leftover damping never exceeds half the tick
    let mut damped = true;
    for work in 0..40 {
        if exam_leftover(f64::from(work) * 5.0, 10.0) > 5.0 {
            damped = false;
        }
    }
    check(
        &mut results,
        "exam_leftover_damped",
        damped,
        "leftover capped at half the tick across sweep".into(),
    );

    // Skill shortens treatments, floored at the base duration
    let base = adjusted_treatment_duration(80.0, 2, 0);
    let fast = adjusted_treatment_duration(80.0, 2, 4);
    check(
        &mut results,
        "treatment_duration_adjustment",
        (base - 80.0).abs() < 1e-9 && (fast - 40.0).abs() < 1e-9,
        format!("unskilled {:.0}, skilled {:.0}", base, fast),
    );

    results
}

// ── 3. Care pipeline ────────────────────────────────────────────────────

fn validate_care_pipeline(json: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Care Pipeline ---");
    }
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(21);
    engine.medical.add_station(MedicalStation::new(
        StationKind::Building { building_id: 0 },
        3,
        2,
    ));
    engine.world.spawn((
        Robot,
        Location::Settlement,
        Skills {
            medicine: 4,
            ..Default::default()
        },
    ));
    let mut condition = PhysicalCondition::default();
    condition.add_problem(ComplaintType::BrokenBone);
    let patient = engine.world.spawn((
        Person,
        Location::Settlement,
        Skills::default(),
        NaturalAttributes::default(),
        condition,
    ));

    let mut resolved_at = None;
    for tick in 0..200 {
        engine.advance(25.0);
        let condition = engine.world.get::<&PhysicalCondition>(patient).unwrap();
        if condition.problem(ComplaintType::BrokenBone).is_none() {
            resolved_at = Some(tick);
            break;
        }
    }
    check(
        &mut results,
        "pipeline_resolves",
        resolved_at.is_some(),
        match resolved_at {
            Some(t) => format!("broken bone resolved after {} ticks", t + 1),
            None => "broken bone never resolved".into(),
        },
    );

    let station = engine.medical.station(StationId(0));
    check(
        &mut results,
        "pipeline_queues_drained",
        station.awaiting().is_empty() && station.treating().is_empty()
            && station.patient_num() == 0,
        format!(
            "awaiting={} treating={} occupancy={}",
            station.awaiting().len(),
            station.treating().len(),
            station.patient_num()
        ),
    );

    let treat_events = engine
        .hooks
        .count(|e| matches!(e, HookEvent::Event { tag, .. } if *tag == "treatment started"));
    check(
        &mut results,
        "pipeline_treatment_event",
        treat_events >= 1,
        format!("{} treatment-start events", treat_events),
    );

    results
}

// ── 4. Postmortem flow ──────────────────────────────────────────────────

fn validate_postmortem_flow(json: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Postmortem Flow ---");
    }
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(33);
    engine.medical.add_station(MedicalStation::new(
        StationKind::Building { building_id: 0 },
        3,
        1,
    ));
    engine.world.spawn((
        Robot,
        Location::Settlement,
        Skills {
            medicine: 3,
            ..Default::default()
        },
    ));
    // A ruptured appendix nobody can treat in time (station down)
    let mut condition = PhysicalCondition::default();
    condition.add_problem(ComplaintType::RupturedAppendix);
    let doomed = engine.world.spawn((
        Person,
        Location::Settlement,
        Skills::default(),
        NaturalAttributes::default(),
        condition,
    ));
    engine
        .medical
        .station_mut(StationId(0))
        .set_malfunction(true);

    for _ in 0..40 {
        engine.advance(25.0);
    }
    let died = !engine.world.get::<&PhysicalCondition>(doomed).unwrap().alive;
    check(
        &mut results,
        "postmortem_death_recorded",
        died && engine.medical.deaths().count() == 1,
        format!(
            "alive={} deaths={}",
            !died,
            engine.medical.deaths().count()
        ),
    );

    engine
        .medical
        .station_mut(StationId(0))
        .set_malfunction(false);
    let mut exam_done = false;
    for _ in 0..200 {
        engine.advance(25.0);
        if let Some((_, death)) = engine.medical.deaths().next() {
            if death.exam_done {
                exam_done = true;
                break;
            }
        }
    }
    let buried = engine
        .hooks
        .count(|e| matches!(e, HookEvent::Buried { .. }));
    check(
        &mut results,
        "postmortem_exam_and_burial",
        exam_done && buried == 1,
        format!("exam_done={} burials={}", exam_done, buried),
    );

    if let Some((_, death)) = engine.medical.deaths().next() {
        check(
            &mut results,
            "postmortem_cause_appended",
            death.cause.contains("Ruptured Appendix"),
            format!("cause = {:?}", death.cause),
        );
    }

    results
}

// ── 5. Medication ───────────────────────────────────────────────────────

fn validate_medication(json: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Medication ---");
    }
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(17);
    engine.medical.add_station(MedicalStation::new(
        StationKind::Building { building_id: 0 },
        3,
        1,
    ));
    engine.world.spawn((
        Robot,
        Location::Settlement,
        Skills {
            medicine: 3,
            ..Default::default()
        },
    ));
    let mut condition = PhysicalCondition::default();
    condition.stress = 90.0;
    let stressed = engine.world.spawn((
        Person,
        Location::Settlement,
        Skills::default(),
        NaturalAttributes::default(),
        condition,
    ));

    for _ in 0..5 {
        engine.advance(10.0);
    }
    let medicated = engine
        .world
        .get::<&PhysicalCondition>(stressed)
        .unwrap()
        .has_medication(MedicationKind::Anxiety);
    let waste = engine
        .hooks
        .count(|e| matches!(e, HookEvent::ResourceStored { .. }));
    check(
        &mut results,
        "medication_administered",
        medicated && waste == 1,
        format!("medicated={} waste_deposits={}", medicated, waste),
    );

    results
}

// ── 6. Settlement soak ──────────────────────────────────────────────────

fn validate_settlement_soak(json: bool, verbose: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Settlement Soak ---");
    }
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(7);
    let config = SettlementConfig {
        doctors: 2,
        patients: 8,
        medical_robots: 2,
        stations: 2,
        beds_per_station: 2,
        facility_level: 3,
        affliction_chance: 0.75,
    };
    engine.generate(&config);

    let mut disjoint_ok = true;
    let mut capacity_ok = true;
    for _ in 0..400 {
        engine.advance(20.0);
        for (_, station) in engine.medical.stations() {
            for p in station.awaiting() {
                if station.treating().contains(p) {
                    disjoint_ok = false;
                }
            }
            if station.patient_num() > station.sick_beds() {
                capacity_ok = false;
            }
        }
    }

    check(
        &mut results,
        "soak_queues_disjoint",
        disjoint_ok,
        "awaiting/treating stayed disjoint for 400 ticks".into(),
    );
    check(
        &mut results,
        "soak_capacity_respected",
        capacity_ok,
        "bed occupancy never exceeded capacity".into(),
    );

    let experience = engine
        .hooks
        .count(|e| matches!(e, HookEvent::Experience { .. }));
    check(
        &mut results,
        "soak_work_happened",
        experience > 0,
        format!("{} experience awards over the soak", experience),
    );

    if verbose && !json {
        let mut starts = 0;
        let mut requests = 0;
        for e in &engine.hooks.events {
            if let HookEvent::Event { tag, .. } = e {
                match *tag {
                    "treatment started" => starts += 1,
                    "requested medical treatment" => requests += 1,
                    _ => {}
                }
            }
        }
        println!(
            "  events: {} treatment starts, {} treatment requests",
            starts, requests
        );
    }

    results
}

// ── 7. Snapshot persistence ─────────────────────────────────────────────

fn validate_snapshot(json: bool) -> Vec<TestResult> {
    if !json {
        println!("--- Snapshot ---");
    }
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(5);
    engine.generate(&SettlementConfig::default());
    for _ in 0..30 {
        engine.advance(25.0);
    }

    let mut buffer = Vec::new();
    let saved = save_settlement(&mut buffer, &engine).is_ok();
    check(
        &mut results,
        "snapshot_saves",
        saved,
        format!("{} bytes", buffer.len()),
    );

    match load_settlement(&buffer[..], 5) {
        Ok(loaded) => {
            let people_before = engine.world.query::<&Person>().iter().count();
            let people_after = loaded.world.query::<&Person>().iter().count();
            check(
                &mut results,
                "snapshot_roundtrip",
                people_before == people_after
                    && (loaded.sim_time() - engine.sim_time()).abs() < 1e-9,
                format!("{} people, t={:.0}", people_after, loaded.sim_time()),
            );
        }
        Err(e) => {
            check(&mut results, "snapshot_roundtrip", false, format!("{}", e));
        }
    }

    results
}
