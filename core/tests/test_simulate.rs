use coursetime_core::{
    simulate, simulate_with, Course, EnvironmentConfig, RiderEquipmentConfig, SegmentSpec, SimError,
    SimulationSettings, SolveOutcome, SolverSettings, Terrain,
};

fn climbing_course() -> Course {
    let specs = [
        SegmentSpec { distance_m: 2000.0, elevation_change_m: 0.0, heading_deg: 0.0 },
        SegmentSpec { distance_m: 3000.0, elevation_change_m: 150.0, heading_deg: 30.0 },
        SegmentSpec { distance_m: 1500.0, elevation_change_m: 120.0, heading_deg: 60.0 },
        SegmentSpec { distance_m: 2500.0, elevation_change_m: 10.0, heading_deg: 120.0 },
    ];
    Course::from_specs("climb", 200.0, &specs).unwrap()
}

fn mixed_course() -> Course {
    let specs = [
        SegmentSpec { distance_m: 1500.0, elevation_change_m: 0.0, heading_deg: 0.0 },
        SegmentSpec { distance_m: 2000.0, elevation_change_m: 90.0, heading_deg: 40.0 },
        SegmentSpec { distance_m: 2000.0, elevation_change_m: -10.0, heading_deg: 100.0 },
        SegmentSpec { distance_m: 1500.0, elevation_change_m: -30.0, heading_deg: 160.0 },
        SegmentSpec { distance_m: 1200.0, elevation_change_m: -72.0, heading_deg: 220.0 },
        SegmentSpec { distance_m: 1000.0, elevation_change_m: 15.0, heading_deg: 300.0 },
    ];
    Course::from_specs("mixed", 300.0, &specs).unwrap()
}

fn single(elevation_change_m: f64) -> Course {
    let specs = [SegmentSpec { distance_m: 1000.0, elevation_change_m, heading_deg: 0.0 }];
    Course::from_specs("single", 100.0, &specs).unwrap()
}

fn windy() -> EnvironmentConfig {
    EnvironmentConfig::with_wind_kmh(18.0, 15.0, 45.0)
}

#[test]
fn simulate_is_deterministic() {
    let course = climbing_course();
    let rider = RiderEquipmentConfig::default();
    let a = simulate(&course, &rider, &windy()).unwrap();
    let b = simulate(&course, &rider, &windy()).unwrap();
    assert_eq!(a.total_time_s.to_bits(), b.total_time_s.to_bits());
    assert_eq!(a, b);
}

#[test]
fn heavier_rider_is_never_faster_on_climbing_course() {
    let course = climbing_course();
    let base = RiderEquipmentConfig::default();
    let mut last = 0.0;
    for kg in [55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 90.0] {
        let t = simulate(&course, &base.with_rider_mass(kg), &windy()).unwrap().total_time_s;
        assert!(t >= last, "{kg} kg: {t} < {last}");
        last = t;
    }
}

#[test]
fn more_power_is_never_slower() {
    let base = RiderEquipmentConfig::default();
    for course in [climbing_course(), mixed_course()] {
        let mut last = f64::INFINITY;
        for ftp in [150.0, 200.0, 250.0, 300.0, 350.0, 400.0] {
            let t = simulate(&course, &base.with_ftp(ftp), &windy()).unwrap().total_time_s;
            assert!(t <= last, "{} {ftp} W: {t} > {last}", course.name);
            last = t;
        }
    }
}

#[test]
fn more_power_is_faster_on_every_descent() {
    let course = mixed_course();
    let env = EnvironmentConfig::calm(15.0);
    let weak = simulate(&course, &RiderEquipmentConfig::default().with_ftp(180.0), &env).unwrap();
    let strong = simulate(&course, &RiderEquipmentConfig::default().with_ftp(320.0), &env).unwrap();
    for (w, s) in weak.segments.iter().zip(&strong.segments) {
        if w.terrain == Terrain::Descending {
            assert!(s.speed_ms > w.speed_ms, "seg #{}: {} <= {}", w.index, s.speed_ms, w.speed_ms);
        }
    }
}

#[test]
fn mild_descents_are_faster_than_flat_and_hold_target_power() {
    let rider = RiderEquipmentConfig::default();
    let env = EnvironmentConfig::calm(15.0);
    let tol = SolverSettings::default().tolerance_w;
    let flat = simulate(&single(0.0), &rider, &env).unwrap();
    let mut last = flat.segments[0].speed_ms;
    for drop in [5.0, 10.0, 20.0, 30.0] {
        let r = simulate(&single(-drop), &rider, &env).unwrap();
        let seg = &r.segments[0];
        assert!(seg.outcome.is_converged(), "-{drop} m: {:?}", seg.outcome);
        assert!(seg.speed_ms > last, "-{drop} m: {} <= {last}", seg.speed_ms);
        assert!((seg.power_w - r.target_power_w).abs() < tol);
        last = seg.speed_ms;
    }
}

#[test]
fn strong_tailwind_is_faster_than_calm() {
    let rider = RiderEquipmentConfig::default();
    let calm = simulate(&single(0.0), &rider, &EnvironmentConfig::calm(15.0)).unwrap();
    // 6 m/s fra sør, kurs nord
    let env = EnvironmentConfig { wind_speed_ms: 6.0, wind_from_deg: 180.0, ..EnvironmentConfig::calm(15.0) };
    let r = simulate(&single(0.0), &rider, &env).unwrap();
    let seg = &r.segments[0];
    assert!(seg.headwind_ms < -5.99);
    assert!(seg.outcome.is_converged(), "{:?}", seg.outcome);
    assert!(seg.speed_ms > calm.segments[0].speed_ms);
    assert!((seg.power_w - r.target_power_w).abs() < SolverSettings::default().tolerance_w);
}

#[test]
fn descent_past_v_max_coasts_at_the_cap() {
    let settings = SimulationSettings {
        solver: SolverSettings { v_max_ms: 15.0, ..Default::default() },
        ..Default::default()
    };
    // -12 %: terminalfarten er ~21 m/s, over taket på 15 m/s
    let r = simulate_with(&single(-120.0), &RiderEquipmentConfig::default(), &EnvironmentConfig::default(), &settings)
        .unwrap();
    let seg = &r.segments[0];
    assert_eq!(seg.outcome, SolveOutcome::FreeDescent);
    assert_eq!(seg.speed_ms, 15.0);
    assert_eq!(seg.power_w, 0.0);
    assert_eq!(r.average_power_w, 0.0);
    assert_eq!(r.free_descent_segments, 1);
    assert_eq!(seg.terrain, Terrain::Descending);
}

#[test]
fn wall_is_power_limited_but_course_completes() {
    let specs = [
        SegmentSpec { distance_m: 1000.0, elevation_change_m: 0.0, heading_deg: 0.0 },
        SegmentSpec { distance_m: 200.0, elevation_change_m: 60.0, heading_deg: 0.0 },
    ];
    let course = Course::from_specs("wall", 0.0, &specs).unwrap();
    let rider = RiderEquipmentConfig { ftp_w: 100.0, effort_fraction: 0.5, ..Default::default() };
    let r = simulate(&course, &rider, &EnvironmentConfig::default()).unwrap();
    assert_eq!(r.segments[1].outcome, SolveOutcome::PowerLimited);
    assert_eq!(r.segments[1].speed_ms, 1.0);
    assert_eq!(r.power_limited_segments, 1);
    assert!(r.segments[0].outcome.is_converged());
}

#[test]
fn non_convergence_names_the_segment() {
    let settings = SimulationSettings {
        solver: SolverSettings { tolerance_w: 1e-12, max_iterations: 1, ..Default::default() },
        ..Default::default()
    };
    let err = simulate_with(&climbing_course(), &RiderEquipmentConfig::default(), &windy(), &settings)
        .unwrap_err();
    assert!(matches!(err, SimError::SolverNonConvergence { segment_index: 0, .. }));
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let course = climbing_course();
    let rider = RiderEquipmentConfig { effort_fraction: 0.3, ..Default::default() };
    assert!(matches!(
        simulate(&course, &rider, &EnvironmentConfig::default()),
        Err(SimError::InvalidConfiguration { field: "effort_fraction", .. })
    ));
    let env = EnvironmentConfig { wind_from_deg: 400.0, ..Default::default() };
    assert!(matches!(
        simulate(&course, &RiderEquipmentConfig::default(), &env),
        Err(SimError::InvalidConfiguration { field: "wind_from_deg", .. })
    ));
}

#[test]
fn terrain_breakdown_partitions_time_and_distance() {
    let r = simulate(&climbing_course(), &RiderEquipmentConfig::default(), &windy()).unwrap();
    let t = &r.terrain;
    assert!((t.climbing.distance_m - 4500.0).abs() < 1e-9);
    assert!((t.flat.distance_m - 4500.0).abs() < 1e-9);
    assert_eq!(t.descending.distance_m, 0.0);
    assert!((t.climbing.time_s + t.flat.time_s - r.total_time_s).abs() < 1e-9);
    assert!(t.climbing.average_speed_ms() < t.flat.average_speed_ms());
}
