//! Starweave Headless Simulation Harness
//!
//! Validates the pure logic tables and drives a seeded game end to end
//! against an in-memory store. No rendering, no real clock.
//!
//! Usage:
//!   cargo run -p starweave-simtest
//!   cargo run -p starweave-simtest -- --verbose
//!   cargo run -p starweave-simtest -- --config sim.json

use std::collections::BTreeSet;

use starweave_core::generation::reachable_from;
use starweave_core::prelude::*;
use starweave_logic::allocator::{allocate, Consumer};
use starweave_logic::galaxy::{GalaxyData, Owner, Position, Route, System};
use starweave_logic::progression::{building_cost, building_time_ms};
use starweave_logic::topology::{calculate_visible_systems, find_path};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn load_config() -> Result<SimConfig, String> {
    let args: Vec<String> = std::env::args().collect();
    let Some(pos) = args.iter().position(|a| a == "--config") else {
        return Ok(SimConfig::default().with_seed(7));
    };
    let path = args
        .get(pos + 1)
        .ok_or_else(|| "--config needs a path".to_string())?;
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    SimConfig::from_json(&text).map_err(|e| format!("{}: {}", path, e))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Starweave Simulation Harness ===\n");

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    let mut results = Vec::new();

    // 1. Water-filling allocator
    results.extend(validate_allocator(verbose));

    // 2. Fog of war and paths on a chain
    results.extend(validate_topology(verbose));

    // 3. Progression tables
    results.extend(validate_progression(verbose));

    // 4. Galaxy generation
    results.extend(validate_generation(&config, verbose));

    // 5. Scripted game
    results.extend(run_scripted_game(&config, verbose));

    // 6. Corruption recovery
    results.extend(validate_recovery(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

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

    if failed > 0 {
        std::process::exit(1);
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ── 1. Allocator ────────────────────────────────────────────────────────

fn validate_allocator(verbose: bool) -> Vec<TestResult> {
    println!("--- Allocator ---");
    let mut results = Vec::new();

    let even = allocate(1000.0, &[Consumer::new("a", 500.0), Consumer::new("b", 500.0)]);
    results.push(TestResult::new(
        "allocator_even_split",
        close(even.get(&"a"), 500.0) && close(even.get(&"b"), 500.0) && close(even.unused, 0.0),
        format!("a={:.1} b={:.1}", even.get(&"a"), even.get(&"b")),
    ));

    let capped = allocate(1000.0, &[Consumer::new("a", 250.0), Consumer::new("b", 750.0)]);
    results.push(TestResult::new(
        "allocator_redistributes_overflow",
        close(capped.get(&"a"), 250.0) && close(capped.get(&"b"), 750.0),
        format!("a={:.1} b={:.1}", capped.get(&"a"), capped.get(&"b")),
    ));

    let scarce = allocate(500.0, &[Consumer::new("a", 250.0), Consumer::new("b", 750.0)]);
    results.push(TestResult::new(
        "allocator_max_min_fair",
        close(scarce.get(&"a"), 250.0) && close(scarce.get(&"b"), 250.0),
        format!("a={:.1} b={:.1}", scarce.get(&"a"), scarce.get(&"b")),
    ));

    let surplus = allocate(100.0, &[Consumer::new("a", 30.0)]);
    results.push(TestResult::new(
        "allocator_conserves_supply",
        close(surplus.used + surplus.unused, 100.0) && close(surplus.unused, 70.0),
        format!("used={:.1} unused={:.1}", surplus.used, surplus.unused),
    ));

    let nobody = allocate::<&str>(50.0, &[]);
    results.push(TestResult::new(
        "allocator_no_consumers",
        nobody.allocations.is_empty() && close(nobody.unused, 50.0),
        "all supply unused",
    ));

    if verbose {
        println!("  {} allocator checks", results.len());
    }
    results
}

// ── 2. Topology ─────────────────────────────────────────────────────────

fn chain(len: u32) -> GalaxyData {
    let systems = (0..len)
        .map(|i| System::new(SystemId(i), format!("C{}", i), Position::new(i as f64, 0.0)))
        .collect();
    let routes = (1..len).map(|i| Route::new(SystemId(i - 1), SystemId(i))).collect();
    GalaxyData { systems, routes }
}

fn validate_topology(verbose: bool) -> Vec<TestResult> {
    println!("--- Topology ---");
    let mut results = Vec::new();

    let mut galaxy = chain(7);
    if let Some(home) = galaxy.system_mut(SystemId(0)) {
        home.colonize(0);
    }
    let vis = calculate_visible_systems(&galaxy, Some(SystemId(0)));
    let expected: BTreeSet<SystemId> = (0..3).map(SystemId).collect();
    results.push(TestResult::new(
        "visibility_radius_two",
        vis.visible_ids == expected,
        format!("visible {:?}", vis.visible_ids),
    ));

    let tether_ok = vis.tether_routes.len() == 1
        && vis.tether_routes[0].source == SystemId(2)
        && vis.tether_routes[0].target == SystemId(3);
    results.push(TestResult::new(
        "visibility_single_tether",
        tether_ok,
        format!("{} tether routes", vis.tether_routes.len()),
    ));

    let none = calculate_visible_systems(&galaxy, None);
    results.push(TestResult::new(
        "visibility_without_home",
        none.visible_ids.is_empty() && none.tether_routes.is_empty(),
        "empty without home",
    ));

    let path = find_path(&galaxy, SystemId(0), SystemId(6));
    results.push(TestResult::new(
        "path_along_chain",
        path.as_ref().map(Vec::len) == Some(6),
        format!("{:?}", path),
    ));

    galaxy.systems.push(System::new(SystemId(99), "Island", Position::default()));
    results.push(TestResult::new(
        "path_disconnected",
        find_path(&galaxy, SystemId(0), SystemId(99)).is_none(),
        "island unreachable",
    ));

    if verbose {
        println!("  {} topology checks", results.len());
    }
    results
}

// ── 3. Progression ──────────────────────────────────────────────────────

fn validate_progression(verbose: bool) -> Vec<TestResult> {
    println!("--- Progression ---");
    let mut results = Vec::new();

    for kind in BuildingKind::ALL {
        let spec = kind.spec();
        let rising = (1..spec.max_level).all(|level| {
            let prev = building_cost(kind, level - 1);
            let next = building_cost(kind, level);
            next.credits >= prev.credits
                && next.metals >= prev.metals
                && building_time_ms(kind, level) >= building_time_ms(kind, level - 1)
        });
        results.push(TestResult::new(
            &format!("building_curve_{}", kind.key()),
            rising,
            format!("{} levels, base {:?}", spec.max_level, spec.base_cost),
        ));
    }

    // Every tech must be reachable by researching in table order repeatedly.
    let mut researched: BTreeSet<TechId> = BTreeSet::new();
    for _ in 0..TechId::ALL.len() {
        for tech in TechId::ALL {
            if tech.prerequisites_met(researched.iter()) {
                researched.insert(tech);
            }
        }
    }
    results.push(TestResult::new(
        "tech_tree_acyclic",
        researched.len() == TechId::ALL.len(),
        format!("{}/{} techs reachable", researched.len(), TechId::ALL.len()),
    ));

    if verbose {
        println!("  {} progression checks", results.len());
    }
    results
}

// ── 4. Generation ───────────────────────────────────────────────────────

fn validate_generation(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Galaxy Generation ---");
    let mut results = Vec::new();

    let mut sim = Simulation::new(config.clone(), MemoryStore::new());
    sim.new_game(0);
    let state = sim.state();
    let galaxy = &state.galaxy;

    results.push(TestResult::new(
        "generation_system_count",
        galaxy.systems.len() == config.galaxy.system_count.max(1) as usize,
        format!("{} systems, {} routes", galaxy.systems.len(), galaxy.routes.len()),
    ));

    let connected = match state.home_system_id {
        Some(home) => reachable_from(galaxy, home).len() == galaxy.systems.len(),
        None => false,
    };
    results.push(TestResult::new(
        "generation_connected",
        connected,
        "every system reachable from home",
    ));

    let canonical = galaxy
        .routes
        .iter()
        .all(|r| r.id == RouteId::canonical(r.source, r.target));
    results.push(TestResult::new(
        "generation_canonical_route_ids",
        canonical,
        "route ids are min-max",
    ));

    let enemies = galaxy.systems.iter().filter(|s| s.owner == Owner::Enemy).count();
    results.push(TestResult::new(
        "generation_enemy_count",
        enemies <= config.galaxy.enemy_count as usize,
        format!("{} enemy systems", enemies),
    ));

    results.push(TestResult::new(
        "generation_consistent",
        state.check_consistency().is_ok(),
        "home set and present",
    ));

    if verbose {
        println!("  {} generation checks", results.len());
    }
    results
}

// ── 5. Scripted Game ────────────────────────────────────────────────────

fn run_scripted_game(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Scripted Game ---");
    let mut results = Vec::new();

    let mut sim = Simulation::new(config.clone(), MemoryStore::new());
    let outcome = sim.load_state(0);
    results.push(TestResult::new(
        "game_fresh_start",
        outcome == LoadOutcome::Fresh && sim.last_saved() == Some(0),
        format!("{:?}", outcome),
    ));
    let Some(home) = sim.state().home_system_id else {
        results.push(TestResult::new("game_has_home", false, "no home system"));
        return results;
    };
    sim.start(0);

    let mine = QueueTarget::Building(BuildingKind::Mine);
    let queued = sim.start_construction(home, mine, 0);
    let researching = sim.start_research(TechId::Administration, 0);

    // Scan the closest visible neutral system.
    let target = sim
        .visibility()
        .visible_ids
        .iter()
        .copied()
        .filter(|id| {
            sim.state()
                .galaxy
                .system(*id)
                .map_or(false, |s| s.owner == Owner::Unclaimed)
        })
        .min_by_key(|id| {
            find_path(&sim.state().galaxy, home, *id).map_or(usize::MAX, |p| p.len())
        });
    let scanning = target.map_or(false, |id| sim.scan_system(id, 0));

    let mut now = 0;
    let mut constructions = 0;
    let mut scanned = None;
    let mut researched = None;
    let mut saves = 0;
    let mut negative = false;
    while now < 120_000 {
        now += config.tick_interval_ms.max(1);
        let report = sim.tick(now);
        constructions += report.constructions.len();
        scanned = scanned.or(report.scan_completed);
        researched = researched.or(report.research_completed);
        saves += report.saved as usize;
        let res = sim.state().resources;
        negative |= res.credits < 0.0 || res.metals < 0.0;
    }

    let mine_level = sim
        .state()
        .galaxy
        .system(home)
        .map_or(0, |s| s.building_level(BuildingKind::Mine));
    let scan_claimed = scanned.map_or(false, |id| {
        sim.state().galaxy.system(id).map_or(false, |s| s.is_player())
    });
    results.push(TestResult::new(
        "game_construction_completes",
        queued && constructions >= 1 && mine_level >= 2,
        format!("{} constructions", constructions),
    ));
    results.push(TestResult::new(
        "game_scan_colonizes",
        !scanning || scan_claimed,
        format!("scanned {:?}", scanned),
    ));
    results.push(TestResult::new(
        "game_research_completes",
        !researching || researched.is_some(),
        format!("researched {:?}", researched),
    ));
    results.push(TestResult::new(
        "game_resources_non_negative",
        !negative,
        format!("{:?}", sim.state().resources),
    ));
    results.push(TestResult::new(
        "game_periodic_saves",
        saves >= 10,
        format!("{} saves in 120s", saves),
    ));

    let reloaded = {
        sim.flush_save(now);
        let mut again = Simulation::new(config.clone(), sim.store().clone());
        let outcome = again.load_state(now);
        outcome == LoadOutcome::Loaded { migrated: false } && again.state() == sim.state()
    };
    results.push(TestResult::new(
        "game_reload_matches",
        reloaded,
        "state survives save and load",
    ));

    if verbose {
        let rates = sim.production();
        println!(
            "  credits/s {:.2}, metals/s {:.2}, trade {:.2}, efficiency {:.2}",
            rates.credits_per_sec, rates.metals_per_sec, rates.trade_income, rates.efficiency
        );
    }
    results
}

// ── 6. Recovery ─────────────────────────────────────────────────────────

fn validate_recovery(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Corruption Recovery ---");
    let mut results = Vec::new();
    let key = config.save_key.clone();

    let mut store = MemoryStore::new();
    let _ = store.set(&key, "{\"version\": 2, \"galaxyData\": ");
    let mut sim = Simulation::new(config.clone(), store);
    let outcome = sim.load_state(0);
    results.push(TestResult::new(
        "recovery_truncated_save",
        outcome == LoadOutcome::Discarded && sim.state().home_system_id.is_some(),
        format!("{:?}", outcome),
    ));

    let mut orphaned = sim.state().clone();
    orphaned.home_system_id = None;
    let mut sim = Simulation::from_state(config.clone(), MemoryStore::new(), orphaned);
    let saved = sim.flush_save(0);
    results.push(TestResult::new(
        "recovery_refuses_corrupt_save",
        !saved && sim.state().check_consistency().is_ok(),
        format!("{} notices", sim.notices().len()),
    ));

    if verbose {
        for notice in sim.take_notices() {
            println!("  notice: {}", notice);
        }
    }
    results
}
