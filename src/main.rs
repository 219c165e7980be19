//! Waypoint GA CLI - Run a route search from a JSON scenario.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use waypoint_ga::{
    compute::{LineOfSight, build_graph},
    compute::evolution::{EvolutionEngine, PathExport},
    schema::Scenario,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.json> [export.json]", args[0]);
        eprintln!();
        eprintln!("Search for a route between two waypoints with a genetic algorithm.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  scenario.json  Waypoints, obstacles, start/goal and search settings");
        eprintln!("  export.json    Optional path to write the best route and run history");
        eprintln!();
        eprintln!("Example scenario is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_scenario();
        return;
    }

    let scenario_path = PathBuf::from(&args[1]);
    let export_path = args.get(2).map(PathBuf::from);

    // Load scenario
    let scenario_str = fs::read_to_string(&scenario_path).unwrap_or_else(|e| {
        eprintln!("Error reading scenario file: {}", e);
        std::process::exit(1);
    });

    let scenario: Scenario = serde_json::from_str(&scenario_str).unwrap_or_else(|e| {
        eprintln!("Error parsing scenario: {}", e);
        std::process::exit(1);
    });

    println!("Waypoint Route Search");
    println!("=====================");
    println!(
        "Waypoints: {} ({} obstacles)",
        scenario.waypoints.len(),
        scenario.obstacles.len()
    );
    println!("Start: {}, goal: {}", scenario.start, scenario.goal);
    println!(
        "Population: {}, generations: {}, mutation rate: {}",
        scenario.config.population_size,
        scenario.config.max_generations,
        scenario.config.mutation_rate
    );
    println!();

    // Build graph
    let graph = build_graph(&scenario.waypoints, &LineOfSight::new(&scenario.obstacles))
        .unwrap_or_else(|e| {
            eprintln!("Error building waypoint graph: {}", e);
            std::process::exit(1);
        });
    println!("Graph: {} links", graph.link_count());

    let max_generations = scenario.config.max_generations;
    let mut engine = EvolutionEngine::new(scenario.config, graph, scenario.start, scenario.goal)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    // Run search
    println!("Running search...");
    let start = Instant::now();
    let interval = (max_generations / 10).max(1);

    let result = engine.run_with_callback(|progress| {
        // Print progress every 10%
        if (progress.generation + 1) % interval == 0 {
            println!(
                "  Generation {}/{}: best={:.5}, avg={:.5}, stagnation={}",
                progress.generation + 1,
                progress.max_generations,
                progress.best_fitness,
                progress.avg_fitness,
                progress.stagnation_count
            );
        }
    });

    let elapsed = start.elapsed();
    let best = &result.best;

    println!();
    println!("Stopped: {:?}", result.stats.stop_reason);
    println!("Best route: {}", best.route);
    println!("  Fitness: {:.6}", best.fitness);
    println!("  Length: {:.3}", best.length);
    println!(
        "  Valid links: {}/{}{}",
        best.valid_links,
        best.total_links,
        if best.reaches_goal {
            ""
        } else {
            " (goal not reached)"
        }
    );
    println!(
        "Time: {:.2}s ({} generations, {} evaluations)",
        elapsed.as_secs_f32(),
        result.stats.generations,
        result.stats.total_evaluations
    );

    if let Some(path) = export_path {
        let export = PathExport::new(engine.graph(), scenario.start, scenario.goal, result);
        if let Err(e) = export.save(&path) {
            eprintln!("Error writing export: {}", e);
            std::process::exit(1);
        }
        println!("Export written to {}", path.display());
    }
}

fn print_example_scenario() {
    let scenario = Scenario::default();

    println!("Example scenario (scenario.json):");
    match serde_json::to_string_pretty(&scenario) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
