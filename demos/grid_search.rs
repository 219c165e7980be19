//! Route search across a grid of waypoints with pillar obstacles

use std::time::Instant;

use waypoint_ga::{
    EvolutionEngine,
    compute::{LineOfSight, NavGraph, build_graph},
    schema::{Obstacle, Point3, Representation, SearchConfig, SelectionMethod, Waypoint},
};

/// `side` x `side` waypoints one unit apart on the z = 0 plane.
fn grid_waypoints(side: usize) -> Vec<Waypoint> {
    (0..side * side)
        .map(|i| Waypoint::new(i, [(i % side) as f32, (i / side) as f32, 0.0]))
        .collect()
}

/// Pillars placed between grid points so that long sight lines get cut.
fn pillars(side: usize) -> Vec<Obstacle> {
    (1..side / 2)
        .map(|k| Obstacle::Sphere {
            center: Point3::new(2.0 * k as f32 - 0.5, side as f32 / 2.0 - 0.5, 0.0),
            radius: 0.6,
        })
        .collect()
}

fn run(label: &str, graph: &NavGraph, goal: usize, config: SearchConfig) {
    let start = Instant::now();
    let mut engine = match EvolutionEngine::new(config, graph.clone(), 0, goal) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{label}: {e}");
            return;
        }
    };
    let result = engine.run();
    let elapsed = start.elapsed();

    println!("{label}");
    println!("  Stopped:        {:?}", result.stats.stop_reason);
    println!("  Generations:    {}", result.stats.generations);
    println!("  Best fitness:   {:.5}", result.stats.best_fitness);
    println!("  Route length:   {:.3}", result.best.length);
    println!("  Complete:       {}", result.best.is_complete());
    println!("  Route:          {}", result.best.route);
    println!("  Elapsed:        {:.3}s", elapsed.as_secs_f64());
    println!();
}

fn main() {
    println!("=== Grid Route Search ===\n");

    let side = 8;
    let waypoints = grid_waypoints(side);
    let obstacles = pillars(side);
    let visibility = LineOfSight::new(&obstacles).with_clearance(0.05);

    let start = Instant::now();
    let graph = match build_graph(&waypoints, &visibility) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error building graph: {e}");
            return;
        }
    };
    println!(
        "Graph: {} waypoints, {} links ({:.3}s)\n",
        graph.len(),
        graph.link_count(),
        start.elapsed().as_secs_f64()
    );

    let goal = side * side - 1;
    let base = SearchConfig {
        population_size: 60,
        mutation_rate: 0.1,
        max_generations: 300,
        random_seed: Some(42),
        ..Default::default()
    };

    for selection in [
        SelectionMethod::RouletteWheel,
        SelectionMethod::RankBased,
        SelectionMethod::Tournament { size: 3 },
        SelectionMethod::UniformPairs,
    ] {
        let label = format!("{selection:?}");
        run(
            &label,
            &graph,
            goal,
            SearchConfig {
                selection,
                ..base.clone()
            },
        );
    }

    run(
        "FixedLength (6 genes)",
        &graph,
        goal,
        SearchConfig {
            representation: Representation::FixedLength {
                chromosome_length: 6,
            },
            ..base
        },
    );
}
