//! XOR example: evolve a network until it solves the XOR truth table.
//!
//! Run with: `cargo run --example xor`

use neat_evolve::{activate, FitnessTask, Neat, NeatConfig, RunOutcome, Xor};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!("NEAT XOR Example");
    println!("================\n");

    let config = NeatConfig {
        population_size: 150,
        ..NeatConfig::xor().with_seed(42)
    };
    let max_generations = 300;

    println!("Population: {}", config.population_size);
    println!("Max generations: {max_generations}");
    println!("Target fitness: {}", config.target_fitness);
    println!();

    let activation = config.activation;
    let mut neat = match Neat::new(config) {
        Ok(neat) => neat,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut outcome = RunOutcome::Exhausted {
        generation: 0,
        best_fitness: 0.0,
    };
    while neat.generation() < max_generations {
        outcome = neat.run_until(10);
        if let Ok(stats) = neat.stats() {
            println!(
                "Gen {:3}: best={:.4}, mean={:.4}, nodes={}, connections={}",
                stats.generation,
                stats.best_fitness,
                stats.mean_fitness,
                stats.best_nodes,
                stats.best_enabled_connections
            );
        }
        if outcome.is_solved() {
            break;
        }
    }

    println!();
    println!("Evolution Complete!");
    println!("==================");
    match outcome {
        RunOutcome::Solved {
            generation,
            fitness,
        } => println!("Solution found at generation {generation} (fitness {fitness:.4})"),
        RunOutcome::Exhausted {
            generation,
            best_fitness,
        } => println!("No solution after {generation} generations (best {best_fitness:.4})"),
    }

    let Some(champion) = neat.best_genome() else {
        return;
    };
    let mut champion = champion.clone();
    println!("Nodes: {}", champion.nodes.len());
    println!("Connections: {}", champion.num_enabled_connections());
    println!("Hidden nodes: {}", champion.hidden_ids().len());

    println!("\nChampion XOR outputs:");
    for case in Xor::default().test_cases() {
        let output = activate(&mut champion, &case.inputs, activation)[0];
        let expected = case.expected[0];
        let rounded = if output > 0.5 { 1.0 } else { 0.0 };
        let status = if (rounded - expected).abs() < 0.1 {
            "✓"
        } else {
            "✗"
        };
        println!(
            "  {} XOR {} = {output:.4} (expected {expected}) {status}",
            case.inputs[0], case.inputs[1]
        );
    }
}
