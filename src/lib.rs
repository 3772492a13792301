//! # NEAT Evolve
//!
//! A small NeuroEvolution of Augmenting Topologies (NEAT) engine for
//! problems with a fixed number of inputs and outputs, such as boolean
//! functions.
//!
//! ## Features
//!
//! - **Explicit Innovation Counter**: every [`Neat`] owns an
//!   [`InnovationCounter`] and lends it to seeding and mutation, so
//!   independent populations never share hidden state
//! - **Arena-Graph Model**: `SlotMap` storage for nodes and connections;
//!   cloning a genome is a deep copy whose edges point at its own nodes
//! - **Topological Activation**: networks are activated in Kahn order over
//!   their enabled connections, not in layout order
//! - **Pluggable Tasks**: score genomes against any [`FitnessTask`];
//!   the XOR truth table is the default
//!
//! ## Quick Start
//!
//! ```rust
//! use neat_evolve::{Neat, NeatConfig};
//!
//! let config = NeatConfig::xor().with_seed(42);
//! let mut neat = Neat::new(config).expect("valid config");
//!
//! for _ in 0..10 {
//!     neat.evolve();
//! }
//!
//! let stats = neat.stats().expect("population exists");
//! assert_eq!(stats.generation, 10);
//! assert!(stats.best_fitness > 0.0 && stats.best_fitness <= 1.0);
//! ```
//!
//! ## Custom Tasks
//!
//! ```rust
//! use neat_evolve::{CaseTable, Neat, NeatConfig, TestCase};
//!
//! let and = CaseTable {
//!     name: "and".into(),
//!     cases: vec![
//!         TestCase::new(&[0.0, 0.0], &[0.0]),
//!         TestCase::new(&[0.0, 1.0], &[0.0]),
//!         TestCase::new(&[1.0, 0.0], &[0.0]),
//!         TestCase::new(&[1.0, 1.0], &[1.0]),
//!     ],
//! };
//!
//! let mut neat = Neat::with_task(NeatConfig::for_task(30, 2, 1), and).unwrap();
//! let outcome = neat.run_until(50);
//! println!("{outcome:?}");
//! ```
//!
//! ## Architecture
//!
//! ### Gene Identity
//!
//! Connection genes carry a creation-ordered innovation number, but crossover
//! aligns genes by the `(from.id, to.id)` pair of their endpoints. Node ids are
//! genome-local insertion indices.
//!
//! ### Generational Step
//!
//! Each [`Neat::evolve`] evaluates every genome, ranks the population, records
//! a copy of a new best genome, carries the top 20% over unchanged and fills
//! the rest with mutated offspring of tournament-selected parents. With the
//! `parallel` feature, fitness evaluation runs on rayon's thread pool.

pub mod activation;
pub mod config;
pub mod crossover;
pub mod error;
pub mod evaluator;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod layout;
pub mod population;
pub mod task;
pub mod topology;

// Re-exports for convenience
pub use activation::Activation;
pub use config::NeatConfig;
pub use crossover::crossover;
pub use error::{NeatError, Result};
pub use evaluator::{activate, EvaluationOrder, NetworkEvaluator};
pub use gene::{ConnectionGene, ConnectionId, NodeGene, NodeId, NodeRole, Position};
pub use genome::{Genome, MutationRates};
pub use innovation::InnovationCounter;
pub use layout::Canvas;
pub use population::{tournament_select, GenerationStats, Neat, RunOutcome};
pub use task::{evaluate_fitness, CaseTable, FitnessTask, TestCase, Xor};
pub use topology::GraphTopology;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_mutate_then_crossover() {
        let config = NeatConfig::xor();
        let innovations = InnovationCounter::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut genome = Genome::fully_connected(&config, &mut rng, &innovations);
        genome.mutate(&mut rng, &innovations);

        let mut genome2 = genome.clone();
        genome2.mutate(&mut rng, &innovations);
        genome2.fitness = 1.0;

        let child = crossover(&genome, &genome2, 0.5, &mut rng);
        assert_eq!(child.input_ids().len(), 2);
        assert_eq!(child.output_ids().len(), 1);
        assert!(child.endpoints_resolve());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = NeatConfig::for_task(1, 3, 2);
        let innovations = InnovationCounter::new();
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let mut genome = Genome::fully_connected(&config, &mut rng, &innovations);

        let conn_id = genome.connections.keys().next().unwrap();
        genome.split_connection(conn_id, &innovations);

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(genome.nodes.len(), restored.nodes.len());
        assert_eq!(genome.connections.len(), restored.connections.len());
        assert_eq!(genome.input_ids().len(), restored.input_ids().len());
        assert_eq!(genome.output_ids().len(), restored.output_ids().len());

        // Restored arena keys still resolve
        let mut original = NetworkEvaluator::new(&genome, Activation::SteepSigmoid);
        let mut copy = NetworkEvaluator::new(&restored, Activation::SteepSigmoid);
        assert_eq!(
            original.evaluate(&[0.1, 0.2, 0.3]),
            copy.evaluate(&[0.1, 0.2, 0.3])
        );
    }

    #[test]
    fn test_stats_serialize() {
        let mut neat = Neat::new(NeatConfig::xor().with_seed(7)).unwrap();
        neat.evolve();
        let stats = neat.stats().unwrap();

        let json = serde_json::to_string(&stats).expect("Serialization failed");
        let restored: GenerationStats = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, stats);
    }
}
