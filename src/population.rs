//! The population manager and its generational loop.
//!
//! [`Neat`] owns the population, the innovation counter, the RNG and the
//! fitness task. Each [`Neat::evolve`] call is one generation:
//! evaluate, rank, track the best genome, keep the elites, then refill the
//! population with mutated offspring of tournament-selected parents.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activation::Activation;
use crate::config::NeatConfig;
use crate::crossover::crossover;
use crate::error::{NeatError, Result};
use crate::evaluator::activate;
use crate::genome::Genome;
use crate::innovation::InnovationCounter;
use crate::task::{check_dimensions, evaluate_fitness, FitnessTask, Xor};

/// How many of the highest fitness values [`GenerationStats`] reports.
pub const TOP_FITNESS_COUNT: usize = 10;

/// A summary of the current population for charts and status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generations completed so far.
    pub generation: usize,
    /// Current number of genomes.
    pub population_size: usize,
    /// Fitness of the best genome seen across all generations.
    pub best_fitness: f32,
    /// Mean fitness of the current population.
    pub mean_fitness: f32,
    /// Highest fitness values of the current population, descending.
    pub top_fitness: Vec<f32>,
    /// Node count of the best genome.
    pub best_nodes: usize,
    /// Connection count of the best genome, disabled ones included.
    pub best_connections: usize,
    /// Enabled connection count of the best genome.
    pub best_enabled_connections: usize,
}

/// Result of [`Neat::run_until`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The best genome reached the target fitness.
    Solved { generation: usize, fitness: f32 },
    /// The generation cap was hit first.
    Exhausted { generation: usize, best_fitness: f32 },
}

impl RunOutcome {
    #[must_use]
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }
}

/// A NEAT population manager.
#[derive(Debug)]
pub struct Neat {
    config: NeatConfig,
    population: Vec<Genome>,
    generation: usize,
    best_genome: Option<Genome>,
    innovations: InnovationCounter,
    rng: ChaCha8Rng,
    task: Box<dyn FitnessTask>,
}

impl Neat {
    /// Create a manager scored against the XOR truth table.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: NeatConfig) -> Result<Self> {
        Self::with_task(config, Xor::default())
    }

    /// Create a manager scored against `task`.
    ///
    /// The population is seeded but not evaluated; the best genome starts as
    /// a copy of the first seeded genome.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`] if `config` does not validate or
    /// a case of `task` does not match its input and output sizes.
    pub fn with_task<T: FitnessTask + 'static>(config: NeatConfig, task: T) -> Result<Self> {
        config.validate()?;
        check_dimensions(&task, config.input_size, config.output_size)?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        let mut neat = Self {
            config,
            population: Vec::new(),
            generation: 0,
            best_genome: None,
            innovations: InnovationCounter::new(),
            rng,
            task: Box::new(task),
        };
        neat.seed_population();
        Ok(neat)
    }

    /// Discard the population and seed a fresh one from the current config.
    ///
    /// The generation counter returns to 0. The innovation counter keeps
    /// counting, so genes of the new population never reuse old numbers.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`] if the current config does not
    /// validate or no longer fits the task; the existing population is kept
    /// in that case.
    pub fn reseed(&mut self) -> Result<()> {
        self.config.validate()?;
        check_dimensions(
            self.task.as_ref(),
            self.config.input_size,
            self.config.output_size,
        )?;
        self.seed_population();
        Ok(())
    }

    fn seed_population(&mut self) {
        self.population = (0..self.config.population_size)
            .map(|_| Genome::fully_connected(&self.config, &mut self.rng, &self.innovations))
            .collect();
        self.generation = 0;
        self.best_genome = self.population.first().cloned();

        debug!(
            population = self.population.len(),
            inputs = self.config.input_size,
            outputs = self.config.output_size,
            "seeded population"
        );
    }

    /// Advance one generation.
    pub fn evolve(&mut self) {
        evaluate_population(&mut self.population, self.task.as_ref(), self.config.activation);
        self.population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        if let Some(champion) = self.population.first() {
            let improved = match &self.best_genome {
                Some(best) => champion.fitness > best.fitness,
                None => true,
            };
            if improved {
                info!(
                    generation = self.generation,
                    fitness = champion.fitness,
                    nodes = champion.nodes.len(),
                    connections = champion.num_enabled_connections(),
                    "new best genome"
                );
                self.best_genome = Some(champion.clone());
            }
        }

        let target_size = self.config.population_size;
        let elite_count = self
            .config
            .elite_count()
            .min(self.population.len())
            .min(target_size);
        let mut next: Vec<Genome> = Vec::with_capacity(target_size);
        next.extend(self.population.iter().take(elite_count).cloned());

        while next.len() < target_size {
            let parents = (
                tournament_select(&self.population, self.config.tournament_size, &mut self.rng),
                tournament_select(&self.population, self.config.tournament_size, &mut self.rng),
            );
            let offspring = match parents {
                (Some(parent1), Some(parent2)) => {
                    let mut child =
                        crossover(parent1, parent2, self.config.crossover_rate, &mut self.rng);
                    child.mutate(&mut self.rng, &self.innovations);
                    child
                }
                // An emptied population regrows from fresh seeds
                _ => Genome::fully_connected(&self.config, &mut self.rng, &self.innovations),
            };
            next.push(offspring);
        }

        debug!(
            generation = self.generation,
            best = self.population.first().map_or(0.0, |g| g.fitness),
            mean = mean_fitness(&self.population),
            elites = elite_count,
            "generation evaluated"
        );

        self.population = next;
        self.generation += 1;
    }

    /// Call [`evolve`](Self::evolve) until the best genome reaches the
    /// configured target fitness or `max_generations` steps have run.
    pub fn run_until(&mut self, max_generations: usize) -> RunOutcome {
        for _ in 0..max_generations {
            self.evolve();

            let fitness = self.best_fitness();
            if fitness >= self.config.target_fitness {
                info!(
                    generation = self.generation,
                    fitness,
                    task = self.task.name(),
                    "target fitness reached"
                );
                return RunOutcome::Solved {
                    generation: self.generation,
                    fitness,
                };
            }
        }

        RunOutcome::Exhausted {
            generation: self.generation,
            best_fitness: self.best_fitness(),
        }
    }

    /// Summarize the current population.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::NotInitialized`] if the population is empty.
    pub fn stats(&self) -> Result<GenerationStats> {
        let best = self.best_genome.as_ref().ok_or(NeatError::NotInitialized)?;
        if self.population.is_empty() {
            return Err(NeatError::NotInitialized);
        }

        let mut top_fitness: Vec<f32> = self.population.iter().map(|g| g.fitness).collect();
        top_fitness.sort_by(|a, b| b.total_cmp(a));
        top_fitness.truncate(TOP_FITNESS_COUNT);

        Ok(GenerationStats {
            generation: self.generation,
            population_size: self.population.len(),
            best_fitness: best.fitness,
            mean_fitness: mean_fitness(&self.population),
            top_fitness,
            best_nodes: best.nodes.len(),
            best_connections: best.connections.len(),
            best_enabled_connections: best.num_enabled_connections(),
        })
    }

    /// Activate the best genome on `inputs`, storing node values on it.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::NotInitialized`] if there is no best genome.
    pub fn activate_best(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        let activation = self.config.activation;
        let best = self.best_genome.as_mut().ok_or(NeatError::NotInitialized)?;
        Ok(activate(best, inputs, activation))
    }

    /// The current population.
    ///
    /// After an [`evolve`](Self::evolve) the elites come first, ranked, and
    /// the offspring after them stay unranked until the next evaluation.
    #[must_use]
    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Generations completed since the last seeding.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// A copy of the best genome seen so far.
    #[must_use]
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best_genome.as_ref()
    }

    fn best_fitness(&self) -> f32 {
        self.best_genome.as_ref().map_or(0.0, |g| g.fitness)
    }

    #[must_use]
    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Mutable access to the configuration between generations.
    ///
    /// Population size and selection settings apply from the next
    /// [`evolve`](Self::evolve); mutation rates, layer sizes and canvas from
    /// the next [`reseed`](Self::reseed).
    pub fn config_mut(&mut self) -> &mut NeatConfig {
        &mut self.config
    }

    /// The task genomes are scored against.
    #[must_use]
    pub fn task(&self) -> &dyn FitnessTask {
        self.task.as_ref()
    }

    /// The innovation counter shared by every genome of this manager.
    #[must_use]
    pub fn innovations(&self) -> &InnovationCounter {
        &self.innovations
    }
}

/// Pick the fittest of `tournament_size` genomes drawn uniformly with replacement.
///
/// Returns `None` only for an empty population. A tournament size of 0 is
/// treated as 1.
pub fn tournament_select<'a, R: Rng>(
    population: &'a [Genome],
    tournament_size: usize,
    rng: &mut R,
) -> Option<&'a Genome> {
    if population.is_empty() {
        return None;
    }

    let mut best: Option<&Genome> = None;
    for _ in 0..tournament_size.max(1) {
        let contestant = &population[rng.random_range(0..population.len())];
        if best.is_none_or(|b| contestant.fitness > b.fitness) {
            best = Some(contestant);
        }
    }
    best
}

fn evaluate_population(population: &mut [Genome], task: &dyn FitnessTask, activation: Activation) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        population
            .par_iter_mut()
            .for_each(|genome| genome.fitness = evaluate_fitness(task, genome, activation));
    }

    #[cfg(not(feature = "parallel"))]
    for genome in population.iter_mut() {
        genome.fitness = evaluate_fitness(task, genome, activation);
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_fitness(population: &[Genome]) -> f32 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|g| g.fitness).sum::<f32>() / population.len() as f32
}
