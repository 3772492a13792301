//! Configuration for population seeding and the generational loop.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{NeatError, Result};
use crate::genome::MutationRates;
use crate::layout::Canvas;

/// Configuration for a [`Neat`](crate::Neat) population manager.
///
/// Every field may be changed between calls to [`Neat::evolve`](crate::Neat::evolve)
/// through [`Neat::config_mut`](crate::Neat::config_mut). The population size
/// applies to the next generation; mutation rates are stamped onto genomes when
/// they are seeded, so they apply from the next [`Neat::reseed`](crate::Neat::reseed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeatConfig {
    /// Number of genomes kept after every generation.
    pub population_size: usize,
    /// Number of input nodes in the seed template.
    pub input_size: usize,
    /// Number of output nodes in the seed template.
    pub output_size: usize,
    /// Extent used for node layout.
    pub canvas: Canvas,
    /// Mutation rates given to seeded genomes.
    pub rates: MutationRates,
    /// Probability of taking parent 1's version of a gene both parents carry.
    pub crossover_rate: f32,
    /// Fraction of the ranked population cloned unchanged into the next generation.
    pub elitism_ratio: f32,
    /// Number of contestants drawn per tournament selection.
    pub tournament_size: usize,
    /// Squashing function applied to hidden and output nodes.
    pub activation: Activation,
    /// Fitness at which [`Neat::run_until`](crate::Neat::run_until) stops.
    pub target_fitness: f32,
    /// Seed for the population's RNG. `None` seeds from the thread RNG.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self::xor()
    }
}

impl NeatConfig {
    /// The XOR playground defaults: ten genomes, two inputs, one output.
    #[must_use]
    pub fn xor() -> Self {
        Self {
            population_size: 10,
            input_size: 2,
            output_size: 1,
            canvas: Canvas::default(),
            rates: MutationRates::new(0.7, 0.03, 0.06),
            crossover_rate: 0.3,
            elitism_ratio: 0.2,
            tournament_size: 3,
            activation: Activation::SteepSigmoid,
            target_fitness: 0.95,
            seed: None,
        }
    }

    /// Defaults for a task with the given layer sizes and population.
    #[must_use]
    pub fn for_task(population_size: usize, input_size: usize, output_size: usize) -> Self {
        Self {
            population_size,
            input_size,
            output_size,
            ..Self::xor()
        }
    }

    /// Builder-style seed setter.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of genomes cloned unchanged into each new generation.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn elite_count(&self) -> usize {
        (self.population_size as f32 * self.elitism_ratio).floor() as usize
    }

    /// Check every field for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(NeatError::invalid("population_size", "must be at least 1"));
        }
        if self.input_size == 0 {
            return Err(NeatError::invalid("input_size", "must be at least 1"));
        }
        if self.output_size == 0 {
            return Err(NeatError::invalid("output_size", "must be at least 1"));
        }
        if !(self.canvas.width > 0.0 && self.canvas.width.is_finite()) {
            return Err(NeatError::invalid(
                "canvas.width",
                format!("must be positive and finite, got {}", self.canvas.width),
            ));
        }
        if !(self.canvas.height > 0.0 && self.canvas.height.is_finite()) {
            return Err(NeatError::invalid(
                "canvas.height",
                format!("must be positive and finite, got {}", self.canvas.height),
            ));
        }
        self.rates.validate()?;
        check_probability("crossover_rate", self.crossover_rate)?;
        check_probability("elitism_ratio", self.elitism_ratio)?;
        if self.tournament_size == 0 {
            return Err(NeatError::invalid("tournament_size", "must be at least 1"));
        }
        if self.target_fitness.is_nan() {
            return Err(NeatError::invalid("target_fitness", "must not be NaN"));
        }
        Ok(())
    }
}

/// Check that `value` is a probability in `[0, 1]`.
pub(crate) fn check_probability(field: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(NeatError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}
