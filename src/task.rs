//! Fitness tasks: labelled test cases a genome is scored against.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{NeatError, Result};
use crate::evaluator::NetworkEvaluator;
use crate::genome::Genome;

/// One labelled example: the inputs fed to the network and the outputs expected back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub inputs: Vec<f32>,
    pub expected: Vec<f32>,
}

impl TestCase {
    #[must_use]
    pub fn new(inputs: &[f32], expected: &[f32]) -> Self {
        Self {
            inputs: inputs.to_vec(),
            expected: expected.to_vec(),
        }
    }
}

/// A fixed set of test cases genomes are scored against.
///
/// Tasks are shared read-only across fitness evaluations, which may run on
/// several threads with the `parallel` feature.
pub trait FitnessTask: fmt::Debug + Send + Sync {
    /// The labelled cases, evaluated in order.
    fn test_cases(&self) -> &[TestCase];

    /// Short name for logs.
    fn name(&self) -> &str {
        "task"
    }
}

/// The XOR truth table.
#[derive(Debug, Clone, PartialEq)]
pub struct Xor {
    cases: Vec<TestCase>,
}

impl Default for Xor {
    fn default() -> Self {
        Self {
            cases: vec![
                TestCase::new(&[0.0, 0.0], &[0.0]),
                TestCase::new(&[0.0, 1.0], &[1.0]),
                TestCase::new(&[1.0, 0.0], &[1.0]),
                TestCase::new(&[1.0, 1.0], &[0.0]),
            ],
        }
    }
}

impl FitnessTask for Xor {
    fn test_cases(&self) -> &[TestCase] {
        &self.cases
    }

    fn name(&self) -> &str {
        "xor"
    }
}

/// A task built from an arbitrary list of cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseTable {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl FitnessTask for CaseTable {
    fn test_cases(&self) -> &[TestCase] {
        &self.cases
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Check that every case of `task` has `input_size` inputs and
/// `output_size` labels.
pub(crate) fn check_dimensions<T>(task: &T, input_size: usize, output_size: usize) -> Result<()>
where
    T: FitnessTask + ?Sized,
{
    for (index, case) in task.test_cases().iter().enumerate() {
        if case.inputs.len() != input_size {
            return Err(NeatError::invalid(
                "input_size",
                format!(
                    "is {input_size}, but case {index} of task `{}` has {} inputs",
                    task.name(),
                    case.inputs.len()
                ),
            ));
        }
        if case.expected.len() != output_size {
            return Err(NeatError::invalid(
                "output_size",
                format!(
                    "is {output_size}, but case {index} of task `{}` has {} labels",
                    task.name(),
                    case.expected.len()
                ),
            ));
        }
    }
    Ok(())
}

/// Score `genome` on every case of `task` as `1 / (1 + total squared error)`.
///
/// Each case compares the network outputs against the labels pairwise, so a
/// single-output task only looks at the first output. The result is always in
/// `(0, 1]`; a non-finite error saturates instead of producing NaN or zero.
#[must_use]
pub fn evaluate_fitness<T>(task: &T, genome: &Genome, activation: Activation) -> f32
where
    T: FitnessTask + ?Sized,
{
    let mut evaluator = NetworkEvaluator::new(genome, activation);
    let mut outputs = vec![0.0; evaluator.num_outputs()];

    let mut total_error = 0.0f32;
    for case in task.test_cases() {
        evaluator.evaluate_into(&case.inputs, &mut outputs);
        total_error += outputs
            .iter()
            .zip(&case.expected)
            .map(|(out, label)| (out - label) * (out - label))
            .sum::<f32>();
    }

    // f32::min discards NaN
    let total_error = total_error.min(f32::MAX / 2.0);
    1.0 / (1.0 + total_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeatConfig;
    use crate::innovation::InnovationCounter;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_xor_table() {
        let xor = Xor::default();
        assert_eq!(xor.name(), "xor");
        assert_eq!(xor.test_cases().len(), 4);
        for case in xor.test_cases() {
            let a = case.inputs[0] > 0.5;
            let b = case.inputs[1] > 0.5;
            assert_eq!(case.expected[0] > 0.5, a ^ b);
        }
    }

    #[test]
    fn test_check_dimensions() {
        let xor = Xor::default();
        assert!(check_dimensions(&xor, 2, 1).is_ok());
        assert!(matches!(
            check_dimensions(&xor, 3, 1),
            Err(NeatError::InvalidConfig {
                field: "input_size",
                ..
            })
        ));

        let err = check_dimensions(&xor, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            NeatError::InvalidConfig {
                field: "output_size",
                ..
            }
        ));
        assert!(err.to_string().contains("task `xor`"));

        let empty = CaseTable {
            name: "empty".into(),
            cases: Vec::new(),
        };
        assert!(check_dimensions(&empty, 5, 5).is_ok());
    }

    #[test]
    fn test_unconnected_genome_fitness() {
        // Output is always 0.5, so every case contributes 0.25
        let genome = Genome::minimal(&NeatConfig::xor());
        let fitness = evaluate_fitness(&Xor::default(), &genome, Activation::SteepSigmoid);
        assert!((fitness - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_perfect_score_is_one() {
        let task = CaseTable {
            name: "identity".into(),
            cases: vec![TestCase::new(&[0.25], &[0.25]), TestCase::new(&[-1.0], &[-1.0])],
        };
        let mut genome = Genome::minimal(&NeatConfig::for_task(1, 1, 1));
        let innovations = InnovationCounter::new();
        let input = genome.node_by_id(0).unwrap();
        let output = genome.node_by_id(1).unwrap();
        genome.add_connection(input, output, 1.0, &innovations);

        let fitness = evaluate_fitness(&task, &genome, Activation::Identity);
        assert!((fitness - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fitness_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let innovations = InnovationCounter::new();
        let config = NeatConfig::xor();
        let task = Xor::default();

        for _ in 0..50 {
            let mut genome = Genome::fully_connected(&config, &mut rng, &innovations);
            for _ in 0..10 {
                genome.mutate(&mut rng, &innovations);
            }
            for activation in Activation::ALL {
                let fitness = evaluate_fitness(&task, &genome, activation);
                assert!(
                    fitness > 0.0 && fitness <= 1.0,
                    "{activation:?} fitness {fitness} out of (0, 1]"
                );
            }
        }
    }

    #[test]
    fn test_huge_error_stays_positive() {
        let task = CaseTable {
            name: "far".into(),
            cases: vec![TestCase::new(&[1.0], &[0.0])],
        };
        let mut genome = Genome::minimal(&NeatConfig::for_task(1, 1, 1));
        let innovations = InnovationCounter::new();
        let input = genome.node_by_id(0).unwrap();
        let output = genome.node_by_id(1).unwrap();
        genome.add_connection(input, output, f32::MAX, &innovations);

        let fitness = evaluate_fitness(&task, &genome, Activation::Identity);
        assert!(fitness > 0.0);
    }
}
