//! Forward activation of NEAT genomes.
//!
//! [`NetworkEvaluator`] compiles a genome into a dense, evaluation-ready form
//! and can be run repeatedly without touching the genome. [`activate`] is the
//! one-shot path that also writes the resulting node values back onto the
//! genome for renderers.

use tracing::warn;

use crate::activation::Activation;
use crate::gene::{NodeId, NodeRole};
use crate::genome::Genome;
use crate::topology::GraphTopology;

/// How the evaluator ordered the nodes it activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOrder {
    /// Kahn order over enabled connections.
    Topological,
    /// Ascending layout x, used only when the enabled connections form a cycle.
    Layout,
}

/// A compiled, evaluation-ready representation of a genome.
///
/// Node values live in a dense buffer indexed like the genome's
/// [`GraphTopology`], so evaluation is O(N + E) with contiguous access.
#[derive(Debug, Clone)]
pub struct NetworkEvaluator {
    topology: GraphTopology,
    /// Current value of every node, by dense index.
    values: Vec<f32>,
    /// Squashing function for every non-input node.
    activation: Activation,
    /// Dense indices of input nodes, in input order.
    input_indices: Vec<usize>,
    /// Dense indices of output nodes, in output order.
    output_indices: Vec<usize>,
    /// Non-input nodes in the order they are activated.
    eval_order: Vec<usize>,
    order: EvaluationOrder,
}

impl NetworkEvaluator {
    /// Compile a genome into an evaluator.
    ///
    /// A cyclic genome cannot be ordered topologically; it falls back to
    /// ascending layout x and logs a warning instead of failing.
    #[must_use]
    pub fn new(genome: &Genome, activation: Activation) -> Self {
        let topology = GraphTopology::from_genome(genome);

        let (full_order, order) = match topology.topological_order() {
            Some(full_order) => (full_order, EvaluationOrder::Topological),
            None => {
                warn!(
                    nodes = genome.nodes.len(),
                    connections = genome.num_enabled_connections(),
                    "genome has a cycle, activating in layout order"
                );
                (layout_order(genome, &topology), EvaluationOrder::Layout)
            }
        };

        let role_of = |idx: usize| {
            topology
                .node_id(idx)
                .and_then(|key| genome.nodes.get(key))
                .map(|node| node.role)
        };
        let eval_order: Vec<usize> = full_order
            .into_iter()
            .filter(|&idx| role_of(idx) != Some(NodeRole::Input))
            .collect();

        let dense = |keys: Vec<NodeId>| -> Vec<usize> {
            keys.into_iter()
                .filter_map(|key| topology.node_index(key))
                .collect()
        };
        let input_indices = dense(genome.input_ids());
        let output_indices = dense(genome.output_ids());

        Self {
            values: vec![0.0; topology.node_count()],
            topology,
            activation,
            input_indices,
            output_indices,
            eval_order,
            order,
        }
    }

    /// How the activation order was derived.
    #[must_use]
    pub fn order(&self) -> EvaluationOrder {
        self.order
    }

    /// Number of input nodes.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.input_indices.len()
    }

    /// Number of output nodes.
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.output_indices.len()
    }

    /// Evaluate the network, writing output values into `outputs`.
    ///
    /// Every node is reset to 0 first. Input nodes beyond `inputs.len()` keep
    /// that 0 and surplus inputs are ignored. Only the first
    /// `min(outputs.len(), num_outputs)` outputs are written.
    pub fn evaluate_into(&mut self, inputs: &[f32], outputs: &mut [f32]) {
        self.values.fill(0.0);

        for (&idx, &value) in self.input_indices.iter().zip(inputs) {
            self.values[idx] = value;
        }

        for &node_idx in &self.eval_order {
            let sum: f32 = self
                .topology
                .incoming(node_idx)
                .map(|(from_idx, weight)| self.values[from_idx] * weight)
                .sum();
            self.values[node_idx] = self.activation.apply(sum);
        }

        for (out, &idx) in outputs.iter_mut().zip(&self.output_indices) {
            *out = self.values[idx];
        }
    }

    /// Evaluate the network and return the output values in output order.
    pub fn evaluate(&mut self, inputs: &[f32]) -> Vec<f32> {
        let mut outputs = vec![0.0; self.output_indices.len()];
        self.evaluate_into(inputs, &mut outputs);
        outputs
    }

    /// Node values from the latest evaluation, keyed by arena key.
    pub fn node_values(&self) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, &value)| Some((self.topology.node_id(idx)?, value)))
    }
}

/// Activate `genome` once and store every node's value on the genome.
///
/// Returns the output node values in output order.
pub fn activate(genome: &mut Genome, inputs: &[f32], activation: Activation) -> Vec<f32> {
    let mut evaluator = NetworkEvaluator::new(genome, activation);
    let outputs = evaluator.evaluate(inputs);

    for (key, value) in evaluator.node_values() {
        if let Some(node) = genome.nodes.get_mut(key) {
            node.value = value;
        }
    }

    outputs
}

/// Dense indices sorted by ascending layout x, ties by index.
fn layout_order(genome: &Genome, topology: &GraphTopology) -> Vec<usize> {
    let x_of = |idx: usize| {
        topology
            .node_id(idx)
            .and_then(|key| genome.nodes.get(key))
            .map_or(0.0, |node| node.position.x)
    };
    let mut order: Vec<usize> = (0..topology.node_count()).collect();
    order.sort_by(|&a, &b| x_of(a).total_cmp(&x_of(b)));
    order
}
