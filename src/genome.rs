//! NEAT genome implementation with arena-allocated graph topology.
//!
//! A [`Genome`] owns its nodes and connections in two [`SlotMap`] arenas.
//! Connections address their endpoints by [`NodeId`] key, so a derived
//! `Clone` is already a deep copy whose edges point at the copy's own nodes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::config::{check_probability, NeatConfig};
use crate::error::Result;
use crate::gene::{ConnectionGene, ConnectionId, NodeGene, NodeId, NodeRole};
use crate::innovation::InnovationCounter;
use crate::layout::{assign_positions, Canvas};
use crate::topology::GraphTopology;

/// Per-connection probability of touching a weight once weight mutation fires.
pub const WEIGHT_MUTATION_CHANCE: f32 = 0.1;
/// Probability that a touched weight is perturbed rather than reset.
pub const WEIGHT_PERTURB_PROB: f32 = 0.7;
/// Half-width of the uniform weight perturbation.
pub const WEIGHT_PERTURB_POWER: f32 = 0.5;
/// Half-width of the range a reset or newly added weight is drawn from.
pub const WEIGHT_RESET_RANGE: f32 = 2.0;
/// Half-width of the range seed weights are drawn from.
pub const SEED_WEIGHT_RANGE: f32 = 1.0;
/// How many node pairs connection mutation tries before giving up.
pub const ADD_CONNECTION_ATTEMPTS: usize = 5;

/// Probabilities of the three mutation operators, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationRates {
    /// Chance that weight mutation runs on a `mutate` call.
    pub weight: f32,
    /// Chance that a connection is split by a new hidden node.
    pub node: f32,
    /// Chance that a new connection is attempted.
    pub connection: f32,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self::new(0.7, 0.03, 0.06)
    }
}

impl MutationRates {
    #[must_use]
    pub const fn new(weight: f32, node: f32, connection: f32) -> Self {
        Self {
            weight,
            node,
            connection,
        }
    }

    /// Check that every rate is a probability.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::InvalidConfig`](crate::NeatError::InvalidConfig)
    /// for the first rate outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        check_probability("rates.weight", self.weight)?;
        check_probability("rates.node", self.node)?;
        check_probability("rates.connection", self.connection)
    }
}

/// A NEAT genome: one candidate network plus its fitness and mutation rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    /// Arena storage for nodes, in insertion order.
    pub nodes: SlotMap<NodeId, NodeGene>,
    /// Arena storage for connections, in insertion order.
    pub connections: SlotMap<ConnectionId, ConnectionGene>,
    /// Score from the most recent evaluation.
    pub fitness: f32,
    /// Mutation rates this genome was created with.
    pub rates: MutationRates,
    /// Canvas the node layout is computed against.
    pub canvas: Canvas,
}

impl Genome {
    /// Create a genome with input and output nodes but no connections.
    ///
    /// Node ids follow insertion order, inputs first.
    #[must_use]
    pub fn minimal(config: &NeatConfig) -> Self {
        let mut nodes: SlotMap<NodeId, NodeGene> =
            SlotMap::with_capacity_and_key(config.input_size + config.output_size);

        for id in 0..config.input_size {
            nodes.insert(NodeGene::input(id));
        }
        for i in 0..config.output_size {
            nodes.insert(NodeGene::output(config.input_size + i));
        }

        let mut genome = Self {
            nodes,
            connections: SlotMap::with_key(),
            fitness: 0.0,
            rates: config.rates,
            canvas: config.canvas,
        };
        genome.update_coordinates();
        genome
    }

    /// Create a genome with every input connected to every output.
    ///
    /// Weights are uniform in `[-1, 1]`; one innovation number is drawn per edge.
    #[must_use]
    pub fn fully_connected<R: Rng>(
        config: &NeatConfig,
        rng: &mut R,
        innovations: &InnovationCounter,
    ) -> Self {
        let mut genome = Self::minimal(config);
        let inputs = genome.input_ids();
        let outputs = genome.output_ids();

        for &from in &inputs {
            for &to in &outputs {
                let weight = rng.random_range(-SEED_WEIGHT_RANGE..=SEED_WEIGHT_RANGE);
                genome
                    .connections
                    .insert(ConnectionGene::new(from, to, weight, innovations));
            }
        }

        genome
    }

    /// Apply the three mutation operators, each gated by its own rate.
    ///
    /// Weight mutation runs first, then node insertion, then connection
    /// addition. Layout is recomputed after each structural change so the
    /// connection operator sees current x coordinates.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R, innovations: &InnovationCounter) {
        if rng.random::<f32>() < self.rates.weight {
            self.mutate_weights(rng);
        }
        if rng.random::<f32>() < self.rates.node {
            self.mutate_add_node(rng, innovations);
        }
        if rng.random::<f32>() < self.rates.connection {
            self.mutate_add_connection(rng, innovations);
        }
    }

    /// Perturb or reset a random subset of connection weights.
    ///
    /// Every connection, enabled or not, is touched with probability
    /// [`WEIGHT_MUTATION_CHANCE`].
    pub fn mutate_weights<R: Rng>(&mut self, rng: &mut R) {
        for conn in self.connections.values_mut() {
            if rng.random::<f32>() >= WEIGHT_MUTATION_CHANCE {
                continue;
            }
            if rng.random::<f32>() < WEIGHT_PERTURB_PROB {
                conn.weight += rng.random_range(-WEIGHT_PERTURB_POWER..=WEIGHT_PERTURB_POWER);
            } else {
                conn.weight = rng.random_range(-WEIGHT_RESET_RANGE..=WEIGHT_RESET_RANGE);
            }
        }
    }

    /// Split a uniformly chosen enabled connection with a new hidden node.
    ///
    /// Returns the new node, or `None` if no connection is enabled.
    pub fn mutate_add_node<R: Rng>(
        &mut self,
        rng: &mut R,
        innovations: &InnovationCounter,
    ) -> Option<NodeId> {
        let enabled: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(id, _)| id)
            .collect();

        if enabled.is_empty() {
            return None;
        }

        let conn_id = enabled[rng.random_range(0..enabled.len())];
        self.split_connection(conn_id, innovations)
    }

    /// Try up to [`ADD_CONNECTION_ATTEMPTS`] random node pairs for a new edge.
    ///
    /// Returns the new connection, or `None` if every attempt was rejected.
    pub fn mutate_add_connection<R: Rng>(
        &mut self,
        rng: &mut R,
        innovations: &InnovationCounter,
    ) -> Option<ConnectionId> {
        let keys: Vec<NodeId> = self.nodes.keys().collect();
        if keys.len() < 2 {
            return None;
        }

        for _ in 0..ADD_CONNECTION_ATTEMPTS {
            let from = keys[rng.random_range(0..keys.len())];
            let to = keys[rng.random_range(0..keys.len())];
            if !self.can_connect(from, to) {
                continue;
            }

            let weight = rng.random_range(-WEIGHT_RESET_RANGE..=WEIGHT_RESET_RANGE);
            return self.add_connection(from, to, weight, innovations);
        }

        None
    }

    /// Add a new connection between two nodes.
    ///
    /// Returns `None` if the endpoints are the same node, the source does not
    /// lie strictly left of the target, or the ordered pair is already joined.
    pub fn add_connection(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f32,
        innovations: &InnovationCounter,
    ) -> Option<ConnectionId> {
        if !self.can_connect(from, to) {
            return None;
        }

        let conn_id = self
            .connections
            .insert(ConnectionGene::new(from, to, weight, innovations));
        self.update_coordinates();
        Some(conn_id)
    }

    /// Whether a new `from -> to` connection passes the feed-forward guard.
    #[must_use]
    pub fn can_connect(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return false;
        }
        let (Some(source), Some(target)) = (self.nodes.get(from), self.nodes.get(to)) else {
            return false;
        };
        if source.position.x >= target.position.x {
            return false;
        }
        self.find_connection(from, to).is_none()
    }

    /// Disable a connection and route it through a new hidden node.
    ///
    /// The incoming half gets weight 1.0, the outgoing half keeps the original
    /// weight. Returns `None` if the connection is missing, disabled or dangling.
    pub fn split_connection(
        &mut self,
        conn_id: ConnectionId,
        innovations: &InnovationCounter,
    ) -> Option<NodeId> {
        let conn = self.connections.get(conn_id)?;
        if !conn.enabled {
            return None;
        }
        let (from, to, weight) = (conn.from, conn.to, conn.weight);
        let position = conn.midpoint(&self.nodes)?;

        if let Some(conn) = self.connections.get_mut(conn_id) {
            conn.enabled = false;
        }

        let id = self.nodes.len();
        let node_id = self.nodes.insert(NodeGene::hidden(id, position));
        self.connections
            .insert(ConnectionGene::new(from, node_id, 1.0, innovations));
        self.connections
            .insert(ConnectionGene::new(node_id, to, weight, innovations));

        self.update_coordinates();
        Some(node_id)
    }

    /// Recompute every node's layout position from the role counts and canvas.
    pub fn update_coordinates(&mut self) {
        assign_positions(&mut self.nodes, self.canvas);
    }

    /// Input node keys, in input order.
    #[must_use]
    pub fn input_ids(&self) -> Vec<NodeId> {
        self.ids_with_role(NodeRole::Input)
    }

    /// Hidden node keys, in insertion order.
    #[must_use]
    pub fn hidden_ids(&self) -> Vec<NodeId> {
        self.ids_with_role(NodeRole::Hidden)
    }

    /// Output node keys, in output order.
    #[must_use]
    pub fn output_ids(&self) -> Vec<NodeId> {
        self.ids_with_role(NodeRole::Output)
    }

    fn ids_with_role(&self, role: NodeRole) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.role == role)
            .map(|(id, _)| id)
            .collect()
    }

    /// Get the number of enabled connections.
    #[must_use]
    pub fn num_enabled_connections(&self) -> usize {
        self.connections.values().filter(|c| c.enabled).count()
    }

    /// Find a node by its genome-local id.
    #[must_use]
    pub fn node_by_id(&self, id: usize) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.id == id)
            .map(|(key, _)| key)
    }

    /// Find the connection joining `from` to `to`, enabled or not.
    #[must_use]
    pub fn find_connection(&self, from: NodeId, to: NodeId) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|(_, c)| c.from == from && c.to == to)
            .map(|(id, _)| id)
    }

    /// The `(from.id, to.id)` key crossover aligns this connection by.
    #[must_use]
    pub fn connection_key(&self, conn_id: ConnectionId) -> Option<(usize, usize)> {
        self.connections.get(conn_id)?.key(&self.nodes)
    }

    /// Whether every connection points at nodes of this genome.
    #[must_use]
    pub fn endpoints_resolve(&self) -> bool {
        self.connections
            .values()
            .all(|c| self.nodes.contains_key(c.from) && self.nodes.contains_key(c.to))
    }

    /// Check if the enabled connections contain a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        GraphTopology::from_genome(self).has_cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn config(inputs: usize, outputs: usize) -> NeatConfig {
        NeatConfig::for_task(10, inputs, outputs)
    }

    #[test]
    fn test_minimal_genome() {
        let genome = Genome::minimal(&config(3, 2));

        assert_eq!(genome.input_ids().len(), 3);
        assert_eq!(genome.output_ids().len(), 2);
        assert!(genome.hidden_ids().is_empty());
        assert_eq!(genome.connections.len(), 0);

        let ids: Vec<usize> = genome.nodes.values().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fully_connected_genome() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let genome = Genome::fully_connected(&config(2, 2), &mut rng, &innovations);

        // 2 inputs * 2 outputs = 4 connections
        assert_eq!(genome.connections.len(), 4);
        assert_eq!(innovations.peek(), 4);
        for conn in genome.connections.values() {
            assert!(conn.enabled);
            assert!((-1.0..=1.0).contains(&conn.weight));
            assert_eq!(genome.nodes[conn.from].role, NodeRole::Input);
            assert_eq!(genome.nodes[conn.to].role, NodeRole::Output);
        }
    }

    #[test]
    fn test_add_connection_guard() {
        let mut genome = Genome::minimal(&config(2, 1));
        let innovations = InnovationCounter::new();

        let input = genome.input_ids()[0];
        let other_input = genome.input_ids()[1];
        let output = genome.output_ids()[0];

        assert!(genome.add_connection(input, output, 0.5, &innovations).is_some());
        assert_eq!(genome.connections.len(), 1);

        // Duplicate ordered pair
        assert!(genome.add_connection(input, output, 0.5, &innovations).is_none());
        // Right to left
        assert!(genome.add_connection(output, input, 0.5, &innovations).is_none());
        // Same column
        assert!(genome
            .add_connection(input, other_input, 0.5, &innovations)
            .is_none());
        // Self loop
        assert!(genome.add_connection(input, input, 0.5, &innovations).is_none());

        assert_eq!(genome.connections.len(), 1);
    }

    #[test]
    fn test_split_connection() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config(2, 1), &mut rng, &innovations);

        let initial_nodes = genome.nodes.len();
        let initial_conns = genome.connections.len();

        let (conn_id, original) = genome
            .connections
            .iter()
            .next()
            .map(|(id, c)| (id, c.clone()))
            .unwrap();
        let node_id = genome
            .split_connection(conn_id, &innovations)
            .expect("Enabled connection should split");

        assert_eq!(genome.nodes.len(), initial_nodes + 1);
        assert_eq!(genome.connections.len(), initial_conns + 2);
        assert_eq!(genome.num_enabled_connections(), initial_conns + 1);
        assert!(!genome.connections[conn_id].enabled);

        let hidden = &genome.nodes[node_id];
        assert_eq!(hidden.role, NodeRole::Hidden);
        assert_eq!(hidden.id, initial_nodes);

        let incoming = genome.find_connection(original.from, node_id).unwrap();
        let outgoing = genome.find_connection(node_id, original.to).unwrap();
        assert!((genome.connections[incoming].weight - 1.0).abs() < 1e-6);
        assert!((genome.connections[outgoing].weight - original.weight).abs() < 1e-6);
        assert!(genome.connections[incoming].innovation > original.innovation);
        assert!(
            genome.connections[outgoing].innovation > genome.connections[incoming].innovation
        );

        // A disabled connection cannot be split again
        assert!(genome.split_connection(conn_id, &innovations).is_none());
    }

    #[test]
    fn test_split_moves_node_to_hidden_column() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config(2, 1), &mut rng, &innovations);

        let node_id = genome.mutate_add_node(&mut rng, &innovations).unwrap();
        let expected_x = genome.canvas.column_x(NodeRole::Hidden);
        assert!((genome.nodes[node_id].position.x - expected_x).abs() < 1e-4);
    }

    #[test]
    fn test_mutate_add_node_without_enabled_connections() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::minimal(&config(2, 1));

        assert!(genome.mutate_add_node(&mut rng, &innovations).is_none());
        assert_eq!(genome.nodes.len(), 3);
    }

    #[test]
    fn test_mutate_add_connection_fills_missing_edge() {
        let innovations = InnovationCounter::new();
        let mut genome = Genome::minimal(&config(1, 1));

        // Only one legal pair exists, so enough attempts must find it
        let mut rng = test_rng();
        let mut added = None;
        for _ in 0..50 {
            added = genome.mutate_add_connection(&mut rng, &innovations);
            if added.is_some() {
                break;
            }
        }
        assert!(added.is_some());
        assert_eq!(genome.connections.len(), 1);

        // Nothing legal remains
        for _ in 0..20 {
            assert!(genome.mutate_add_connection(&mut rng, &innovations).is_none());
        }
    }

    #[test]
    fn test_weight_mutation_changes_weights() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config(4, 3), &mut rng, &innovations);
        let before: Vec<f32> = genome.connections.values().map(|c| c.weight).collect();

        for _ in 0..100 {
            genome.mutate_weights(&mut rng);
        }

        let after: Vec<f32> = genome.connections.values().map(|c| c.weight).collect();
        assert_ne!(before, after, "100 rounds should touch some weight");
        assert_eq!(genome.connections.len(), 12);
    }

    #[test]
    fn test_weight_mutation_perturbs_or_resets() {
        const START: f32 = 10.0;
        const ROUNDS: usize = 1000;

        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config(4, 3), &mut rng, &innovations);

        let (mut touched, mut perturbed) = (0usize, 0usize);
        for _ in 0..ROUNDS {
            // Far outside the reset range, so the two outcomes are distinguishable
            for conn in genome.connections.values_mut() {
                conn.weight = START;
            }
            genome.mutate_weights(&mut rng);

            for conn in genome.connections.values() {
                if conn.weight == START {
                    continue;
                }
                touched += 1;
                if (conn.weight - START).abs() <= WEIGHT_PERTURB_POWER + 1e-5 {
                    perturbed += 1;
                } else {
                    assert!(
                        (-WEIGHT_RESET_RANGE..=WEIGHT_RESET_RANGE).contains(&conn.weight),
                        "weight {} is neither a perturbation nor a reset",
                        conn.weight
                    );
                }
            }
        }

        let draws = (ROUNDS * genome.connections.len()) as f32;
        let touch_rate = touched as f32 / draws;
        assert!(
            (WEIGHT_MUTATION_CHANCE - 0.02..=WEIGHT_MUTATION_CHANCE + 0.02).contains(&touch_rate),
            "touch rate {touch_rate}"
        );
        let perturb_rate = perturbed as f32 / touched as f32;
        assert!(
            (WEIGHT_PERTURB_PROB - 0.1..=WEIGHT_PERTURB_PROB + 0.1).contains(&perturb_rate),
            "perturb rate {perturb_rate}"
        );
    }

    #[test]
    fn test_added_connection_weights_in_reset_range() {
        let innovations = InnovationCounter::new();
        let mut rng = test_rng();

        for _ in 0..50 {
            let mut genome = Genome::minimal(&config(3, 2));
            for _ in 0..20 {
                if let Some(conn_id) = genome.mutate_add_connection(&mut rng, &innovations) {
                    let weight = genome.connections[conn_id].weight;
                    assert!((-WEIGHT_RESET_RANGE..=WEIGHT_RESET_RANGE).contains(&weight));
                }
            }
            assert!(!genome.connections.is_empty());
        }
    }

    #[test]
    fn test_mutation_keeps_graph_acyclic() {
        let config = NeatConfig {
            rates: MutationRates::new(1.0, 0.5, 1.0),
            ..config(3, 2)
        };
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config, &mut rng, &innovations);

        for _ in 0..200 {
            genome.mutate(&mut rng, &innovations);
        }

        assert!(!genome.hidden_ids().is_empty());
        assert!(!genome.has_cycle());
        assert!(genome.endpoints_resolve());
    }

    #[test]
    fn test_zero_rates_leave_genome_untouched() {
        let config = NeatConfig {
            rates: MutationRates::new(0.0, 0.0, 0.0),
            ..config(2, 1)
        };
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config, &mut rng, &innovations);
        let before = genome.clone();

        for _ in 0..50 {
            genome.mutate(&mut rng, &innovations);
        }

        assert!(genome.nodes.values().eq(before.nodes.values()));
        assert!(genome.connections.values().eq(before.connections.values()));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config(2, 1), &mut rng, &innovations);
        genome.fitness = 0.42;

        let mut copy = genome.clone();
        assert_eq!(copy.nodes.len(), genome.nodes.len());
        assert_eq!(copy.connections.len(), genome.connections.len());
        assert!((copy.fitness - 0.42).abs() < 1e-6);
        for (id, conn) in &genome.connections {
            assert_eq!(copy.connections[id], *conn);
            assert!(copy.nodes.contains_key(conn.from));
        }

        copy.mutate_add_node(&mut rng, &innovations);
        for conn in copy.connections.values_mut() {
            conn.weight = 9.0;
        }
        assert_eq!(genome.nodes.len(), 3);
        assert!(genome.connections.values().all(|c| c.weight.abs() <= 1.0));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let genome = Genome::fully_connected(&config(2, 1), &mut rng, &innovations);

        let output = genome.node_by_id(2).expect("Output has id 2");
        assert_eq!(genome.nodes[output].role, NodeRole::Output);
        assert!(genome.node_by_id(7).is_none());

        let input = genome.node_by_id(1).unwrap();
        let conn_id = genome.find_connection(input, output).unwrap();
        assert_eq!(genome.connection_key(conn_id), Some((1, 2)));
    }

    #[test]
    fn test_rates_validate() {
        assert!(MutationRates::default().validate().is_ok());
        assert!(MutationRates::new(1.2, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut rng = test_rng();
        let innovations = InnovationCounter::new();
        let mut genome = Genome::fully_connected(&config(2, 1), &mut rng, &innovations);
        genome.mutate_add_node(&mut rng, &innovations);

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        assert!(restored.nodes.values().eq(genome.nodes.values()));
        assert!(restored.connections.values().eq(genome.connections.values()));
        assert_eq!(restored.rates, genome.rates);
    }
}
