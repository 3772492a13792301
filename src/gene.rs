//! Gene types for NEAT genomes.
//!
//! This module defines the fundamental building blocks of NEAT networks:
//! - [`NodeGene`]: a vertex with a role, a layout position and an activation value
//! - [`ConnectionGene`]: a directed, weighted edge carrying an innovation number

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::innovation::InnovationCounter;

new_key_type! {
    /// Arena key of a node within a genome.
    ///
    /// Connections refer to their endpoints through these keys, so an edge can
    /// never outlive or alias a node of another genome.
    pub struct NodeId;

    /// Arena key of a connection within a genome.
    pub struct ConnectionId;
}

/// The role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Input node - receives external values, never activated.
    Input,
    /// Hidden node - inserted by node mutation.
    Hidden,
    /// Output node - its value is read back after activation.
    Output,
}

/// A point in canvas coordinates.
///
/// Positions are layout metadata for renderers, but the x coordinate also
/// acts as the feed-forward guard of connection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint between two positions.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// A node gene representing a neuron in the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    /// Genome-local identity, equal to the node's insertion index.
    pub id: usize,
    /// The role of this node in the network.
    pub role: NodeRole,
    /// Layout position, recomputed whenever the topology changes.
    pub position: Position,
    /// Most recent activation value.
    pub value: f32,
}

impl NodeGene {
    #[must_use]
    pub fn new(id: usize, role: NodeRole, position: Position) -> Self {
        Self {
            id,
            role,
            position,
            value: 0.0,
        }
    }

    /// Create a new input node.
    #[must_use]
    pub fn input(id: usize) -> Self {
        Self::new(id, NodeRole::Input, Position::default())
    }

    /// Create a new hidden node at `position`.
    #[must_use]
    pub fn hidden(id: usize, position: Position) -> Self {
        Self::new(id, NodeRole::Hidden, position)
    }

    /// Create a new output node.
    #[must_use]
    pub fn output(id: usize) -> Self {
        Self::new(id, NodeRole::Output, Position::default())
    }
}

/// A connection gene representing a weighted link between two nodes.
///
/// The innovation number is assigned once at construction and survives
/// cloning and crossover unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    /// The source node of this connection.
    pub from: NodeId,
    /// The target node of this connection.
    pub to: NodeId,
    /// The connection weight.
    pub weight: f32,
    /// Creation-ordered innovation number.
    pub innovation: u64,
    /// Whether this connection is active.
    /// Disabled connections are skipped during activation but kept for crossover.
    pub enabled: bool,
}

impl ConnectionGene {
    /// Create a new enabled connection, drawing its innovation number from `innovations`.
    #[must_use]
    pub fn new(from: NodeId, to: NodeId, weight: f32, innovations: &InnovationCounter) -> Self {
        Self::with_innovation(from, to, weight, innovations.next_innovation())
    }

    /// Create a new enabled connection with a known innovation number.
    #[must_use]
    pub fn with_innovation(from: NodeId, to: NodeId, weight: f32, innovation: u64) -> Self {
        Self {
            from,
            to,
            weight,
            innovation,
            enabled: true,
        }
    }

    /// Midpoint between the positions of this connection's endpoints.
    ///
    /// Returns `None` if either endpoint is missing from `nodes`.
    #[must_use]
    pub fn midpoint(&self, nodes: &SlotMap<NodeId, NodeGene>) -> Option<Position> {
        let from = nodes.get(self.from)?;
        let to = nodes.get(self.to)?;
        Some(from.position.midpoint(to.position))
    }

    /// The `(from.id, to.id)` pair identifying this gene for crossover alignment.
    #[must_use]
    pub fn key(&self, nodes: &SlotMap<NodeId, NodeGene>) -> Option<(usize, usize)> {
        Some((nodes.get(self.from)?.id, nodes.get(self.to)?.id))
    }
}
