//! Canvas layout for genome nodes.
//!
//! Positions are a pure function of the node role counts and the canvas
//! extent. Inputs sit in the first quarter column, hidden nodes in the middle
//! and outputs in the third quarter, each column spread evenly top to bottom
//! in node insertion order.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::gene::{NodeGene, NodeId, NodeRole, Position};

/// Extent of the drawing surface the layout targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 550.0,
            height: 400.0,
        }
    }
}

impl Canvas {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal distance between layout columns.
    #[inline]
    #[must_use]
    pub fn column_spacing(&self) -> f32 {
        self.width / 4.0
    }

    /// The x coordinate every node of `role` is placed at.
    #[must_use]
    pub fn column_x(&self, role: NodeRole) -> f32 {
        let column = match role {
            NodeRole::Input => 1.0,
            NodeRole::Hidden => 2.0,
            NodeRole::Output => 3.0,
        };
        self.column_spacing() * column
    }
}

/// Reassign the position of every node in `nodes`.
///
/// Nodes are visited in arena order, which is insertion order since genomes
/// never remove nodes.
#[allow(clippy::cast_precision_loss)] // Node counts are tiny
pub fn assign_positions(nodes: &mut SlotMap<NodeId, NodeGene>, canvas: Canvas) {
    let count = |role: NodeRole| nodes.values().filter(|n| n.role == role).count();
    let row_spacing = |n: usize| canvas.height / (n + 2) as f32;

    let input_dy = row_spacing(count(NodeRole::Input));
    let hidden_dy = row_spacing(count(NodeRole::Hidden));
    let output_dy = row_spacing(count(NodeRole::Output));

    let (mut input_row, mut hidden_row, mut output_row) = (1usize, 1usize, 1usize);

    for node in nodes.values_mut() {
        let (dy, row) = match node.role {
            NodeRole::Input => (input_dy, &mut input_row),
            NodeRole::Hidden => (hidden_dy, &mut hidden_row),
            NodeRole::Output => (output_dy, &mut output_row),
        };
        node.position = Position::new(canvas.column_x(node.role), dy * *row as f32);
        *row += 1;
    }
}
