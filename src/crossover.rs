//! Crossover of two parent genomes.
//!
//! Genes are aligned by the `(from.id, to.id)` pair of their endpoints. The
//! offspring's node set is a copy of the fitter parent's, so every gene it
//! inherits is re-pointed at the offspring's own nodes by id.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use slotmap::SlotMap;

use crate::gene::{ConnectionGene, NodeId};
use crate::genome::Genome;

type GeneKey = (usize, usize);

/// Produce one offspring from two parents.
///
/// The fitter parent is `parent1` only when its fitness is strictly higher;
/// ties go to `parent2`. For a gene both parents carry, `parent1`'s version
/// is taken with probability `crossover_rate`. A gene only one parent carries
/// is inherited only from the fitter parent. The offspring takes `parent1`'s
/// mutation rates and canvas and starts with fitness 0.
#[must_use]
pub fn crossover<R: Rng>(
    parent1: &Genome,
    parent2: &Genome,
    crossover_rate: f32,
    rng: &mut R,
) -> Genome {
    let first_is_fitter = parent1.fitness > parent2.fitness;
    let fitter = if first_is_fitter { parent1 } else { parent2 };

    let mut offspring = Genome {
        nodes: fitter.nodes.clone(),
        connections: SlotMap::with_key(),
        fitness: 0.0,
        rates: parent1.rates,
        canvas: parent1.canvas,
    };

    let genes1 = keyed_genes(parent1);
    let genes2 = keyed_genes(parent2);
    let by_key1: HashMap<GeneKey, &ConnectionGene> = genes1.iter().copied().collect();
    let by_key2: HashMap<GeneKey, &ConnectionGene> = genes2.iter().copied().collect();

    let id_to_key: HashMap<usize, NodeId> = offspring
        .nodes
        .iter()
        .map(|(key, node)| (node.id, key))
        .collect();

    let mut seen: HashSet<GeneKey> = HashSet::with_capacity(genes1.len() + genes2.len());
    for &(key, _) in genes1.iter().chain(&genes2) {
        if !seen.insert(key) {
            continue;
        }

        let inherited = match (by_key1.get(&key), by_key2.get(&key)) {
            (Some(&gene1), Some(&gene2)) => {
                if rng.random::<f32>() < crossover_rate {
                    Some(gene1)
                } else {
                    Some(gene2)
                }
            }
            (Some(&gene1), None) if first_is_fitter => Some(gene1),
            (None, Some(&gene2)) if !first_is_fitter => Some(gene2),
            _ => None,
        };

        if let Some(gene) = inherited.and_then(|g| repoint(g, key, &id_to_key)) {
            offspring.connections.insert(gene);
        }
    }

    offspring.update_coordinates();
    offspring
}

/// A parent's genes with their alignment keys, in insertion order.
fn keyed_genes(genome: &Genome) -> Vec<(GeneKey, &ConnectionGene)> {
    genome
        .connections
        .values()
        .filter_map(|gene| Some((gene.key(&genome.nodes)?, gene)))
        .collect()
}

/// Clone `gene` with its endpoints moved onto the offspring's nodes.
fn repoint(
    gene: &ConnectionGene,
    (from_id, to_id): GeneKey,
    id_to_key: &HashMap<usize, NodeId>,
) -> Option<ConnectionGene> {
    let mut gene = gene.clone();
    gene.from = *id_to_key.get(&from_id)?;
    gene.to = *id_to_key.get(&to_id)?;
    Some(gene)
}
