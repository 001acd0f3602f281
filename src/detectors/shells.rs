use std::collections::HashSet;

use tracing::debug;

use crate::core::graph::TransferGraph;
use crate::detectors::{DetectorBudget, DetectorOutcome, RawRing, RingPattern};

const MIN_HOPS: usize = 3;
const MAX_HOPS: usize = 4;

/// Locate layered shell chains: directed paths of 3 or 4 hops starting at a
/// zero-in-degree origin whose interior vertices each have exactly one
/// predecessor.
///
/// A chain that is a strict prefix of another recorded chain is suppressed,
/// so a 4-hop chain does not also report its leading 3 hops. Temporal
/// confirmation requires the edges' `first_ts` to be non-decreasing along
/// the path.
pub fn detect(graph: &TransferGraph, chain_cap: usize, budget: DetectorBudget) -> DetectorOutcome {
    let mut chains: Vec<Vec<u32>> = Vec::new();
    let mut hit_deadline = false;
    let mut hit_cap = false;

    'origins: for origin in graph.vertices_by_id() {
        if graph.in_degree(origin) != 0 || graph.out_degree(origin) == 0 {
            continue;
        }
        if chains.len() >= chain_cap {
            hit_cap = true;
            break;
        }

        // Iterative DFS, path carried on the stack.
        let mut stack: Vec<(u32, Vec<u32>)> = vec![(origin, vec![origin])];
        while let Some((current, path)) = stack.pop() {
            if budget.expired() {
                hit_deadline = true;
                break 'origins;
            }
            for next in graph.successors(current) {
                if path.contains(&next) {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(next);
                let hops = extended.len() - 1;

                if hops >= MIN_HOPS && interiors_are_shells(graph, &extended) {
                    chains.push(extended.clone());
                    if chains.len() >= chain_cap {
                        hit_cap = true;
                        break 'origins;
                    }
                }
                if hops < MAX_HOPS {
                    stack.push((next, extended));
                }
            }
        }
    }

    let chains = drop_strict_prefixes(chains);
    if hit_cap {
        debug!(cap = chain_cap, "shell detector hit chain cap");
    }

    let rings = chains
        .into_iter()
        .map(|path| {
            let temporal = path_is_time_ordered(graph, &path);
            RawRing {
                pattern: RingPattern::LayeredShell,
                members: path,
                hub: None,
                temporal,
            }
        })
        .collect();

    DetectorOutcome {
        rings,
        hit_cap,
        hit_deadline,
    }
}

/// Interior vertices of the path must have in-degree exactly 1.
fn interiors_are_shells(graph: &TransferGraph, path: &[u32]) -> bool {
    path[1..path.len() - 1]
        .iter()
        .all(|&v| graph.in_degree(v) == 1)
}

/// Edge `first_ts` monotonically non-decreasing along the path.
fn path_is_time_ordered(graph: &TransferGraph, path: &[u32]) -> bool {
    let mut prev = None;
    for pair in path.windows(2) {
        let edge = graph
            .out_edges(pair[0])
            .iter()
            .map(|&e| graph.edge(e))
            .find(|e| e.to == pair[1])
            .expect("path edge must exist in graph");
        if let Some(prev_ts) = prev {
            if edge.first_ts < prev_ts {
                return false;
            }
        }
        prev = Some(edge.first_ts);
    }
    true
}

/// Remove chains that are strict prefixes of another recorded chain.
fn drop_strict_prefixes(chains: Vec<Vec<u32>>) -> Vec<Vec<u32>> {
    let mut prefixes: HashSet<&[u32]> = HashSet::new();
    for chain in &chains {
        for len in MIN_HOPS + 1..chain.len() {
            prefixes.insert(&chain[..len]);
        }
    }
    let keep: Vec<bool> = chains
        .iter()
        .map(|c| !prefixes.contains(c.as_slice()))
        .collect();
    chains
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}
