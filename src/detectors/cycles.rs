use tracing::debug;

use crate::core::graph::TransferGraph;
use crate::detectors::{DetectorBudget, DetectorOutcome, RawRing, RingPattern};

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 5;

/// Enumerate simple directed cycles of length 3..=5.
///
/// Canonical-start rule: a cycle is recorded only from its minimum vertex
/// under account-identifier order, and every intermediate must be strictly
/// greater than the start. This kills the k rotations of each cycle without
/// a post-hoc dedup pass.
pub fn detect(
    graph: &TransferGraph,
    start_cap: usize,
    ring_cap: usize,
    budget: DetectorBudget,
) -> DetectorOutcome {
    let mut search = CycleSearch {
        graph,
        rank: id_ranks(graph),
        on_path: vec![false; graph.vertex_count()],
        path: Vec::with_capacity(MAX_LEN),
        rings: Vec::new(),
        ring_cap,
        budget,
        stopped: false,
    };

    for start in ranked_start_vertices(graph, start_cap) {
        if search.stopped {
            break;
        }
        search.on_path[start as usize] = true;
        search.path.push(start);
        search.walk(start, start);
        search.path.pop();
        search.on_path[start as usize] = false;
    }

    let hit_cap = search.rings.len() >= ring_cap;
    let hit_deadline = search.stopped && !hit_cap;
    if hit_cap {
        debug!(cap = ring_cap, "cycle detector hit ring cap");
    }
    DetectorOutcome {
        rings: search.rings,
        hit_cap,
        hit_deadline,
    }
}

/// Start vertices ranked by total degree descending, ties by identifier.
fn ranked_start_vertices(graph: &TransferGraph, cap: usize) -> Vec<u32> {
    let mut vs: Vec<u32> = (0..graph.vertex_count() as u32).collect();
    vs.sort_by(|&a, &b| {
        let da = graph.out_degree(a) + graph.in_degree(a);
        let db = graph.out_degree(b) + graph.in_degree(b);
        db.cmp(&da).then_with(|| graph.account(a).cmp(graph.account(b)))
    });
    vs.truncate(cap);
    vs
}

/// Identifier rank per vertex: rank[v] < rank[w] iff account(v) < account(w).
fn id_ranks(graph: &TransferGraph) -> Vec<u32> {
    let mut rank = vec![0u32; graph.vertex_count()];
    for (i, v) in graph.vertices_by_id().into_iter().enumerate() {
        rank[v as usize] = i as u32;
    }
    rank
}

struct CycleSearch<'g> {
    graph: &'g TransferGraph,
    rank: Vec<u32>,
    on_path: Vec<bool>,
    path: Vec<u32>,
    rings: Vec<RawRing>,
    ring_cap: usize,
    budget: DetectorBudget,
    stopped: bool,
}

impl CycleSearch<'_> {
    fn walk(&mut self, start: u32, current: u32) {
        if self.budget.expired() {
            self.stopped = true;
            return;
        }

        for &eidx in self.graph.out_edges(current) {
            if self.stopped {
                return;
            }
            let next = self.graph.edge(eidx).to;

            if next == start {
                let len = self.path.len();
                if (MIN_LEN..=MAX_LEN).contains(&len) {
                    self.rings.push(RawRing {
                        pattern: RingPattern::Cycle(len),
                        members: self.path.clone(),
                        hub: None,
                        temporal: false,
                    });
                    if self.rings.len() >= self.ring_cap {
                        self.stopped = true;
                        return;
                    }
                }
                continue;
            }

            // Canonical-start pruning: only vertices above the start, each at
            // most once, and never deeper than the longest cycle.
            if self.rank[next as usize] <= self.rank[start as usize]
                || self.on_path[next as usize]
                || self.path.len() >= MAX_LEN
            {
                continue;
            }

            self.on_path[next as usize] = true;
            self.path.push(next);
            self.walk(start, next);
            self.path.pop();
            self.on_path[next as usize] = false;
        }
    }
}
