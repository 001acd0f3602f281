use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::core::graph::TransferGraph;
use crate::core::{AccountFinding, ExportEdge, ExportNode, GraphExport};

/// Fixed sampling seed so equal inputs produce byte-identical payloads.
const SAMPLE_SEED: u64 = 0x52494E47;

/// Produce the bounded visualisation payload.
///
/// Under the cap the full graph is emitted. Over it, every suspicious
/// account is kept and clean accounts are sampled (seeded shuffle over the
/// identifier-sorted list) until `cap` nodes are selected. Only edges with
/// both endpoints selected survive.
pub fn export_graph(
    graph: &TransferGraph,
    findings: &[AccountFinding],
    cap: usize,
) -> GraphExport {
    let scores: HashMap<&str, u8> = findings
        .iter()
        .map(|f| (f.account_id.as_str(), f.suspicion_score))
        .collect();

    let capped = graph.vertex_count() > cap;
    let selected: Vec<&str> = if capped {
        select_capped(graph, &scores, cap)
    } else {
        // Full graph: suspicious first (score desc, id asc), then clean.
        let mut ids = graph.account_ids_sorted();
        ids.sort_by_key(|id| std::cmp::Reverse(scores.get(id).copied().unwrap_or(0)));
        ids
    };

    let selected_set: HashSet<&str> = selected.iter().copied().collect();

    let nodes: Vec<ExportNode> = selected
        .iter()
        .map(|&id| {
            let score = scores.get(id).copied();
            ExportNode {
                id: id.to_string(),
                suspicious: score.is_some(),
                suspicion_score: score,
            }
        })
        .collect();

    let mut edges: Vec<ExportEdge> = graph
        .edges()
        .filter(|e| {
            selected_set.contains(graph.account(e.from)) && selected_set.contains(graph.account(e.to))
        })
        .map(|e| ExportEdge {
            source: graph.account(e.from).to_string(),
            target: graph.account(e.to).to_string(),
        })
        .collect();
    edges.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));

    GraphExport {
        nodes,
        edges,
        capped,
        cap_limit: cap,
    }
}

fn select_capped<'g>(
    graph: &'g TransferGraph,
    scores: &HashMap<&str, u8>,
    cap: usize,
) -> Vec<&'g str> {
    let mut suspicious: Vec<&str> = Vec::new();
    let mut clean: Vec<&str> = Vec::new();
    for id in graph.account_ids_sorted() {
        if scores.contains_key(id) {
            suspicious.push(id);
        } else {
            clean.push(id);
        }
    }
    suspicious.sort_by_key(|id| (std::cmp::Reverse(scores[id]), *id));

    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    clean.shuffle(&mut rng);
    clean.truncate(cap.saturating_sub(suspicious.len()));

    suspicious.extend(clean);
    suspicious
}
