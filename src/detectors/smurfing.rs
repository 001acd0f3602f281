use chrono::Duration;
use tracing::debug;

use crate::core::graph::TransferGraph;
use crate::detectors::{DetectorBudget, DetectorOutcome, RawRing, RingPattern};

/// Identify fan-in and fan-out smurfing hubs.
///
/// Fan-in: ≥ `fan_threshold` distinct senders converging on one receiver.
/// Fan-out is the mirror over successors. A cluster is temporally confirmed
/// when the hub's incident edges span at most `window_hours` between the
/// earliest `first_ts` and the latest `last_ts`.
///
/// The fan-in pass runs to completion over all hubs before the fan-out pass
/// starts, which fixes the cross-pattern discovery order.
pub fn detect(
    graph: &TransferGraph,
    fan_threshold: usize,
    window_hours: i64,
    budget: DetectorBudget,
) -> DetectorOutcome {
    let window = Duration::hours(window_hours);
    let hubs = graph.vertices_by_id();
    let mut rings = Vec::new();
    let mut hit_deadline = false;

    // Fan-in pass.
    for &hub in &hubs {
        if budget.expired() {
            hit_deadline = true;
            break;
        }
        if graph.in_degree(hub) < fan_threshold {
            continue;
        }
        let temporal = edges_within_window(graph, graph.in_edges(hub), window);
        let mut members: Vec<u32> = graph.predecessors(hub).collect();
        members.push(hub);
        rings.push(RawRing {
            pattern: RingPattern::SmurfingFanIn,
            members,
            hub: Some(hub),
            temporal,
        });
    }

    // Fan-out pass.
    if !hit_deadline {
        for &hub in &hubs {
            if budget.expired() {
                hit_deadline = true;
                break;
            }
            if graph.out_degree(hub) < fan_threshold {
                continue;
            }
            let temporal = edges_within_window(graph, graph.out_edges(hub), window);
            let mut members = vec![hub];
            members.extend(graph.successors(hub));
            rings.push(RawRing {
                pattern: RingPattern::SmurfingFanOut,
                members,
                hub: Some(hub),
                temporal,
            });
        }
    }

    if hit_deadline {
        debug!("smurfing detector stopped at deadline");
    }
    DetectorOutcome {
        rings,
        hit_cap: false,
        hit_deadline,
    }
}

/// Span between the earliest `first_ts` and latest `last_ts` over the given
/// edges, compared against the clustering window.
fn edges_within_window(graph: &TransferGraph, edge_idxs: &[u32], window: Duration) -> bool {
    let mut iter = edge_idxs.iter().map(|&e| graph.edge(e));
    let first = match iter.next() {
        Some(edge) => edge,
        None => return false,
    };
    let mut earliest = first.first_ts;
    let mut latest = first.last_ts;
    for edge in iter {
        earliest = earliest.min(edge.first_ts);
        latest = latest.max(edge.last_ts);
    }
    latest - earliest <= window
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::core::graph::tests::rec;
    use crate::core::TransferRecord;

    fn budget() -> DetectorBudget {
        DetectorBudget::new(StdDuration::from_secs(10))
    }

    /// Ten senders S00..S09 each paying hub H once, `spread_hours` apart.
    fn fan_in_records(spread_hours: u32) -> Vec<TransferRecord> {
        (0..10)
            .map(|i| {
                rec(
                    &format!("T{i}"),
                    &format!("S{i:02}"),
                    "H",
                    500.0,
                    i * spread_hours,
                )
            })
            .collect()
    }

    #[test]
    fn temporal_fan_in_cluster() {
        // All ten transfers land within 24 hours.
        let graph = TransferGraph::build(fan_in_records(2));
        let outcome = detect(&graph, 10, 72, budget());

        assert_eq!(outcome.rings.len(), 1);
        let ring = &outcome.rings[0];
        assert_eq!(ring.pattern, RingPattern::SmurfingFanIn);
        assert!(ring.temporal);
        assert_eq!(ring.members.len(), 11);
        assert_eq!(graph.account(ring.hub.unwrap()), "H");
    }

    #[test]
    fn slow_fan_in_is_not_temporal() {
        // 80 hours apart each: span ≈ 30 days, far past the 72 h window.
        let graph = TransferGraph::build(fan_in_records(80));
        let outcome = detect(&graph, 10, 72, budget());

        assert_eq!(outcome.rings.len(), 1);
        assert!(!outcome.rings[0].temporal);
    }

    #[test]
    fn nine_senders_is_below_threshold() {
        let records: Vec<TransferRecord> = (0..9)
            .map(|i| rec(&format!("T{i}"), &format!("S{i:02}"), "H", 500.0, i))
            .collect();
        let graph = TransferGraph::build(records);
        let outcome = detect(&graph, 10, 72, budget());
        assert!(outcome.rings.is_empty());
    }

    #[test]
    fn fan_out_mirrors_fan_in() {
        let records: Vec<TransferRecord> = (0..12)
            .map(|i| rec(&format!("T{i}"), "H", &format!("R{i:02}"), 100.0, i))
            .collect();
        let graph = TransferGraph::build(records);
        let outcome = detect(&graph, 10, 72, budget());

        assert_eq!(outcome.rings.len(), 1);
        let ring = &outcome.rings[0];
        assert_eq!(ring.pattern, RingPattern::SmurfingFanOut);
        assert!(ring.temporal);
        assert_eq!(ring.members.len(), 13);
        assert_eq!(ring.members[0], ring.hub.unwrap());
    }

    #[test]
    fn span_uses_edge_aggregates_not_single_records() {
        // S00 pays twice: once inside the cluster, once 10 days later. The
        // edge aggregate stretches last_ts, breaking temporal confirmation.
        let mut records = fan_in_records(1);
        records.push(rec("TLATE", "S00", "H", 500.0, 240));
        let graph = TransferGraph::build(records);
        let outcome = detect(&graph, 10, 72, budget());

        assert_eq!(outcome.rings.len(), 1);
        assert!(!outcome.rings[0].temporal);
    }

    #[test]
    fn fan_in_pass_precedes_fan_out_pass() {
        // H receives from 10 senders and also pays 10 receivers: two rings,
        // fan-in first regardless of identifier order.
        let mut records = fan_in_records(1);
        for i in 0..10 {
            records.push(rec(
                &format!("TO{i}"),
                "H",
                &format!("R{i:02}"),
                100.0,
                20 + i,
            ));
        }
        let graph = TransferGraph::build(records);
        let outcome = detect(&graph, 10, 72, budget());

        assert_eq!(outcome.rings.len(), 2);
        assert_eq!(outcome.rings[0].pattern, RingPattern::SmurfingFanIn);
        assert_eq!(outcome.rings[1].pattern, RingPattern::SmurfingFanOut);
    }

    #[test]
    fn expired_budget_returns_partial() {
        let graph = TransferGraph::build(fan_in_records(1));
        let outcome = detect(&graph, 10, 72, DetectorBudget::new(StdDuration::ZERO));
        assert!(outcome.rings.is_empty());
        assert!(outcome.hit_deadline);
    }
}
