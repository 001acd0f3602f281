use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::TransferRecord;

/// Aggregate of all records sharing one ordered (sender, receiver) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAgg {
    pub from: u32,
    pub to: u32,
    /// Sum of amounts over the aggregated records.
    pub weight: f64,
    /// Number of aggregated records. Always equals `txn_ids.len()` because
    /// the normaliser drops duplicate transaction ids.
    pub count: u32,
    pub first_ts: DateTime<Utc>,
    pub last_ts: DateTime<Utc>,
    pub txn_ids: Vec<String>,
}

/// Directed transfer graph over compact `u32` vertex indices.
///
/// At most one edge per ordered pair; self-loops are rejected upstream.
/// After construction the graph is immutable and shared read-only across
/// detector threads. Adjacency lists are sorted by counterparty identifier so
/// every traversal is deterministic regardless of record order.
#[derive(Debug, Default)]
pub struct TransferGraph {
    accounts: Vec<String>,
    index: HashMap<String, u32>,
    edges: Vec<EdgeAgg>,
    /// Per-vertex outgoing edge indices, sorted by target account id.
    out: Vec<Vec<u32>>,
    /// Per-vertex incoming edge indices, sorted by source account id.
    inc: Vec<Vec<u32>>,
}

impl TransferGraph {
    /// Fold a normalised record stream into the aggregate graph.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TransferRecord>,
    {
        let mut g = TransferGraph::default();
        let mut pair_index: HashMap<(u32, u32), u32> = HashMap::new();

        for record in records {
            // Self-loops and non-positive amounts never enter the graph,
            // even when the caller bypassed the normaliser.
            if record.sender == record.receiver || record.amount <= 0.0 {
                continue;
            }
            let from = g.intern(&record.sender);
            let to = g.intern(&record.receiver);

            match pair_index.get(&(from, to)) {
                Some(&eidx) => {
                    let edge = &mut g.edges[eidx as usize];
                    edge.weight += record.amount;
                    edge.count += 1;
                    edge.first_ts = edge.first_ts.min(record.timestamp);
                    edge.last_ts = edge.last_ts.max(record.timestamp);
                    edge.txn_ids.push(record.transaction_id);
                }
                None => {
                    let eidx = g.edges.len() as u32;
                    g.edges.push(EdgeAgg {
                        from,
                        to,
                        weight: record.amount,
                        count: 1,
                        first_ts: record.timestamp,
                        last_ts: record.timestamp,
                        txn_ids: vec![record.transaction_id],
                    });
                    pair_index.insert((from, to), eidx);
                    g.out[from as usize].push(eidx);
                    g.inc[to as usize].push(eidx);
                }
            }
        }

        // Deterministic traversal order: sort adjacency by counterparty id,
        // and txn lists by id so equal input multisets build equal graphs.
        for list in &mut g.out {
            list.sort_by(|&a, &b| {
                g.accounts[g.edges[a as usize].to as usize]
                    .cmp(&g.accounts[g.edges[b as usize].to as usize])
            });
        }
        for list in &mut g.inc {
            list.sort_by(|&a, &b| {
                g.accounts[g.edges[a as usize].from as usize]
                    .cmp(&g.accounts[g.edges[b as usize].from as usize])
            });
        }
        for edge in &mut g.edges {
            edge.txn_ids.sort();
        }

        g
    }

    fn intern(&mut self, account: &str) -> u32 {
        if let Some(&v) = self.index.get(account) {
            return v;
        }
        let v = self.accounts.len() as u32;
        self.accounts.push(account.to_string());
        self.index.insert(account.to_string(), v);
        self.out.push(Vec::new());
        self.inc.push(Vec::new());
        v
    }

    pub fn vertex_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn account(&self, v: u32) -> &str {
        &self.accounts[v as usize]
    }

    #[allow(dead_code)]
    pub fn vertex(&self, account: &str) -> Option<u32> {
        self.index.get(account).copied()
    }

    pub fn out_degree(&self, v: u32) -> usize {
        self.out[v as usize].len()
    }

    pub fn in_degree(&self, v: u32) -> usize {
        self.inc[v as usize].len()
    }

    pub fn edge(&self, eidx: u32) -> &EdgeAgg {
        &self.edges[eidx as usize]
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeAgg> {
        self.edges.iter()
    }

    /// Outgoing edge indices of `v`, sorted by target account id.
    pub fn out_edges(&self, v: u32) -> &[u32] {
        &self.out[v as usize]
    }

    /// Incoming edge indices of `v`, sorted by source account id.
    pub fn in_edges(&self, v: u32) -> &[u32] {
        &self.inc[v as usize]
    }

    /// Successor vertices of `v` in target-id order.
    pub fn successors(&self, v: u32) -> impl Iterator<Item = u32> + '_ {
        self.out[v as usize].iter().map(|&e| self.edges[e as usize].to)
    }

    /// Predecessor vertices of `v` in source-id order.
    pub fn predecessors(&self, v: u32) -> impl Iterator<Item = u32> + '_ {
        self.inc[v as usize]
            .iter()
            .map(|&e| self.edges[e as usize].from)
    }

    /// All vertices sorted by account identifier.
    pub fn vertices_by_id(&self) -> Vec<u32> {
        let mut vs: Vec<u32> = (0..self.accounts.len() as u32).collect();
        vs.sort_by(|&a, &b| self.accounts[a as usize].cmp(&self.accounts[b as usize]));
        vs
    }

    /// All account identifiers, sorted.
    pub fn account_ids_sorted(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.accounts.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour as i64)
    }

    pub(crate) fn rec(id: &str, from: &str, to: &str, amount: f64, hour: u32) -> TransferRecord {
        TransferRecord {
            transaction_id: id.to_string(),
            sender: from.to_string(),
            receiver: to.to_string(),
            amount,
            timestamp: ts(hour),
        }
    }

    #[test]
    fn aggregates_parallel_records_into_one_edge() {
        let g = TransferGraph::build(vec![
            rec("T1", "A", "B", 100.0, 5),
            rec("T2", "A", "B", 250.0, 2),
        ]);
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 1);

        let edge = g.edge(g.out_edges(g.vertex("A").unwrap())[0]);
        assert_eq!(edge.weight, 350.0);
        assert_eq!(edge.count, 2);
        assert_eq!(edge.first_ts, ts(2));
        assert_eq!(edge.last_ts, ts(5));
        assert_eq!(edge.txn_ids, vec!["T1".to_string(), "T2".to_string()]);
    }

    #[test]
    fn edge_invariants_hold() {
        let g = TransferGraph::build(vec![
            rec("T1", "A", "B", 10.0, 1),
            rec("T2", "A", "B", 20.0, 9),
            rec("T3", "B", "C", 5.0, 3),
        ]);
        for edge in g.edges() {
            assert!(edge.first_ts <= edge.last_ts);
            assert_eq!(edge.count as usize, edge.txn_ids.len());
        }
    }

    #[test]
    fn build_is_order_independent() {
        let forward = vec![
            rec("T1", "A", "B", 100.0, 1),
            rec("T2", "A", "B", 50.0, 4),
            rec("T3", "B", "C", 75.0, 2),
            rec("T4", "C", "A", 75.0, 3),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let g1 = TransferGraph::build(forward);
        let g2 = TransferGraph::build(reversed);

        assert_eq!(g1.account_ids_sorted(), g2.account_ids_sorted());
        assert_eq!(g1.edge_count(), g2.edge_count());
        for id in g1.account_ids_sorted() {
            let v1 = g1.vertex(id).unwrap();
            let v2 = g2.vertex(id).unwrap();
            assert_eq!(g1.out_degree(v1), g2.out_degree(v2));
            assert_eq!(g1.in_degree(v1), g2.in_degree(v2));
            let e1: Vec<_> = g1
                .out_edges(v1)
                .iter()
                .map(|&e| {
                    let edge = g1.edge(e);
                    (
                        g1.account(edge.to).to_string(),
                        edge.weight,
                        edge.count,
                        edge.first_ts,
                        edge.last_ts,
                        edge.txn_ids.clone(),
                    )
                })
                .collect();
            let e2: Vec<_> = g2
                .out_edges(v2)
                .iter()
                .map(|&e| {
                    let edge = g2.edge(e);
                    (
                        g2.account(edge.to).to_string(),
                        edge.weight,
                        edge.count,
                        edge.first_ts,
                        edge.last_ts,
                        edge.txn_ids.clone(),
                    )
                })
                .collect();
            assert_eq!(e1, e2);
        }
    }

    #[test]
    fn adjacency_sorted_by_counterparty_id() {
        let g = TransferGraph::build(vec![
            rec("T1", "H", "Z", 1.0, 1),
            rec("T2", "H", "A", 1.0, 2),
            rec("T3", "H", "M", 1.0, 3),
        ]);
        let h = g.vertex("H").unwrap();
        let targets: Vec<&str> = g.successors(h).map(|v| g.account(v)).collect();
        assert_eq!(targets, vec!["A", "M", "Z"]);
    }

    #[test]
    fn builder_rejects_self_loops_and_non_positive_amounts() {
        let g = TransferGraph::build(vec![
            rec("T1", "A", "A", 10.0, 0),
            rec("T2", "A", "B", 0.0, 1),
            rec("T3", "A", "B", 7.5, 2),
        ]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge(0).weight, 7.5);
    }

    #[test]
    fn degree_zero_vertices_survive_in_account_set() {
        // Both endpoints enter the account set even if one never sends.
        let g = TransferGraph::build(vec![rec("T1", "A", "B", 1.0, 0)]);
        let b = g.vertex("B").unwrap();
        assert_eq!(g.out_degree(b), 0);
        assert_eq!(g.in_degree(b), 1);
    }
}
