use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::Config;
use crate::core::graph::TransferGraph;
use crate::core::{AnalysisReport, Summary, TransferRecord};
use crate::detectors::{cycles, shells, smurfing, DetectorBudget, DetectorOutcome, RawRing};
use crate::error::{AnalyzeError, Result};
use crate::export::export_graph;
use crate::scoring::dedup::dedup_rings;
use crate::scoring::{score_accounts, DetectedRing};

/// Run the full detection pipeline over a normalised batch.
///
/// The three detectors run on their own OS threads against the shared
/// read-only graph, each under its own deadline; partial results are
/// legitimate output. Their buffers are merged in a fixed order (cycles,
/// smurfing fan-in, smurfing fan-out, shells) so ring ids are deterministic
/// for a given input.
pub fn run_analysis(records: Vec<TransferRecord>, config: &Config) -> Result<AnalysisReport> {
    let started = Instant::now();
    let graph = Arc::new(TransferGraph::build(records));
    let total_accounts = graph.vertex_count();
    info!(
        accounts = total_accounts,
        edges = graph.edge_count(),
        "transfer graph built"
    );

    let d = config.detectors.clone();
    let shell_skipped = total_accounts > d.shell_skip_vertices;

    let cycle_handle = {
        let g = Arc::clone(&graph);
        let (start_cap, ring_cap) = (d.cycle_start_cap, d.cycle_ring_cap);
        let budget = DetectorBudget::new(Duration::from_secs(d.cycle_budget_seconds));
        thread::spawn(move || cycles::detect(&g, start_cap, ring_cap, budget))
    };
    let smurf_handle = {
        let g = Arc::clone(&graph);
        let (fan_threshold, window_hours) = (d.fan_threshold, d.window_hours);
        let budget = DetectorBudget::new(Duration::from_secs(d.smurfing_budget_seconds));
        thread::spawn(move || smurfing::detect(&g, fan_threshold, window_hours, budget))
    };
    let shell_handle = if shell_skipped {
        info!(
            accounts = total_accounts,
            limit = d.shell_skip_vertices,
            "shell detection skipped on oversized graph"
        );
        None
    } else {
        let g = Arc::clone(&graph);
        let chain_cap = d.shell_chain_cap;
        let budget = DetectorBudget::new(Duration::from_secs(d.shell_budget_seconds));
        Some(thread::spawn(move || shells::detect(&g, chain_cap, budget)))
    };

    let cycle_out = join_detector(cycle_handle, "cycle")?;
    let smurf_out = join_detector(smurf_handle, "smurfing")?;
    let shell_out = match shell_handle {
        Some(handle) => join_detector(handle, "shell")?,
        None => DetectorOutcome::default(),
    };

    for (name, outcome) in [
        ("cycle", &cycle_out),
        ("smurfing", &smurf_out),
        ("shell", &shell_out),
    ] {
        if outcome.hit_deadline {
            warn!(detector = name, "deadline expired, using partial results");
        }
        if outcome.hit_cap {
            warn!(detector = name, "result cap reached, using partial results");
        }
    }

    // Fixed merge order; smurfing already emits fan-in before fan-out.
    let mut raw: Vec<RawRing> = cycle_out.rings;
    raw.extend(smurf_out.rings);
    raw.extend(shell_out.rings);

    let detected: Vec<DetectedRing> = raw
        .into_iter()
        .map(|r| resolve(&graph, r))
        .collect::<Result<_>>()?;

    let surviving = dedup_rings(detected);
    let (fraud_rings, suspicious_accounts) = score_accounts(&surviving);
    let graph_data = export_graph(&graph, &suspicious_accounts, config.export.node_cap);

    let elapsed = started.elapsed().as_secs_f64();
    let summary = Summary {
        total_accounts_analyzed: total_accounts,
        suspicious_accounts_flagged: suspicious_accounts.len(),
        fraud_rings_detected: fraud_rings.len(),
        processing_time_seconds: (elapsed * 100.0).round() / 100.0,
        shell_detection_skipped: shell_skipped,
    };
    info!(
        rings = summary.fraud_rings_detected,
        suspicious = summary.suspicious_accounts_flagged,
        seconds = summary.processing_time_seconds,
        "analysis complete"
    );

    Ok(AnalysisReport {
        suspicious_accounts,
        fraud_rings,
        summary,
        graph_data,
    })
}

fn join_detector(
    handle: thread::JoinHandle<DetectorOutcome>,
    name: &str,
) -> Result<DetectorOutcome> {
    handle
        .join()
        .map_err(|_| AnalyzeError::Invariant(format!("{name} detector thread panicked")))
}

/// Resolve vertex indices to account ids and check the member invariant.
fn resolve(graph: &TransferGraph, ring: RawRing) -> Result<DetectedRing> {
    if ring.members.is_empty() {
        tracing::error!(pattern = ?ring.pattern, "detector emitted an empty ring");
        return Err(AnalyzeError::Invariant("ring with empty member set".into()));
    }
    Ok(DetectedRing {
        pattern: ring.pattern,
        members: ring
            .members
            .iter()
            .map(|&v| graph.account(v).to_string())
            .collect(),
        hub: ring.hub.map(|v| graph.account(v).to_string()),
        temporal: ring.temporal,
    })
}
