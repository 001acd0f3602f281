pub mod graph;
pub mod pipeline;

use chrono::{DateTime, Utc};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A normalised money-transfer record, ready for graph construction.
///
/// The ingest layer guarantees: `transaction_id` unique within the batch,
/// `sender != receiver`, `amount > 0` and finite.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub transaction_id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Fine-grained pattern tag attached to an account finding.
///
/// The string forms are a wire contract consumed by front-end labelling;
/// they serialize via [`PatternTag::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternTag {
    CycleLength3,
    CycleLength4,
    CycleLength5,
    FanInHubTemporal,
    FanInHub,
    FanInLeafTemporal,
    FanInLeaf,
    FanOutHubTemporal,
    FanOutHub,
    FanOutLeafTemporal,
    FanOutLeaf,
    LayeredShellNetwork,
}

impl PatternTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::CycleLength3 => "cycle_length_3",
            PatternTag::CycleLength4 => "cycle_length_4",
            PatternTag::CycleLength5 => "cycle_length_5",
            PatternTag::FanInHubTemporal => "fan_in_hub_temporal",
            PatternTag::FanInHub => "fan_in_hub",
            PatternTag::FanInLeafTemporal => "fan_in_leaf_temporal",
            PatternTag::FanInLeaf => "fan_in_leaf",
            PatternTag::FanOutHubTemporal => "fan_out_hub_temporal",
            PatternTag::FanOutHub => "fan_out_hub",
            PatternTag::FanOutLeafTemporal => "fan_out_leaf_temporal",
            PatternTag::FanOutLeaf => "fan_out_leaf",
            PatternTag::LayeredShellNetwork => "layered_shell_network",
        }
    }

    /// Base suspicion contribution of this tag for a member account.
    pub fn base_score(&self) -> u8 {
        match self {
            PatternTag::CycleLength3 => 95,
            PatternTag::CycleLength4 => 90,
            PatternTag::CycleLength5 => 85,
            PatternTag::FanInHubTemporal | PatternTag::FanOutHubTemporal => 95,
            PatternTag::FanInHub | PatternTag::FanOutHub => 85,
            PatternTag::FanInLeafTemporal | PatternTag::FanOutLeafTemporal => 80,
            PatternTag::FanInLeaf | PatternTag::FanOutLeaf => 70,
            PatternTag::LayeredShellNetwork => 75,
        }
    }
}

impl Serialize for PatternTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A structurally suspicious account set that survived deduplication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring {
    pub ring_id: String,
    pub pattern_type: String,
    pub members: Vec<String>,
    pub risk_score: u8,
    pub temporal_confirmed: bool,
}

/// Per-account verdict: aggregated suspicion score plus ring memberships.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountFinding {
    pub account_id: String,
    pub suspicion_score: u8,
    pub detected_patterns: Vec<PatternTag>,
    /// Ring with the highest per-account contribution; ties broken by
    /// earliest discovery order.
    pub ring_id: String,
    pub all_ring_ids: Vec<String>,
}

/// Batch-level counters for the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
    pub shell_detection_skipped: bool,
}

/// Node in the bounded visualisation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    pub suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicion_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: String,
    pub target: String,
}

/// Visualisation payload, capped at [`GraphExport::cap_limit`] nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
    pub capped: bool,
    pub cap_limit: usize,
}

/// Complete analysis response for one uploaded batch.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub suspicious_accounts: Vec<AccountFinding>,
    pub fraud_rings: Vec<Ring>,
    pub summary: Summary,
    pub graph_data: GraphExport,
}
