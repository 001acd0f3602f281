//! CSV ingestion and record normalisation.
//!
//! Accepts the five required columns in any order, parses timestamps as
//! RFC 3339 or `YYYY-MM-DD HH:MM:SS`, and drops records that cannot enter
//! the graph: duplicate transaction ids (first occurrence wins), self-loops,
//! and non-positive or non-finite amounts.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use tracing::debug;

use crate::core::TransferRecord;
use crate::error::{AnalyzeError, Result};

const REQUIRED_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "receiver_id",
    "amount",
    "timestamp",
];

/// Parse and normalise an uploaded CSV batch.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<TransferRecord>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AnalyzeError::Csv(e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| column(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(AnalyzeError::MissingColumns(missing.join(", ")));
    }

    let idx_txn = column("transaction_id").unwrap();
    let idx_sender = column("sender_id").unwrap();
    let idx_receiver = column("receiver_id").unwrap();
    let idx_amount = column("amount").unwrap();
    let idx_ts = column("timestamp").unwrap();

    let mut records = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or("").to_string();

        let transaction_id = field(idx_txn);
        let sender = field(idx_sender);
        let receiver = field(idx_receiver);
        let amount_raw = field(idx_amount);
        let amount: f64 = amount_raw
            .parse()
            .map_err(|_| AnalyzeError::Amount(amount_raw.clone()))?;
        let timestamp = parse_timestamp(&field(idx_ts))?;

        // Normalisation filters: records that cannot enter the graph.
        if sender == receiver || amount <= 0.0 || !amount.is_finite() {
            dropped += 1;
            continue;
        }
        if !seen_ids.insert(transaction_id.clone()) {
            dropped += 1;
            continue;
        }

        records.push(TransferRecord {
            transaction_id,
            sender,
            receiver,
            amount,
            timestamp,
        });
    }

    if dropped > 0 {
        debug!(dropped, kept = records.len(), "normaliser dropped records");
    }
    Ok(records)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(AnalyzeError::Timestamp(raw.to_string()))
}
