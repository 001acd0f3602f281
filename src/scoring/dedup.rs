use std::collections::HashMap;

use crate::scoring::DetectedRing;

/// Collapse rings with identical member sets.
///
/// The survivor is the higher `risk_score`; ties keep the earlier discovery.
/// Survivors stay in ascending first-discovery order of their member set, so
/// ring ids assigned afterwards are contiguous and deterministic.
pub fn dedup_rings(rings: Vec<DetectedRing>) -> Vec<DetectedRing> {
    let mut slot_by_members: HashMap<Vec<String>, usize> = HashMap::new();
    let mut kept: Vec<DetectedRing> = Vec::new();

    for ring in rings {
        let mut key = ring.members.clone();
        key.sort_unstable();

        match slot_by_members.get(&key) {
            Some(&slot) => {
                let incumbent = &kept[slot];
                if ring.risk_score() > incumbent.risk_score() {
                    kept[slot] = ring;
                }
            }
            None => {
                slot_by_members.insert(key, kept.len());
                kept.push(ring);
            }
        }
    }

    kept
}
