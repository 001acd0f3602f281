pub mod dedup;

use std::collections::HashMap;

use crate::core::{AccountFinding, PatternTag, Ring};
use crate::detectors::RingPattern;

/// A detector ring after merge and account-id resolution, before dedup and
/// ring-id assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRing {
    pub pattern: RingPattern,
    pub members: Vec<String>,
    pub hub: Option<String>,
    pub temporal: bool,
}

impl DetectedRing {
    pub fn risk_score(&self) -> u8 {
        self.pattern.risk_score(self.temporal)
    }

    /// Fine-grained tag this ring contributes to `account`.
    fn tag_for(&self, account: &str) -> PatternTag {
        let is_hub = self.hub.as_deref() == Some(account);
        match (self.pattern, is_hub, self.temporal) {
            (RingPattern::Cycle(3), ..) => PatternTag::CycleLength3,
            (RingPattern::Cycle(4), ..) => PatternTag::CycleLength4,
            (RingPattern::Cycle(_), ..) => PatternTag::CycleLength5,
            (RingPattern::SmurfingFanIn, true, true) => PatternTag::FanInHubTemporal,
            (RingPattern::SmurfingFanIn, true, false) => PatternTag::FanInHub,
            (RingPattern::SmurfingFanIn, false, true) => PatternTag::FanInLeafTemporal,
            (RingPattern::SmurfingFanIn, false, false) => PatternTag::FanInLeaf,
            (RingPattern::SmurfingFanOut, true, true) => PatternTag::FanOutHubTemporal,
            (RingPattern::SmurfingFanOut, true, false) => PatternTag::FanOutHub,
            (RingPattern::SmurfingFanOut, false, true) => PatternTag::FanOutLeafTemporal,
            (RingPattern::SmurfingFanOut, false, false) => PatternTag::FanOutLeaf,
            (RingPattern::LayeredShell, ..) => PatternTag::LayeredShellNetwork,
        }
    }

    /// Bonus category: all cycle lengths count as one.
    fn category(&self) -> u8 {
        match self.pattern {
            RingPattern::Cycle(_) => 0,
            RingPattern::SmurfingFanIn => 1,
            RingPattern::SmurfingFanOut => 2,
            RingPattern::LayeredShell => 3,
        }
    }
}

const MULTI_PATTERN_BONUS_STEP: u8 = 5;
const MULTI_PATTERN_BONUS_CAP: u8 = 10;

fn ring_id(index: usize) -> String {
    format!("RING_{:03}", index + 1)
}

/// Assign ring ids and aggregate per-account suspicion scores.
///
/// `rings` must already be deduplicated and in final discovery order; the
/// wire `ring_id` is its position. Findings come back sorted by score
/// descending, then account id.
pub fn score_accounts(rings: &[DetectedRing]) -> (Vec<Ring>, Vec<AccountFinding>) {
    let wire_rings: Vec<Ring> = rings
        .iter()
        .enumerate()
        .map(|(i, r)| Ring {
            ring_id: ring_id(i),
            pattern_type: r.pattern.type_str(),
            members: r.members.clone(),
            risk_score: r.risk_score(),
            temporal_confirmed: r.temporal,
        })
        .collect();

    // Memberships per account in discovery order: (ring index, tag).
    let mut memberships: HashMap<&str, Vec<(usize, PatternTag)>> = HashMap::new();
    for (i, ring) in rings.iter().enumerate() {
        for member in &ring.members {
            memberships
                .entry(member.as_str())
                .or_default()
                .push((i, ring.tag_for(member)));
        }
    }

    let mut findings: Vec<AccountFinding> = memberships
        .into_iter()
        .map(|(account, entries)| build_finding(account, &entries, rings))
        .collect();

    findings.sort_by(|a, b| {
        b.suspicion_score
            .cmp(&a.suspicion_score)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    (wire_rings, findings)
}

fn build_finding(
    account: &str,
    entries: &[(usize, PatternTag)],
    rings: &[DetectedRing],
) -> AccountFinding {
    let max_base = entries
        .iter()
        .map(|(_, tag)| tag.base_score())
        .max()
        .unwrap_or(0);

    let mut categories: Vec<u8> = entries.iter().map(|(i, _)| rings[*i].category()).collect();
    categories.sort_unstable();
    categories.dedup();
    let bonus =
        MULTI_PATTERN_BONUS_CAP.min((categories.len() as u8 - 1) * MULTI_PATTERN_BONUS_STEP);
    let suspicion_score = 100.min(max_base as u16 + bonus as u16) as u8;

    // Distinct tags by descending contribution; ties by first discovery.
    let mut first_seen: Vec<(PatternTag, usize)> = Vec::new();
    for (i, tag) in entries {
        if !first_seen.iter().any(|(t, _)| t == tag) {
            first_seen.push((*tag, *i));
        }
    }
    first_seen.sort_by(|a, b| {
        b.0.base_score()
            .cmp(&a.0.base_score())
            .then_with(|| a.1.cmp(&b.1))
    });
    let detected_patterns: Vec<PatternTag> = first_seen.into_iter().map(|(t, _)| t).collect();

    let primary = entries
        .iter()
        .find(|(_, tag)| tag.base_score() == max_base)
        .map(|(i, _)| *i)
        .unwrap_or(0);

    AccountFinding {
        account_id: account.to_string(),
        suspicion_score,
        detected_patterns,
        ring_id: ring_id(primary),
        all_ring_ids: entries.iter().map(|(i, _)| ring_id(*i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(pattern: RingPattern, members: &[&str], hub: Option<&str>, temporal: bool) -> DetectedRing {
        DetectedRing {
            pattern,
            members: members.iter().map(|m| m.to_string()).collect(),
            hub: hub.map(|h| h.to_string()),
            temporal,
        }
    }

    fn finding<'a>(findings: &'a [AccountFinding], account: &str) -> &'a AccountFinding {
        findings
            .iter()
            .find(|f| f.account_id == account)
            .unwrap_or_else(|| panic!("no finding for {account}"))
    }

    #[test]
    fn cycle_members_score_the_cycle_base() {
        let rings = vec![ring(RingPattern::Cycle(3), &["A", "B", "C"], None, false)];
        let (wire, findings) = score_accounts(&rings);

        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].ring_id, "RING_001");
        assert_eq!(wire[0].risk_score, 95);
        assert_eq!(findings.len(), 3);
        for f in &findings {
            assert_eq!(f.suspicion_score, 95);
            assert_eq!(f.detected_patterns, vec![PatternTag::CycleLength3]);
            assert_eq!(f.ring_id, "RING_001");
            assert_eq!(f.all_ring_ids, vec!["RING_001"]);
        }
    }

    #[test]
    fn hub_and_leaves_get_role_specific_tags() {
        let rings = vec![ring(
            RingPattern::SmurfingFanIn,
            &["S1", "S2", "H"],
            Some("H"),
            true,
        )];
        let (_, findings) = score_accounts(&rings);

        let hub = finding(&findings, "H");
        assert_eq!(hub.suspicion_score, 95);
        assert_eq!(hub.detected_patterns, vec![PatternTag::FanInHubTemporal]);

        let leaf = finding(&findings, "S1");
        assert_eq!(leaf.suspicion_score, 80);
        assert_eq!(leaf.detected_patterns, vec![PatternTag::FanInLeafTemporal]);
    }

    #[test]
    fn non_temporal_hub_scores_lower() {
        let rings = vec![ring(
            RingPattern::SmurfingFanIn,
            &["S1", "S2", "H"],
            Some("H"),
            false,
        )];
        let (_, findings) = score_accounts(&rings);
        assert_eq!(finding(&findings, "H").suspicion_score, 85);
        assert_eq!(finding(&findings, "S1").suspicion_score, 70);
    }

    #[test]
    fn cross_pattern_account_gets_bonus_clamped_at_100() {
        let rings = vec![
            ring(RingPattern::Cycle(3), &["Q", "B", "C"], None, false),
            ring(
                RingPattern::SmurfingFanIn,
                &["S1", "S2", "Q"],
                Some("Q"),
                true,
            ),
        ];
        let (_, findings) = score_accounts(&rings);

        let q = finding(&findings, "Q");
        // max_base 95, two categories → +5, clamped at 100.
        assert_eq!(q.suspicion_score, 100);
        assert_eq!(q.all_ring_ids, vec!["RING_001", "RING_002"]);
        assert!(q.detected_patterns.contains(&PatternTag::CycleLength3));
        assert!(q.detected_patterns.contains(&PatternTag::FanInHubTemporal));
    }

    #[test]
    fn two_cycle_lengths_are_one_category() {
        let rings = vec![
            ring(RingPattern::Cycle(3), &["A", "B", "C"], None, false),
            ring(RingPattern::Cycle(4), &["A", "D", "E", "F"], None, false),
        ];
        let (_, findings) = score_accounts(&rings);
        // No multi-pattern bonus: both memberships are cycles.
        assert_eq!(finding(&findings, "A").suspicion_score, 95);
    }

    #[test]
    fn bonus_caps_at_ten() {
        let rings = vec![
            ring(RingPattern::Cycle(3), &["A", "B", "C"], None, false),
            ring(RingPattern::SmurfingFanIn, &["A", "S", "H"], Some("H"), false),
            ring(RingPattern::SmurfingFanOut, &["A", "R", "G"], Some("G"), false),
            ring(
                RingPattern::LayeredShell,
                &["A", "X", "Y", "Z"],
                None,
                false,
            ),
        ];
        let (_, findings) = score_accounts(&rings);
        // Four categories would be +15; capped at +10, then clamped.
        assert_eq!(finding(&findings, "A").suspicion_score, 100);
    }

    #[test]
    fn detected_patterns_ordered_by_contribution() {
        let rings = vec![
            ring(
                RingPattern::SmurfingFanIn,
                &["A", "S", "H"],
                Some("H"),
                false,
            ),
            ring(RingPattern::Cycle(3), &["A", "B", "C"], None, false),
        ];
        let (_, findings) = score_accounts(&rings);
        let a = finding(&findings, "A");
        // Leaf base 70 < cycle base 95 even though the fan-in came first.
        assert_eq!(
            a.detected_patterns,
            vec![PatternTag::CycleLength3, PatternTag::FanInLeaf]
        );
        assert_eq!(a.ring_id, "RING_002");
    }

    #[test]
    fn primary_ring_tie_breaks_to_earliest() {
        let rings = vec![
            ring(RingPattern::Cycle(3), &["A", "B", "C"], None, false),
            ring(RingPattern::Cycle(3), &["A", "D", "E"], None, false),
        ];
        let (_, findings) = score_accounts(&rings);
        assert_eq!(finding(&findings, "A").ring_id, "RING_001");
    }

    #[test]
    fn findings_sorted_by_score_then_account() {
        let rings = vec![ring(
            RingPattern::SmurfingFanIn,
            &["S2", "S1", "H"],
            Some("H"),
            true,
        )];
        let (_, findings) = score_accounts(&rings);
        let order: Vec<&str> = findings.iter().map(|f| f.account_id.as_str()).collect();
        assert_eq!(order, vec!["H", "S1", "S2"]);
    }

    #[test]
    fn adding_a_membership_never_lowers_a_score() {
        let base = vec![ring(RingPattern::Cycle(5), &["A", "B", "C", "D", "E"], None, false)];
        let (_, findings) = score_accounts(&base);
        let before = finding(&findings, "A").suspicion_score;

        let more = vec![
            ring(RingPattern::Cycle(5), &["A", "B", "C", "D", "E"], None, false),
            ring(
                RingPattern::LayeredShell,
                &["A", "X", "Y", "Z"],
                None,
                false,
            ),
        ];
        let (_, findings) = score_accounts(&more);
        assert!(finding(&findings, "A").suspicion_score >= before);
    }

    #[test]
    fn ring_ids_are_zero_padded_and_contiguous() {
        let rings: Vec<DetectedRing> = (0..12)
            .map(|i| {
                let (a, b, c) = (format!("A{i}"), format!("B{i}"), format!("C{i}"));
                ring(
                    RingPattern::Cycle(3),
                    &[a.as_str(), b.as_str(), c.as_str()],
                    None,
                    false,
                )
            })
            .collect();
        let (wire, _) = score_accounts(&rings);
        assert_eq!(wire[0].ring_id, "RING_001");
        assert_eq!(wire[9].ring_id, "RING_010");
        assert_eq!(wire[11].ring_id, "RING_012");
    }
}
