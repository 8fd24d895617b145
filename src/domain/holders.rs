//! Holder Snapshot Analysis
//!
//! Concentration and distribution signals computed from a point-in-time
//! holder list. Used by the candidate filter's diversity stage, the held
//! position monitor, and the ranking payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single holder entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderEntry {
    #[serde(default)]
    pub address: String,
    pub quantity: f64,
    pub percentage: f64,
}

/// Top-N holders of an instrument plus the total holder count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderSnapshot {
    pub total_holders: u64,
    pub holders: Vec<HolderEntry>,
}

impl HolderSnapshot {
    /// Build a snapshot, ordering holders by percentage descending so the
    /// first entry is always the largest holder.
    pub fn new(total_holders: u64, mut holders: Vec<HolderEntry>) -> Self {
        holders.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        Self { total_holders, holders }
    }

    pub fn analyze(&self) -> HolderAnalysis {
        HolderAnalysis::of(self)
    }
}

/// Derived holder statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderAnalysis {
    /// Reported total holder count
    pub total_holders: u64,
    /// Number of entries in the holder list
    pub listed_holders: usize,
    /// Share held by the largest holder, 0 when the list is empty
    pub top_holder_percentage: f64,
    /// Share held by the runner-up, if any
    pub second_holder_percentage: Option<f64>,
    /// Quantity value -> number of holders holding exactly that quantity
    pub quantity_distribution: BTreeMap<String, usize>,
    /// True iff every listed holder holds an identical quantity
    pub all_equal: bool,
}

impl HolderAnalysis {
    pub fn of(snapshot: &HolderSnapshot) -> Self {
        let holders = &snapshot.holders;

        let top_holder_percentage = holders.first().map(|h| h.percentage).unwrap_or(0.0);
        let second_holder_percentage = holders.get(1).map(|h| h.percentage);

        let mut quantity_distribution = BTreeMap::new();
        for holder in holders {
            *quantity_distribution
                .entry(holder.quantity.to_string())
                .or_insert(0) += 1;
        }

        let all_equal = match holders.split_first() {
            Some((first, rest)) => rest.iter().all(|h| h.quantity == first.quantity),
            None => false,
        };

        Self {
            total_holders: snapshot.total_holders,
            listed_holders: holders.len(),
            top_holder_percentage,
            second_holder_percentage,
            quantity_distribution,
            all_equal,
        }
    }

    /// Percentage-point gap between the two largest holders
    pub fn top_gap(&self) -> Option<f64> {
        self.second_holder_percentage
            .map(|second| self.top_holder_percentage - second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(quantity: f64, percentage: f64) -> HolderEntry {
        HolderEntry {
            address: format!("addr-{}", percentage),
            quantity,
            percentage,
        }
    }

    #[test]
    fn test_new_sorts_descending() {
        let snap = HolderSnapshot::new(3, vec![holder(1.0, 10.0), holder(5.0, 60.0), holder(3.0, 30.0)]);
        let pcts: Vec<f64> = snap.holders.iter().map(|h| h.percentage).collect();
        assert_eq!(pcts, vec![60.0, 30.0, 10.0]);
    }

    #[test]
    fn test_top_holder_is_first_entry() {
        let snap = HolderSnapshot::new(2, vec![holder(9.0, 72.5), holder(1.0, 27.5)]);
        let analysis = snap.analyze();
        assert_eq!(analysis.top_holder_percentage, 72.5);
        assert_eq!(analysis.second_holder_percentage, Some(27.5));
        assert_eq!(analysis.top_gap(), Some(45.0));
    }

    #[test]
    fn test_empty_snapshot_sentinels() {
        let analysis = HolderSnapshot::new(0, Vec::new()).analyze();
        assert_eq!(analysis.top_holder_percentage, 0.0);
        assert_eq!(analysis.second_holder_percentage, None);
        assert_eq!(analysis.top_gap(), None);
        assert!(analysis.quantity_distribution.is_empty());
        assert!(!analysis.all_equal);
    }

    #[test]
    fn test_all_equal_quantities() {
        let holders = (0..25).map(|_| holder(100.0, 4.0)).collect();
        let analysis = HolderSnapshot::new(25, holders).analyze();
        assert!(analysis.all_equal);
        assert_eq!(analysis.quantity_distribution.len(), 1);
        assert_eq!(analysis.quantity_distribution.get("100"), Some(&25));
    }

    #[test]
    fn test_quantity_distribution_counts() {
        let snap = HolderSnapshot::new(
            4,
            vec![holder(50.0, 50.0), holder(20.0, 20.0), holder(15.0, 15.0), holder(15.0, 15.0)],
        );
        let analysis = snap.analyze();
        assert!(!analysis.all_equal);
        assert_eq!(analysis.quantity_distribution.get("15"), Some(&2));
        assert_eq!(analysis.quantity_distribution.get("50"), Some(&1));
        assert_eq!(analysis.listed_holders, 4);
    }
}
