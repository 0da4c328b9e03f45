use std::collections::HashMap;

use crate::models::{DerivedRecord, GroupKey, GroupSummary, GroupValue, Summary};

/// Running totals for one grouping value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupBucket {
    pub count: usize,
    pub pass_count: usize,
    pub score_sum: f64,
}

impl GroupBucket {
    fn absorb(mut self, derived: &DerivedRecord) -> Self {
        self.count += 1;
        if derived.record.is_pass() {
            self.pass_count += 1;
        }
        self.score_sum += derived.record.score;
        self
    }

    pub fn finalize(&self) -> Summary {
        Summary {
            total: self.count,
            pass_count: self.pass_count,
            pass_rate: percentage(self.pass_count, self.count),
            mean_score: mean(self.score_sum, self.count),
        }
    }
}

pub fn global_stats(records: &[DerivedRecord]) -> Summary {
    records
        .iter()
        .fold(GroupBucket::default(), GroupBucket::absorb)
        .finalize()
}

/// Buckets records by the value `key` extracts; records without a value are left out.
pub fn group_by(records: &[DerivedRecord], key: GroupKey) -> HashMap<GroupValue, GroupBucket> {
    records
        .iter()
        .filter_map(|derived| key.extract(derived).map(|value| (value, derived)))
        .fold(HashMap::new(), |mut buckets, (value, derived)| {
            let bucket = buckets.entry(value).or_default();
            *bucket = bucket.absorb(derived);
            buckets
        })
}

/// Finalized groups. Age groups come back in ascending age; other keys are
/// ordered by group size, largest first, with no guaranteed order among ties.
pub fn grouped_stats(records: &[DerivedRecord], key: GroupKey) -> Vec<GroupSummary> {
    let mut groups: Vec<GroupSummary> = group_by(records, key)
        .into_iter()
        .map(|(value, bucket)| GroupSummary {
            key: value,
            summary: bucket.finalize(),
        })
        .collect();

    if key.is_ordinal() {
        groups.sort_by(|a, b| a.key.cmp(&b.key));
    } else {
        groups.sort_by(|a, b| b.summary.total.cmp(&a.summary.total));
    }
    groups
}

/// Number of records per decision value, most frequent first.
pub fn decision_distribution(records: &[DerivedRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for derived in records {
        if let Some(decision) = derived.record.decision.as_deref() {
            *counts.entry(decision).or_default() += 1;
        }
    }

    let mut distribution: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(decision, count)| (decision.to_string(), count))
        .collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    distribution
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
