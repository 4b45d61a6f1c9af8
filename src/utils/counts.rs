use std::collections::HashMap;

/// Occurrence count per label.
pub type LabelCounts = HashMap<String, i64>;

/// Add every count from `source` into `target`, inserting missing labels.
pub fn extend_label_counts(target: &mut LabelCounts, source: &LabelCounts) {
    for (label, count) in source {
        *target.entry(label.clone()).or_insert(0) += count;
    }
}

/// Like [`extend_label_counts`], but leaves both inputs untouched.
pub fn merge_label_counts(a: &LabelCounts, b: &LabelCounts) -> LabelCounts {
    let mut merged = a.clone();
    extend_label_counts(&mut merged, b);
    merged
}
