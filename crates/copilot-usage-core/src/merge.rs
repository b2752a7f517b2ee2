//! Deduplicated merge of freshly fetched usage records into a stored series.

use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Result of merging a fetched batch into an existing series.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// The existing series, in its original order, followed by every record
    /// from the batch whose key was not already present.
    pub merged: Vec<Value>,
    /// Key values of the appended records, in the order they were appended.
    pub added_keys: Vec<String>,
}

/// Merge `incoming` into `existing`, deduplicating on `key_field`.
///
/// Equality is an exact string match on the key field value. Records already
/// present (including duplicates within `incoming` itself) are skipped
/// silently, so re-running with the same batch adds nothing. An incoming
/// record without a usable key can never be deduplicated on a later run and
/// is dropped with a warning; existing records are carried through untouched
/// regardless of shape.
pub fn merge(existing: Vec<Value>, incoming: Vec<Value>, key_field: &str) -> MergeOutcome {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter_map(|record| record_key(record, key_field))
        .map(str::to_owned)
        .collect();

    let mut merged = existing;
    let mut added_keys = Vec::new();

    for record in incoming {
        let Some(key) = record_key(&record, key_field) else {
            warn!(key_field, "skipping fetched record with no usable key field");
            continue;
        };
        if seen.contains(key) {
            continue;
        }
        let key = key.to_owned();
        seen.insert(key.clone());
        added_keys.push(key);
        merged.push(record);
    }

    MergeOutcome { merged, added_keys }
}

fn record_key<'a>(record: &'a Value, key_field: &str) -> Option<&'a str> {
    record.get(key_field)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(date: &str, suggestions: i64, acceptances: i64) -> Value {
        json!({
            "day": date,
            "total_suggestions_count": suggestions,
            "total_acceptances_count": acceptances,
        })
    }

    fn metric(date: &str) -> Value {
        json!({ "date": date, "total_active_users": 12 })
    }

    #[test]
    fn test_merge_appends_only_new_days() {
        let existing = vec![day("2024-01-01", 10, 4)];
        let incoming = vec![day("2024-01-01", 10, 4), day("2024-01-02", 8, 3)];

        let outcome = merge(existing, incoming, "day");

        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.added_keys, vec!["2024-01-02"]);
    }

    #[test]
    fn test_merge_into_empty_series_adds_everything_in_order() {
        let incoming = vec![metric("2024-03-03"), metric("2024-03-01"), metric("2024-03-02")];

        let outcome = merge(Vec::new(), incoming.clone(), "date");

        assert_eq!(outcome.merged, incoming);
        assert_eq!(
            outcome.added_keys,
            vec!["2024-03-03", "2024-03-01", "2024-03-02"]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let incoming = vec![metric("2024-02-01"), metric("2024-02-02")];

        let first = merge(Vec::new(), incoming.clone(), "date");
        let second = merge(first.merged.clone(), incoming, "date");

        assert_eq!(second.merged, first.merged);
        assert!(second.added_keys.is_empty());
    }

    #[test]
    fn test_merge_preserves_existing_records_and_order() {
        let existing = vec![metric("2024-01-05"), metric("2024-01-02"), metric("2024-01-09")];
        let incoming = vec![metric("2024-01-02"), metric("2024-01-10")];

        let outcome = merge(existing.clone(), incoming, "date");

        // Existing records unchanged and in place, new ones appended after.
        assert_eq!(&outcome.merged[..3], &existing[..]);
        assert_eq!(outcome.merged[3], metric("2024-01-10"));
        assert_eq!(outcome.merged.len(), existing.len() + outcome.added_keys.len());
    }

    #[test]
    fn test_merge_length_invariant_holds() {
        let existing = vec![metric("2024-01-01"), metric("2024-01-02")];
        let incoming = vec![
            metric("2024-01-02"),
            metric("2024-01-03"),
            metric("2024-01-04"),
        ];

        let outcome = merge(existing.clone(), incoming, "date");

        assert_eq!(
            outcome.merged.len(),
            existing.len() + outcome.added_keys.len()
        );
    }

    #[test]
    fn test_merge_skips_duplicate_within_incoming_batch() {
        let incoming = vec![metric("2024-04-01"), metric("2024-04-01")];

        let outcome = merge(Vec::new(), incoming, "date");

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.added_keys, vec!["2024-04-01"]);
    }

    #[test]
    fn test_merge_drops_incoming_record_without_key() {
        let incoming = vec![json!({ "total_active_users": 3 }), metric("2024-05-01")];

        let outcome = merge(Vec::new(), incoming, "date");

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.added_keys, vec!["2024-05-01"]);
    }

    #[test]
    fn test_merge_carries_existing_record_without_key() {
        let existing = vec![json!({ "note": "hand-edited entry" })];
        let incoming = vec![metric("2024-05-01")];

        let outcome = merge(existing, incoming, "date");

        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.merged[0], json!({ "note": "hand-edited entry" }));
    }

    #[test]
    fn test_merge_keys_by_requested_field_only() {
        // A "day"-keyed record offers nothing under "date" and is dropped.
        let incoming = vec![day("2024-06-01", 5, 2)];

        let outcome = merge(Vec::new(), incoming, "date");

        assert!(outcome.merged.is_empty());
        assert!(outcome.added_keys.is_empty());
    }

    #[test]
    fn test_merge_records_pass_through_verbatim() {
        let record = json!({
            "date": "2024-07-01",
            "total_active_users": 40,
            "copilot_ide_code_completions": {
                "editors": [{ "name": "vscode", "models": [] }]
            }
        });

        let outcome = merge(Vec::new(), vec![record.clone()], "date");

        assert_eq!(outcome.merged[0], record);
    }
}
