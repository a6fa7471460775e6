//! Source/target tree merge.
//!
//! A merge walks the ordered key union of a source object and a target object:
//!
//! * a key only the source has is translated as a whole subtree;
//! * a key both sides hold as plain objects is merged recursively;
//! * anything else keeps the target's value verbatim.
//!
//! Arrays are never diffed element by element. Keys only the target has are
//! never dropped.

use anyhow::Result;
use futures_core::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::{
    translate::{TranslationProvider, ValueTranslator},
    value::{JsonObject, as_plain_object, join_key_path, ordered_key_union},
};

/// Fills the gaps of a target tree from a source tree.
#[derive(Debug, Clone)]
pub struct TreeMerger<P> {
    translator: ValueTranslator<P>,
}

impl<P: TranslationProvider> TreeMerger<P> {
    pub fn new(translator: ValueTranslator<P>) -> Self {
        Self { translator }
    }

    /// Build a fresh tree holding every key path of `source` and of `target`.
    ///
    /// A missing target behaves exactly like an empty object. Neither input is
    /// modified. Any failed leaf translation fails the whole merge.
    pub async fn merge(
        &self,
        source: &JsonObject,
        target: Option<&JsonObject>,
        target_lang: &str,
    ) -> Result<JsonObject> {
        let empty = JsonObject::new();
        self.merge_objects(source, target.unwrap_or(&empty), target_lang).await
    }

    fn merge_objects<'a>(
        &'a self,
        source: &'a JsonObject,
        target: &'a JsonObject,
        target_lang: &'a str,
    ) -> BoxFuture<'a, Result<JsonObject>> {
        Box::pin(async move {
            let mut merged = JsonObject::with_capacity(source.len().max(target.len()));
            for key in ordered_key_union(source, target) {
                let value = match (source.get(key), target.get(key)) {
                    (Some(source_value), None) => {
                        debug!(key, target_lang, "translating missing subtree");
                        self.translator.translate(source_value, target_lang).await?
                    }
                    (Some(source_value), Some(target_value)) => {
                        match (as_plain_object(source_value), as_plain_object(target_value)) {
                            (Some(source_map), Some(target_map)) => Value::Object(
                                self.merge_objects(source_map, target_map, target_lang).await?,
                            ),
                            _ => target_value.clone(),
                        }
                    }
                    (None, Some(target_value)) => target_value.clone(),
                    (None, None) => continue,
                };
                merged.insert(key.to_string(), value);
            }
            Ok(merged)
        })
    }
}

/// Dotted key paths that a merge would fill by translation, in merge order.
///
/// Paths stop at the first missing key: a whole missing subtree is reported
/// once, at its root.
pub fn missing_key_paths(source: &JsonObject, target: Option<&JsonObject>) -> Vec<String> {
    let empty = JsonObject::new();
    let mut paths = Vec::new();
    collect_missing(source, target.unwrap_or(&empty), "", &mut paths);
    paths
}

fn collect_missing(source: &JsonObject, target: &JsonObject, prefix: &str, paths: &mut Vec<String>) {
    for (key, source_value) in source {
        match target.get(key) {
            None => paths.push(join_key_path(prefix, key)),
            Some(target_value) => {
                if let (Some(source_map), Some(target_map)) =
                    (as_plain_object(source_value), as_plain_object(target_value))
                {
                    collect_missing(source_map, target_map, &join_key_path(prefix, key), paths);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{CoreError, translate::testing::RecordingProvider};

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn keys(map: &JsonObject) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    fn merger(provider: Arc<RecordingProvider>) -> TreeMerger<Arc<RecordingProvider>> {
        TreeMerger::new(ValueTranslator::new(provider))
    }

    /// Answers from a fixed phrase book.
    struct PhraseBook;

    #[async_trait]
    impl TranslationProvider for PhraseBook {
        async fn translate(&self, text: &str, _target: &str, _source: &str) -> Result<String> {
            Ok(match text {
                "Hello" => "Bonjour".to_string(),
                other => format!("<{other}>"),
            })
        }
    }

    #[tokio::test]
    async fn fills_missing_keys_and_keeps_existing_translations() {
        let merger = TreeMerger::new(ValueTranslator::new(PhraseBook));
        let source = object(json!({"a": "Hello", "b": {"c": "World"}}));
        let target = object(json!({"b": {"c": "Monde"}, "d": 1}));

        let merged = merger.merge(&source, Some(&target), "fr").await.unwrap();

        assert_eq!(Value::Object(merged.clone()), json!({"a": "Bonjour", "b": {"c": "Monde"}, "d": 1}));
        assert_eq!(keys(&merged), vec!["a", "b", "d"]);
    }

    #[tokio::test]
    async fn new_subtree_is_translated_whole_with_non_strings_copied() {
        let merger = TreeMerger::new(ValueTranslator::new(PhraseBook));
        let source = object(json!({"x": {"y": "Hi", "z": 5}}));

        let merged = merger.merge(&source, Some(&JsonObject::new()), "fr").await.unwrap();
        assert_eq!(Value::Object(merged), json!({"x": {"y": "<Hi>", "z": 5}}));
    }

    #[tokio::test]
    async fn missing_target_behaves_like_empty_target() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({"greeting": "Hi", "menu": {"open": "Open", "items": ["a", 1]}}));

        let absent = merger.merge(&source, None, "es").await.unwrap();
        let empty = merger.merge(&source, Some(&JsonObject::new()), "es").await.unwrap();

        assert_eq!(Value::Object(absent.clone()), Value::Object(empty));
        assert_eq!(
            Value::Object(absent),
            json!({"greeting": "es:Hi", "menu": {"open": "es:Open", "items": ["es:a", 1]}})
        );
    }

    #[tokio::test]
    async fn target_wins_on_type_mismatch_and_arrays() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({
            "label": "Name",
            "nested": {"a": "A"},
            "list": ["one", "two", "three"],
            "flag": "yes"
        }));
        let target = object(json!({
            "label": 7,
            "nested": "flattened by a translator",
            "list": ["uno"],
            "flag": null
        }));

        let merged = merger.merge(&source, Some(&target), "es").await.unwrap();

        assert_eq!(Value::Object(merged), Value::Object(target));
        assert!(provider.calls().is_empty(), "no leaf should be sent: {:?}", provider.calls());
    }

    #[tokio::test]
    async fn object_in_source_does_not_merge_into_array_in_target() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({"k": {"inner": "x"}}));
        let target = object(json!({"k": [{"inner": "y"}]}));

        let merged = merger.merge(&source, Some(&target), "ja").await.unwrap();
        assert_eq!(Value::Object(merged), json!({"k": [{"inner": "y"}]}));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn target_only_keys_survive_at_every_depth() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({"common": {"ok": "OK"}}));
        let target = object(json!({"common": {"ok": "Vale", "legacy": "Antiguo"}, "notes": {"x": 1}}));

        let merged = merger.merge(&source, Some(&target), "es").await.unwrap();

        assert_eq!(Value::Object(merged.clone()), Value::Object(target));
        assert_eq!(keys(&merged), vec!["common", "notes"]);
        assert_eq!(keys(merged["common"].as_object().unwrap()), vec!["ok", "legacy"]);
    }

    #[tokio::test]
    async fn key_order_is_source_order_then_target_only_order() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({"c": "C", "a": "A", "b": {"z": "Z", "y": "Y"}}));
        let target = object(json!({"x": 0, "b": {"w": 1, "y": "why"}, "a": "ah", "e": 2}));

        let merged = merger.merge(&source, Some(&target), "vi").await.unwrap();

        assert_eq!(keys(&merged), vec!["c", "a", "b", "x", "e"]);
        assert_eq!(keys(merged["b"].as_object().unwrap()), vec!["z", "y", "w"]);
        assert_eq!(merged["b"]["y"], json!("why"));
        assert_eq!(provider.texts(), vec!["C", "Z"]);
    }

    #[tokio::test]
    async fn merging_again_changes_nothing_and_translates_nothing() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({
            "title": "Title",
            "group": {"one": "One", "deep": {"two": "Two"}, "n": 3},
            "list": ["a", "b"]
        }));
        let target = object(json!({"group": {"one": "Uno"}, "extra": true}));

        let first = merger.merge(&source, Some(&target), "es").await.unwrap();
        let calls_after_first = provider.calls().len();
        let second = merger.merge(&source, Some(&first), "es").await.unwrap();

        assert_eq!(Value::Object(first.clone()), Value::Object(second.clone()));
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(provider.calls().len(), calls_after_first);
    }

    #[tokio::test]
    async fn every_source_path_reaches_the_merged_tree() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider.clone());
        let source = object(json!({"a": {"b": {"c": "C"}, "d": "D"}, "e": [1, "two"]}));
        let target = object(json!({"a": {"b": {}}}));

        let merged = merger.merge(&source, Some(&target), "zh").await.unwrap();

        assert_eq!(merged["a"]["b"]["c"], json!("zh:C"));
        assert_eq!(merged["a"]["d"], json!("zh:D"));
        assert_eq!(merged["e"], json!([1, "zh:two"]));
    }

    #[tokio::test]
    async fn one_failed_leaf_fails_the_whole_merge() {
        let provider = Arc::new(RecordingProvider::failing_on("Broken"));
        let merger = merger(provider.clone());
        let source = object(json!({"ok": "Fine", "nested": {"bad": "Broken"}, "later": "Later"}));

        let err = merger.merge(&source, None, "es").await.unwrap_err();

        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::Provider { .. })));
        // keys after the failure are never attempted
        assert_eq!(provider.texts(), vec!["Fine", "Broken"]);
    }

    #[tokio::test]
    async fn inputs_are_left_untouched() {
        let provider = Arc::new(RecordingProvider::default());
        let merger = merger(provider);
        let source = object(json!({"a": "A", "b": {"c": "C"}}));
        let target = object(json!({"b": {}}));
        let (source_before, target_before) = (source.clone(), target.clone());

        merger.merge(&source, Some(&target), "ja").await.unwrap();

        assert_eq!(source, source_before);
        assert_eq!(target, target_before);
    }

    /// Tracks how many translations are running at once.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TranslationProvider for InFlight {
        async fn translate(&self, text: &str, _target: &str, _source: &str) -> Result<String> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn leaves_are_translated_one_at_a_time() {
        let provider = Arc::new(InFlight::default());
        let merger = TreeMerger::new(ValueTranslator::new(provider.clone()));
        let source = object(json!({"a": "a", "b": ["b", "c"], "d": {"e": "e", "f": {"g": "g"}}}));

        let merged = merger.merge(&source, None, "es").await.unwrap();

        assert_eq!(merged["d"]["f"]["g"], json!("G"));
        assert_eq!(provider.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_paths_stop_at_the_first_missing_key() {
        let source = object(json!({
            "a": "A",
            "b": {"c": "C", "d": {"e": "E"}},
            "f": {"g": "G"},
            "h": [1, 2]
        }));
        let target = object(json!({"b": {"c": "ce"}, "f": "flat", "h": []}));

        assert_eq!(missing_key_paths(&source, Some(&target)), vec!["a", "b.d"]);
        assert_eq!(missing_key_paths(&source, None), vec!["a", "b", "f", "h"]);
        assert!(missing_key_paths(&source, Some(&source)).is_empty());
    }
}
