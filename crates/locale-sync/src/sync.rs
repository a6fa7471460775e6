//! Drives merges across every configured (namespace, target language) pair.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::{
    config::{LanguageTag, NamespaceConfig, SyncConfig},
    error::{CoreError, ErrorClass},
    merge::{TreeMerger, missing_key_paths},
    paths::Layout,
    store::TreeStore,
    translate::{TranslationProvider, ValueTranslator},
    value::JsonObject,
};

/// Which pairs to visit and whether to persist results.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Merge without writing any file.
    pub dry_run: bool,
    /// Namespace names to restrict to; empty means all.
    pub namespaces: Vec<String>,
    /// Target language tags to restrict to; empty means all.
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    Written,
    DryRun,
    WriteFailed(String),
}

/// Outcome for one (namespace, language) pair.
#[derive(Debug, Clone)]
pub struct PairReport {
    pub namespace: String,
    pub language: LanguageTag,
    pub path: PathBuf,
    /// Key paths that were missing from the target before this run.
    pub missing: Vec<String>,
    pub status: PairStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub pairs: Vec<PairReport>,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.status == PairStatus::Written).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|pair| matches!(pair.status, PairStatus::WriteFailed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn added(&self) -> usize {
        self.pairs.iter().map(|pair| pair.missing.len()).sum()
    }
}

/// Keeps every target tree in step with its source tree.
///
/// Pairs are processed one after another, language by language, and within a
/// language in namespace order. A failed translation stops the run before the
/// affected file is written; a failed write is recorded and the run moves on.
pub struct Synchronizer<'a, P> {
    config: &'a SyncConfig,
    layout: &'a Layout,
    store: TreeStore,
    merger: TreeMerger<P>,
}

impl<'a, P: TranslationProvider> Synchronizer<'a, P> {
    pub fn new(config: &'a SyncConfig, layout: &'a Layout, provider: P) -> Self {
        let translator = ValueTranslator::new(provider)
            .with_source_lang(config.source_language.primary_subtag());
        Self { config, layout, store: TreeStore::new(), merger: TreeMerger::new(translator) }
    }

    pub async fn run(&self, options: &SyncOptions) -> Result<SyncReport> {
        self.run_with(options, |_| {}).await
    }

    /// Like [`Synchronizer::run`], but hands every finished pair to `on_pair`
    /// as soon as it is done, so pairs completed before an abort are still seen.
    pub async fn run_with<F>(&self, options: &SyncOptions, mut on_pair: F) -> Result<SyncReport>
    where
        F: FnMut(&PairReport),
    {
        let namespaces = self.config.select_namespaces(&options.namespaces)?;
        let targets = self.config.select_targets(&options.languages)?;
        let sources = load_sources(&self.store, self.layout, self.config, &namespaces).await?;
        let mut report = SyncReport::default();

        for tag in &targets {
            for (namespace, source) in namespaces.iter().zip(&sources) {
                let pair = self.sync_pair(namespace, tag, source, options.dry_run).await?;
                on_pair(&pair);
                report.pairs.push(pair);
            }
        }

        info!(
            pairs = report.pairs.len(),
            written = report.written(),
            added = report.added(),
            "sync finished"
        );
        Ok(report)
    }

    async fn sync_pair(
        &self,
        namespace: &NamespaceConfig,
        tag: &LanguageTag,
        source: &JsonObject,
        dry_run: bool,
    ) -> Result<PairReport> {
        let path = self.layout.tree_path(namespace, tag);
        let target = self.store.read(&path).await;
        let missing = missing_key_paths(source, target.as_ref());
        info!(
            namespace = %namespace.name,
            language = %tag,
            missing = missing.len(),
            "merging target tree"
        );

        let merged = self
            .merger
            .merge(source, target.as_ref(), tag.primary_subtag())
            .await
            .inspect_err(|err| {
                error!(namespace = %namespace.name, language = %tag, error = %err, "merge aborted");
            })?;

        let status = if dry_run {
            PairStatus::DryRun
        } else {
            match self.store.write(&path, &merged).await {
                Ok(()) => PairStatus::Written,
                Err(err) => match err.downcast_ref::<CoreError>().map(CoreError::class) {
                    Some(ErrorClass::Write) => {
                        error!(path = %path.display(), error = ?err, "failed to write target tree");
                        PairStatus::WriteFailed(format!("{err:#}"))
                    }
                    _ => return Err(err),
                },
            }
        };

        Ok(PairReport { namespace: namespace.name.clone(), language: tag.clone(), path, missing, status })
    }
}

/// Missing key paths for every selected pair, without translating anything.
///
/// Pairs come back in the same order [`Synchronizer::run`] visits them.
pub async fn check(
    config: &SyncConfig,
    layout: &Layout,
    options: &SyncOptions,
) -> Result<Vec<PairReport>> {
    let store = TreeStore::new();
    let namespaces = config.select_namespaces(&options.namespaces)?;
    let targets = config.select_targets(&options.languages)?;
    let sources = load_sources(&store, layout, config, &namespaces).await?;
    let mut pairs = Vec::new();

    for tag in &targets {
        for (namespace, source) in namespaces.iter().zip(&sources) {
            let path = layout.tree_path(namespace, tag);
            let target = store.read(&path).await;
            let missing = missing_key_paths(source, target.as_ref());
            pairs.push(PairReport {
                namespace: namespace.name.clone(),
                language: (*tag).clone(),
                path,
                missing,
                status: PairStatus::DryRun,
            });
        }
    }
    Ok(pairs)
}

/// Source trees of `namespaces`, in the same order. Any missing one is fatal.
async fn load_sources(
    store: &TreeStore,
    layout: &Layout,
    config: &SyncConfig,
    namespaces: &[&NamespaceConfig],
) -> Result<Vec<JsonObject>> {
    let mut sources = Vec::with_capacity(namespaces.len());
    for namespace in namespaces {
        let path = layout.tree_path(namespace, &config.source_language);
        match store.read(&path).await {
            Some(source) => sources.push(source),
            None => {
                warn!(namespace = %namespace.name, path = %path.display(), "source tree unavailable");
                return Err(CoreError::SourceTreeUnavailable { path }.into());
            }
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use serde_json::{Value, json};
    use tempfile::tempdir;

    use super::*;
    use crate::translate::testing::RecordingProvider;

    fn config() -> SyncConfig {
        SyncConfig {
            source_language: LanguageTag::parse("en-US").unwrap(),
            target_languages: vec![
                LanguageTag::parse("es-ES").unwrap(),
                LanguageTag::parse("ja-JP").unwrap(),
            ],
            namespaces: vec![NamespaceConfig::new("main", "locales/{lang}.json")],
            ..SyncConfig::default()
        }
    }

    fn read_json(path: &std::path::Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn passes_primary_subtags_to_the_provider() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        fs::create_dir_all(dir.path().join("locales")).unwrap();
        fs::write(dir.path().join("locales/en-US.json"), r#"{"hi": "Hi"}"#).unwrap();

        let provider = Arc::new(RecordingProvider::default());
        let config = config();
        let sync = Synchronizer::new(&config, &layout, provider.clone());
        let report = sync.run(&SyncOptions::default()).await.unwrap();

        assert_eq!(report.written(), 2);
        assert_eq!(
            provider.calls(),
            vec![
                ("Hi".to_string(), "es".to_string(), "en".to_string()),
                ("Hi".to_string(), "ja".to_string(), "en".to_string()),
            ]
        );
        assert_eq!(read_json(&dir.path().join("locales/ja-JP.json")), json!({"hi": "ja:Hi"}));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        fs::create_dir_all(dir.path().join("locales")).unwrap();
        fs::write(dir.path().join("locales/en-US.json"), r#"{"hi": "Hi"}"#).unwrap();

        let config = config();
        let sync = Synchronizer::new(&config, &layout, RecordingProvider::default());
        let options = SyncOptions { dry_run: true, ..SyncOptions::default() };
        let report = sync.run(&options).await.unwrap();

        assert!(report.pairs.iter().all(|pair| pair.status == PairStatus::DryRun));
        assert_eq!(report.added(), 2);
        assert!(!dir.path().join("locales/es-ES.json").exists());
    }

    #[tokio::test]
    async fn missing_source_tree_is_fatal() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        let config = config();
        let sync = Synchronizer::new(&config, &layout, RecordingProvider::default());

        let err = sync.run(&SyncOptions::default()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::SourceTreeUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn check_lists_missing_paths_per_pair() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        fs::create_dir_all(dir.path().join("locales")).unwrap();
        fs::write(dir.path().join("locales/en-US.json"), r#"{"a": "A", "b": {"c": "C"}}"#).unwrap();
        fs::write(dir.path().join("locales/es-ES.json"), r#"{"a": "Á", "b": {}}"#).unwrap();

        let config = config();
        let pairs = check(&config, &layout, &SyncOptions::default()).await.unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].language.as_str(), "es-ES");
        assert_eq!(pairs[0].missing, vec!["b.c".to_string()]);
        assert_eq!(pairs[1].missing, vec!["a".to_string(), "b".to_string()]);
    }
}
