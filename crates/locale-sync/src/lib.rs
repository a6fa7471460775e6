//! Keeps target-language localization trees in sync with a source-language tree.

pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod paths;
pub mod store;
pub mod sync;
pub mod translate;
pub mod value;

pub use config::{LanguageTag, NamespaceConfig, ProviderConfig, SyncConfig};
pub use error::{CoreError, ErrorClass};
pub use merge::{TreeMerger, missing_key_paths};
pub use paths::{Layout, default_root};
pub use store::TreeStore;
pub use sync::{PairReport, PairStatus, SyncOptions, SyncReport, Synchronizer};
pub use translate::{GoogleTranslateProvider, TranslationProvider, ValueTranslator};
pub use value::{JsonObject, ValueKind};

// CLI 模块
#[path = "cli/i18n.rs"]
pub mod cli_i18n;
