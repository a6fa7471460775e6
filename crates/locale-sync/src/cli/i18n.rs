use std::{env, path::Path, sync::OnceLock};

use crate::CoreError;
use anyhow::Error as AnyhowError;
use clap::{Command, builder::Arg};
use locale_config::Locale;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    English,
    SimplifiedChinese,
    Japanese,
}

const PLACEHOLDER_PREFIX: &str = "i18n:";
const LANG_ENV_KEY: &str = "LOCALE_SYNC_LANG";

static LANGUAGE: OnceLock<Language> = OnceLock::new();
static MESSAGES: OnceLock<Messages> = OnceLock::new();

fn interpolate(template: &str, values: &[(&str, String)]) -> String {
    let mut result = template.to_owned();
    for (key, value) in values {
        let placeholder = format!("{{{key}}}");
        result = result.replace(&placeholder, value);
    }
    result
}

pub fn language() -> Language {
    *LANGUAGE.get_or_init(detect_language)
}

pub fn messages() -> &'static Messages {
    MESSAGES.get_or_init(|| Messages { language: language() })
}

fn detect_language() -> Language {
    if let Ok(value) = env::var(LANG_ENV_KEY) {
        if let Some(lang) = parse_language_tag(&value) {
            return lang;
        }
    }

    let locale = Locale::user_default();
    for (_category, tag) in locale.tags() {
        if let Some(lang) = parse_language_tag(tag.as_ref()) {
            return lang;
        }
    }

    Language::English
}

fn parse_language_tag(raw: &str) -> Option<Language> {
    let mut normalized = raw
        .trim()
        .split('=')
        .next_back()
        .unwrap_or(raw)
        .replace('_', "-")
        .to_ascii_lowercase();

    if let Some(idx) = normalized.find('@') {
        normalized.truncate(idx);
    }
    if let Some(idx) = normalized.find('.') {
        normalized.truncate(idx);
    }

    if normalized.is_empty() {
        return None;
    }

    if normalized == "ja" || normalized.starts_with("ja-") {
        return Some(Language::Japanese);
    }

    if normalized == "zh" || normalized.starts_with("zh-") {
        return Some(Language::SimplifiedChinese);
    }

    if normalized.starts_with("en") {
        return Some(Language::English);
    }

    None
}

pub struct Messages {
    language: Language,
}

impl Messages {
    pub fn error_prefix(&self) -> &'static str {
        self.text("errors.prefix")
    }

    pub fn config_created(&self, path: &Path) -> String {
        interpolate(self.text("init.created"), &[("path", path.display().to_string())])
    }

    pub fn config_exists(&self, path: &Path) -> String {
        interpolate(self.text("init.exists"), &[("path", path.display().to_string())])
    }

    pub fn config_write_failed(&self, path: &Path) -> String {
        interpolate(self.text("errors.config_write_failed"), &[("path", path.display().to_string())])
    }

    pub fn tree_updated(&self, path: &Path) -> String {
        interpolate(self.text("sync.updated"), &[("path", path.display().to_string())])
    }

    pub fn tree_would_update(&self, path: &Path, added: usize) -> String {
        interpolate(
            self.text("sync.would_update"),
            &[("path", path.display().to_string()), ("count", added.to_string())],
        )
    }

    pub fn tree_write_failed(&self, path: &Path, error: &str) -> String {
        interpolate(
            self.text("sync.write_failed"),
            &[("path", path.display().to_string()), ("error", error.to_string())],
        )
    }

    pub fn sync_summary(&self, written: usize, added: usize) -> String {
        interpolate(
            self.text("sync.summary"),
            &[("written", written.to_string()), ("added", added.to_string())],
        )
    }

    pub fn sync_failures(&self, count: usize) -> String {
        interpolate(self.text("sync.failures"), &[("count", count.to_string())])
    }

    pub fn check_pair_missing(&self, path: &Path, count: usize) -> String {
        interpolate(
            self.text("check.pair_missing"),
            &[("path", path.display().to_string()), ("count", count.to_string())],
        )
    }

    pub fn check_up_to_date(&self) -> &'static str {
        self.text("check.up_to_date")
    }

    pub fn check_summary(&self, total: usize, files: usize) -> String {
        interpolate(
            self.text("check.summary"),
            &[("total", total.to_string()), ("files", files.to_string())],
        )
    }

    pub fn render_core_error(&self, err: &CoreError) -> String {
        let template = self.text(err.message_key());
        interpolate(template, &err.placeholders())
    }

    pub fn render_anyhow(&self, err: &AnyhowError) -> String {
        if let Some(core) = err.downcast_ref::<CoreError>() {
            return self.render_core_error(core);
        }
        for cause in err.chain().skip(1) {
            if let Some(core) = cause.downcast_ref::<CoreError>() {
                return self.render_core_error(core);
            }
        }
        err.to_string()
    }

    fn text(&self, key: &str) -> &'static str {
        match self.language {
            Language::English => english_text(key),
            Language::SimplifiedChinese => zh_hans_text(key).unwrap_or_else(|| english_text(key)),
            Language::Japanese => ja_text(key).unwrap_or_else(|| english_text(key)),
        }
    }

    pub fn translate_placeholder(&self, candidate: &str) -> Option<&'static str> {
        let key = candidate.trim().strip_prefix(PLACEHOLDER_PREFIX)?;
        Some(self.text(key))
    }
}

pub fn localize_command(mut command: Command, messages: &Messages) -> Command {
    if let Some(about) = command
        .get_about()
        .and_then(|styled| messages.translate_placeholder(&styled.to_string()))
    {
        command = command.about(about);
    }
    if let Some(long_about) = command
        .get_long_about()
        .and_then(|styled| messages.translate_placeholder(&styled.to_string()))
    {
        command = command.long_about(long_about);
    }

    command = command.mut_args(|arg| localize_arg(arg, messages));
    command = command.mut_subcommands(|sub| localize_command(sub, messages));
    command
}

fn localize_arg(mut arg: Arg, messages: &Messages) -> Arg {
    if let Some(help) = arg
        .get_help()
        .and_then(|styled| messages.translate_placeholder(&styled.to_string()))
    {
        arg = arg.help(help);
    }

    if let Some(long_help) = arg
        .get_long_help()
        .and_then(|styled| messages.translate_placeholder(&styled.to_string()))
    {
        arg = arg.long_help(long_help);
    }

    arg
}

fn english_text(key: &str) -> &'static str {
    match key {
        "cli.about" => "Keep localization JSON trees in sync with the source language.",
        "cli.version_flag_help" => "Show version information and exit.",
        "cli.root_help" => "Workspace root that namespace paths are relative to.",
        "cli.config_help" => "Config file to use instead of <root>/locale-sync.toml.",
        "cli.verbose_help" => "Log progress to stderr (RUST_LOG takes precedence).",
        "cli.log_dir_help" => "Also write JSON logs to a daily rolling file in this directory.",
        "command.init.about" => "Write a sample locale-sync.toml with the default settings.",
        "command.sync.about" => "Translate missing keys into every target tree and write them.",
        "command.check.about" => "List key paths missing from target trees without translating.",
        "args.sync.api_key" => "Translation API key (overrides the environment and env file).",
        "args.sync.dry_run" => "Merge and report without writing any file.",
        "args.filter.namespace" => "Only process this namespace (repeatable).",
        "args.filter.lang" => "Only process this target language tag (repeatable).",
        "errors.prefix" => "error:",
        "errors.config_write_failed" => "Failed to write config file {path}",
        "init.created" => "Wrote sample config to {path}",
        "init.exists" => "Config already exists at {path}",
        "sync.updated" => "Updated {path}",
        "sync.would_update" => "Would update {path} ({count} new key paths)",
        "sync.write_failed" => "Failed to write {path}: {error}",
        "sync.summary" => "{written} file(s) updated, {added} key path(s) added.",
        "sync.failures" => "{count} file(s) could not be written.",
        "check.pair_missing" => "{path}: {count} missing key path(s)",
        "check.up_to_date" => "All target trees are up to date.",
        "check.summary" => "{total} missing key path(s) across {files} file(s).",
        "core.config_read_failed" => "Failed to read config file {path}: {error}",
        "core.config_parse_failed" => "Failed to parse config file {path}: {error}",
        "core.config_serialise_failed" => "Failed to serialise config: {error}",
        "core.invalid_language_tag" => "Invalid language tag '{tag}'.",
        "core.no_target_languages" => "At least one target language is required.",
        "core.target_is_source" => "Target language '{tag}' is the source language.",
        "core.duplicate_target_language" => "Target language '{tag}' is listed more than once.",
        "core.namespace_name_empty" => "Namespace name cannot be empty.",
        "core.duplicate_namespace" => "Namespace '{name}' is listed more than once.",
        "core.path_template_placeholder" => {
            "Path template '{template}' of namespace '{name}' must contain {lang}."
        }
        "core.provider_endpoint_invalid" => "Invalid translation endpoint '{endpoint}': {error}",
        "core.provider_timeout_zero" => "Translation timeout must be greater than zero.",
        "core.credential_missing" => {
            "Translation API key not found. Set {env_key} or add it to {env_file}."
        }
        "core.env_file_read_failed" => "Failed to read env file {path}: {error}",
        "core.unknown_namespace" => "Namespace '{name}' is not configured.",
        "core.unknown_language" => "'{tag}' is not a configured target language.",
        "core.provider_failed" => "Translation failed: {error}",
        "core.source_tree_unavailable" => "Source tree {path} is missing or unreadable.",
        "core.create_dir_failed" => "Failed to create directory {path}: {error}",
        "core.serialise_tree_failed" => "Failed to serialise tree for {path}: {error}",
        "core.write_tree_failed" => "Failed to write {path}: {error}",
        _ => "<missing translation>",
    }
}

fn zh_hans_text(key: &str) -> Option<&'static str> {
    let text = match key {
        "cli.about" => "让本地化 JSON 文件与源语言保持同步。",
        "cli.version_flag_help" => "显示版本信息并退出。",
        "cli.root_help" => "工作区根目录，命名空间路径相对于此目录。",
        "cli.config_help" => "使用指定的配置文件代替 <root>/locale-sync.toml。",
        "cli.verbose_help" => "在标准错误输出中显示进度（RUST_LOG 优先）。",
        "cli.log_dir_help" => "同时将 JSON 日志按天写入此目录。",
        "command.init.about" => "生成带有默认设置的 locale-sync.toml 示例。",
        "command.sync.about" => "翻译缺失的键并写入所有目标语言文件。",
        "command.check.about" => "列出目标语言文件中缺失的键路径（不进行翻译）。",
        "args.sync.api_key" => "翻译 API 密钥（优先于环境变量和 env 文件）。",
        "args.sync.dry_run" => "只合并并报告，不写入任何文件。",
        "args.filter.namespace" => "只处理该命名空间（可重复）。",
        "args.filter.lang" => "只处理该目标语言标签（可重复）。",
        "errors.prefix" => "错误：",
        "errors.config_write_failed" => "无法写入配置文件 {path}",
        "init.created" => "已写入示例配置：{path}",
        "init.exists" => "配置文件已存在：{path}",
        "sync.updated" => "已更新 {path}",
        "sync.would_update" => "将更新 {path}（新增 {count} 个键路径）",
        "sync.write_failed" => "无法写入 {path}：{error}",
        "sync.summary" => "已更新 {written} 个文件，新增 {added} 个键路径。",
        "sync.failures" => "{count} 个文件写入失败。",
        "check.pair_missing" => "{path}：缺失 {count} 个键路径",
        "check.up_to_date" => "所有目标语言文件均已同步。",
        "check.summary" => "共 {files} 个文件缺失 {total} 个键路径。",
        "core.invalid_language_tag" => "无效的语言标签 '{tag}'。",
        "core.no_target_languages" => "至少需要一个目标语言。",
        "core.target_is_source" => "目标语言 '{tag}' 与源语言相同。",
        "core.credential_missing" => "未找到翻译 API 密钥。请设置 {env_key} 或将其写入 {env_file}。",
        "core.unknown_namespace" => "未配置命名空间 '{name}'。",
        "core.unknown_language" => "'{tag}' 不是已配置的目标语言。",
        "core.provider_failed" => "翻译失败：{error}",
        "core.source_tree_unavailable" => "源语言文件 {path} 不存在或无法读取。",
        "core.write_tree_failed" => "无法写入 {path}：{error}",
        _ => return None,
    };
    Some(text)
}

fn ja_text(key: &str) -> Option<&'static str> {
    let text = match key {
        "cli.about" => "ローカライズ用 JSON をソース言語と同期します。",
        "cli.version_flag_help" => "バージョン情報を表示して終了します。",
        "cli.root_help" => "名前空間のパスの基準となるワークスペースのルート。",
        "cli.config_help" => "<root>/locale-sync.toml の代わりに使う設定ファイル。",
        "cli.verbose_help" => "進捗を標準エラーに出力します（RUST_LOG が優先）。",
        "cli.log_dir_help" => "JSON ログを日次ローテーションでこのディレクトリにも書き込みます。",
        "command.init.about" => "既定値で locale-sync.toml のサンプルを作成します。",
        "command.sync.about" => "不足しているキーを翻訳し、すべての対象ファイルに書き込みます。",
        "command.check.about" => "翻訳せずに、対象ファイルで不足しているキーパスを一覧表示します。",
        "args.sync.api_key" => "翻訳 API キー（環境変数と env ファイルより優先）。",
        "args.sync.dry_run" => "マージと報告のみ行い、ファイルは書き込みません。",
        "args.filter.namespace" => "この名前空間のみ処理します（複数指定可）。",
        "args.filter.lang" => "この対象言語タグのみ処理します（複数指定可）。",
        "errors.prefix" => "エラー:",
        "init.created" => "サンプル設定を書き込みました: {path}",
        "init.exists" => "設定ファイルは既に存在します: {path}",
        "sync.updated" => "{path} を更新しました",
        "sync.would_update" => "{path} を更新予定（新しいキーパス {count} 件）",
        "sync.write_failed" => "{path} に書き込めませんでした: {error}",
        "sync.summary" => "{written} 件のファイルを更新し、{added} 件のキーパスを追加しました。",
        "sync.failures" => "{count} 件のファイルに書き込めませんでした。",
        "check.pair_missing" => "{path}: 不足しているキーパス {count} 件",
        "check.up_to_date" => "すべての対象ファイルは最新です。",
        "check.summary" => "{files} 件のファイルで合計 {total} 件のキーパスが不足しています。",
        "core.credential_missing" => {
            "翻訳 API キーが見つかりません。{env_key} を設定するか {env_file} に追加してください。"
        }
        "core.provider_failed" => "翻訳に失敗しました: {error}",
        "core.source_tree_unavailable" => "ソースファイル {path} が存在しないか読み込めません。",
        _ => return None,
    };
    Some(text)
}
