use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A BCP-47 style language tag such as `en-US` or `zh-CN`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse and validate a tag. Surrounding whitespace is ignored and `_` is
    /// accepted as a subtag separator.
    pub fn parse(raw: &str) -> Result<Self> {
        let tag = LanguageTag(raw.trim().to_string());
        tag.check()?;
        Ok(tag)
    }

    /// Built-in tags that are known to be well formed.
    pub(crate) fn known(raw: &'static str) -> Self {
        LanguageTag(raw.to_string())
    }

    pub(crate) fn trimmed(&self) -> Self {
        LanguageTag(self.0.trim().to_string())
    }

    pub(crate) fn check(&self) -> Result<()> {
        let invalid = || CoreError::InvalidLanguageTag { tag: self.0.clone() };
        let mut subtags = self.0.split(['-', '_']);
        let primary = subtags.next().unwrap_or_default();
        if !(2..=8).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid().into());
        }
        for subtag in subtags {
            if subtag.is_empty()
                || subtag.len() > 8
                || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(invalid().into());
            }
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language part of the tag: `es` for `es-ES`.
    pub fn primary_subtag(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(&self.0)
    }

    /// Case-insensitive comparison that treats `-` and `_` alike.
    pub fn matches(&self, other: &str) -> bool {
        normalize(&self.0) == normalize(other.trim())
    }
}

fn normalize(raw: &str) -> String {
    raw.replace('_', "-").to_ascii_lowercase()
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_subtag_drops_the_region() {
        assert_eq!(LanguageTag::parse("es-ES").unwrap().primary_subtag(), "es");
        assert_eq!(LanguageTag::parse("zh_CN").unwrap().primary_subtag(), "zh");
        assert_eq!(LanguageTag::parse(" vi ").unwrap().primary_subtag(), "vi");
        assert_eq!(LanguageTag::parse("zh-Hant-TW").unwrap().primary_subtag(), "zh");
    }

    #[test]
    fn rejects_malformed_tags() {
        for raw in ["", "e", "e1-US", "en--US", "en-", "en US", "toolonglang"] {
            let err = LanguageTag::parse(raw).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<CoreError>(), Some(CoreError::InvalidLanguageTag { .. })),
                "expected invalid tag for {raw:?}"
            );
        }
    }

    #[test]
    fn matching_ignores_case_and_separator() {
        let tag = LanguageTag::parse("zh-CN").unwrap();
        assert!(tag.matches("zh_cn"));
        assert!(tag.matches("ZH-CN"));
        assert!(!tag.matches("zh"));
    }
}
