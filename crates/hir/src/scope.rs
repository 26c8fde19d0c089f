//! Fragment scope tags.
//!
//! A fragment declares its visibility with `@scope(tags: [...])`. Without the
//! directive it is document-local. A bare `global` tag is normalized to
//! `global:<id>` with an id derived from the declaring file and fragment name,
//! so equal names declared in different files never share an identity.

use graphql_types::Fingerprint;
use std::path::Path;
use std::sync::Arc;

/// Name of the directive carrying scope tags.
pub const SCOPE_DIRECTIVE: &str = "scope";
/// Argument of [`SCOPE_DIRECTIVE`] holding the tag list.
pub const SCOPE_TAGS_ARGUMENT: &str = "tags";
pub const DOCUMENT_TAG: &str = "document";
pub const GLOBAL_TAG: &str = "global";

/// Where a fragment name is visible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentScope {
    /// Visible to every document of the declaring file
    Document,
    /// Visible project-wide under `global:<id>`
    Global(Arc<str>),
}

impl FragmentScope {
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

impl std::fmt::Display for FragmentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => write!(f, "{DOCUMENT_TAG}"),
            Self::Global(id) => write!(f, "{GLOBAL_TAG}:{id}"),
        }
    }
}

/// Tags of a fragment without a scope directive.
#[must_use]
pub fn default_scope_tags() -> Vec<String> {
    vec![DOCUMENT_TAG.to_string()]
}

/// Case-insensitive prefix test for a global tag.
#[must_use]
pub fn check_fragment_scopes_global<S: AsRef<str>>(tags: &[S]) -> bool {
    tags.iter().any(|tag| has_prefix(tag.as_ref(), GLOBAL_TAG))
}

/// Case-insensitive prefix test for a document tag.
#[must_use]
pub fn check_fragment_scopes_document<S: AsRef<str>>(tags: &[S]) -> bool {
    tags.iter().any(|tag| has_prefix(tag.as_ref(), DOCUMENT_TAG))
}

fn has_prefix(tag: &str, prefix: &str) -> bool {
    tag.len() >= prefix.len()
        && tag.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Deterministic id for a bare global tag.
#[must_use]
pub fn generate_scope_id(path: &Path, fragment: &str) -> String {
    let hash = Fingerprint::of(&(path, fragment)).as_u64();
    format!("{:08x}", hash >> 32)
}

/// Append an id to every bare `global` tag. Tags that already carry an id,
/// and all other tags, are left untouched, so normalizing twice is a no-op.
#[must_use]
pub fn normalize_scope_tags<S: AsRef<str>>(tags: &[S], path: &Path, fragment: &str) -> Vec<String> {
    tags.iter()
        .map(|tag| {
            let tag = tag.as_ref();
            if tag.eq_ignore_ascii_case(GLOBAL_TAG) {
                format!("{tag}:{}", generate_scope_id(path, fragment))
            } else {
                tag.to_string()
            }
        })
        .collect()
}

/// The scope of a fragment given its normalized tags. Global wins when both
/// kinds are present.
#[must_use]
pub fn classify_scope<S: AsRef<str>>(tags: &[S]) -> FragmentScope {
    tags.iter()
        .map(AsRef::as_ref)
        .find(|tag| has_prefix(tag, GLOBAL_TAG))
        .and_then(|tag| tag.split_once(':'))
        .map_or(FragmentScope::Document, |(_, id)| {
            FragmentScope::Global(Arc::from(id))
        })
}

/// Hook for checking individual scope tags. A rejected tag becomes a scope
/// diagnostic on the fragment; it never aborts analysis.
pub trait ScopeTagValidator: Send + Sync {
    fn validate(&self, tag: &str) -> Result<(), String>;
}

/// Accepts `document`, `global` and `global:<id>` where the id is made of
/// letters, digits, `-` and `_`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScopeTagValidator;

impl ScopeTagValidator for DefaultScopeTagValidator {
    fn validate(&self, tag: &str) -> Result<(), String> {
        if tag.eq_ignore_ascii_case(DOCUMENT_TAG) || tag.eq_ignore_ascii_case(GLOBAL_TAG) {
            return Ok(());
        }
        match tag.split_once(':') {
            Some((kind, id)) if kind.eq_ignore_ascii_case(GLOBAL_TAG) => {
                if !id.is_empty()
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                {
                    Ok(())
                } else {
                    Err(format!("invalid global scope id in tag \"{tag}\""))
                }
            }
            _ => Err(format!(
                "unknown scope tag \"{tag}\", expected \"{DOCUMENT_TAG}\" or \"{GLOBAL_TAG}\""
            )),
        }
    }
}
