//! Query classification
//!
//! Decides what a raw query from the client asks for:
//! - nothing, for an empty or whitespace-only query
//! - a provider sync, for the configured sentinel (`sync plugins` by default)
//! - a dispatch to providers, for anything else
//!
//! and whether a provider's toggle suggestion applies to it.

use crate::results::SearchResult;

/// Default sentinel query that offers a provider sync
pub const DEFAULT_SYNC_COMMAND: &str = "sync plugins";

/// What a raw query asks the dispatcher to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind<'a> {
    /// Empty or whitespace-only; no provider is consulted
    Empty,
    /// The reserved sync sentinel
    Sync,
    /// A regular query, passed to providers exactly as typed
    Dispatch(&'a str),
}

impl<'a> QueryKind<'a> {
    /// Classify `raw` against the sync sentinel
    ///
    /// The sentinel matches when the trimmed query equals it exactly. An empty
    /// sentinel disables the sync shortcut.
    pub fn classify(raw: &'a str, sync_command: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            QueryKind::Empty
        } else if !sync_command.is_empty() && trimmed == sync_command {
            QueryKind::Sync
        } else {
            QueryKind::Dispatch(raw)
        }
    }
}

/// Toggle suggestion for a provider, if the query completes towards one
///
/// An enabled provider is offered `"<prefix> disable"` and a disabled one
/// `"<prefix> enable"`. The suggestion applies when that phrase starts with
/// the query as typed (case-sensitive, not trimmed).
pub fn toggle_suggestion(
    name: &str,
    prefix: Option<&str>,
    disabled: bool,
    query: &str,
) -> Option<SearchResult> {
    let prefix = prefix?;

    if disabled {
        format!("{} enable", prefix)
            .starts_with(query)
            .then(|| SearchResult::enable_toggle(name))
    } else {
        format!("{} disable", prefix)
            .starts_with(query)
            .then(|| SearchResult::disable_toggle(name))
    }
}
