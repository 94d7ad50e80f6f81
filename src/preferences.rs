//! The user's saved category preferences.
//!
//! The server is the only source of truth: the in-memory set is whatever the
//! last successful read returned. A save is followed by a confirmatory read so
//! the set never reflects what we *sent*, only what the backend *kept*.
use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::gateway::{GatewayError, RemoteGateway};
use crate::session::Session;
use crate::util::{is_blank, normalize_label};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum PreferenceError {
    /// The write itself was rejected; nothing changed server-side.
    #[error("Failed to save preferences: {0}")]
    Save(#[from] GatewayError),
}

impl PreferenceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PreferenceError::Save(e) if e.is_cancelled())
    }
}

/// How much we know about the backend state after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The confirmatory read succeeded and the in-memory set mirrors it.
    Confirmed,
    /// The write succeeded but the read-back failed; the in-memory set holds
    /// what was submitted until the next successful load.
    Unconfirmed,
}

// ============================================================================
// PreferenceSet
// ============================================================================

/// Set of category labels a user opted into.
///
/// Membership is decided on the normalized (trimmed, case-folded) form, so
/// `"Tech"` and `"tech "` are the same preference. The first spelling seen is
/// the one kept and sent back to the server. Iteration order is insertion
/// order, but nothing depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSet {
    categories: Vec<String>,
}

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw backend/UI labels.
    ///
    /// Labels are trimmed, blank labels dropped (an empty saved list reads
    /// back from the backend as `[""]`), and duplicates by normalized form
    /// collapsed.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for label in labels {
            set.insert(label.as_ref());
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.categories
    }

    /// Normalized membership test.
    pub fn contains(&self, label: &str) -> bool {
        let key = normalize_label(label);
        self.categories.iter().any(|c| normalize_label(c) == key)
    }

    /// Add a label. Returns false if it was blank or already present.
    pub fn insert(&mut self, label: &str) -> bool {
        if is_blank(label) || self.contains(label) {
            return false;
        }
        self.categories.push(label.trim().to_owned());
        true
    }

    /// Remove a label by normalized match. Returns true if something was removed.
    pub fn remove(&mut self, label: &str) -> bool {
        let key = normalize_label(label);
        let before = self.categories.len();
        self.categories.retain(|c| normalize_label(c) != key);
        self.categories.len() != before
    }

    /// Flip a label's membership, the way a checkbox does.
    /// Returns true if the label is selected afterwards.
    pub fn toggle(&mut self, label: &str) -> bool {
        if self.remove(label) {
            false
        } else {
            self.insert(label)
        }
    }

    /// Normalized keys for O(1) membership during narrowing.
    pub fn normalized_keys(&self) -> HashSet<String> {
        self.categories.iter().map(|c| normalize_label(c)).collect()
    }
}

// ============================================================================
// PreferenceStore
// ============================================================================

/// Owner of the session's [`PreferenceSet`].
///
/// Reads fail soft: a backend error leaves an empty set so the feed shows
/// unfiltered rather than not at all.
pub struct PreferenceStore {
    gateway: Arc<dyn RemoteGateway>,
    session: Session,
    current: PreferenceSet,
}

impl PreferenceStore {
    pub fn new(session: Session, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            session,
            current: PreferenceSet::new(),
        }
    }

    /// The set as last confirmed by the backend.
    pub fn current(&self) -> &PreferenceSet {
        &self.current
    }

    /// Read and normalize the saved set without touching in-memory state.
    pub async fn fetch(&self) -> Result<PreferenceSet, GatewayError> {
        let raw = self.gateway.get_preferences().await?;
        Ok(PreferenceSet::from_labels(raw))
    }

    /// Install the outcome of a [`fetch`](Self::fetch), failing soft.
    pub fn apply_fetch(&mut self, result: Result<PreferenceSet, GatewayError>) -> &PreferenceSet {
        match result {
            Ok(set) => {
                tracing::debug!(
                    user_id = %self.session.user_id,
                    count = set.len(),
                    "Loaded preferences"
                );
                self.current = set;
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.session.user_id,
                    error = %e,
                    "Failed to load preferences, continuing unfiltered"
                );
                self.current = PreferenceSet::new();
            }
        }
        &self.current
    }

    /// Load the saved set. Never fails: on error the set is empty.
    pub async fn load(&mut self) -> &PreferenceSet {
        let result = self.fetch().await;
        self.apply_fetch(result)
    }

    /// Persist `set`, then re-read so memory matches what the backend kept.
    ///
    /// On a failed write the in-memory set is unchanged. On a successful
    /// write whose read-back fails, the submitted set is adopted and the
    /// outcome is [`SaveOutcome::Unconfirmed`].
    pub async fn save(&mut self, set: PreferenceSet) -> Result<SaveOutcome, PreferenceError> {
        if let Err(e) = self.gateway.save_preferences(set.as_slice()).await {
            tracing::warn!(
                user_id = %self.session.user_id,
                error = %e,
                "Failed to save preferences"
            );
            return Err(PreferenceError::Save(e));
        }

        match self.fetch().await {
            Ok(confirmed) => {
                if confirmed.normalized_keys() != set.normalized_keys() {
                    tracing::info!(
                        submitted = set.len(),
                        confirmed = confirmed.len(),
                        "Backend stored a different preference set than submitted"
                    );
                }
                self.current = confirmed;
                Ok(SaveOutcome::Confirmed)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.session.user_id,
                    error = %e,
                    "Preferences saved but confirmation read failed"
                );
                self.current = set;
                Ok(SaveOutcome::Unconfirmed)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
