//! Favorite status of a single article and the user's favorites list.
//!
//! Toggling is optimistic: the new status is shown at once while the write is
//! in flight, and rolled back if the backend rejects it. The list view is the
//! opposite: an entry only disappears after the backend confirmed the delete.
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::feed::{Page, Paginator};
use crate::gateway::{cancellable, Article, ArticleId, GatewayError, RemoteGateway};
use crate::session::Session;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum FavoriteError {
    /// The membership check could not reach the backend.
    #[error("Failed to check favorite status: {0}")]
    Check(#[source] GatewayError),
    /// An add or remove was rejected; local state was rolled back.
    #[error("Failed to {action} favorite for article {article_id}: {source}")]
    Write {
        article_id: ArticleId,
        action: FavoriteAction,
        #[source]
        source: GatewayError,
    },
    /// Toggle requested before the status was known or while a previous
    /// toggle is still in flight.
    #[error("Favorite status of article {0} is not settled")]
    NotSettled(ArticleId),
}

impl FavoriteError {
    /// False only for a write abandoned because its owner was cancelled.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FavoriteError::Write { source, .. } if source.is_cancelled())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl FavoriteAction {
    /// Status the backend answers when the article is already in the state
    /// this action asks for.
    fn already_applied_status(self) -> u16 {
        match self {
            FavoriteAction::Add => 400,
            FavoriteAction::Remove => 404,
        }
    }
}

impl std::fmt::Display for FavoriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FavoriteAction::Add => "add",
            FavoriteAction::Remove => "remove",
        })
    }
}

// ============================================================================
// FavoriteSynchronizer
// ============================================================================

/// What is known about one article's favorite status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteState {
    /// Never checked, or the last check failed.
    Unknown,
    /// Membership check in flight.
    Checking,
    Favorited,
    NotFavorited,
    /// A toggle was sent; `target` is shown until the backend answers.
    Reconciling { previous: bool, target: bool },
}

impl FavoriteState {
    fn settled(favorite: bool) -> Self {
        if favorite {
            FavoriteState::Favorited
        } else {
            FavoriteState::NotFavorited
        }
    }

    /// Status to display, counting an in-flight toggle as already applied.
    pub fn displayed(&self) -> Option<bool> {
        match *self {
            FavoriteState::Favorited => Some(true),
            FavoriteState::NotFavorited => Some(false),
            FavoriteState::Reconciling { target, .. } => Some(target),
            FavoriteState::Unknown | FavoriteState::Checking => None,
        }
    }
}

/// A toggle that was shown optimistically and still needs its write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending toggle must be submitted and completed"]
pub struct PendingToggle {
    pub article_id: ArticleId,
    pub previous: bool,
    pub target: bool,
}

impl PendingToggle {
    pub fn action(&self) -> FavoriteAction {
        if self.target {
            FavoriteAction::Add
        } else {
            FavoriteAction::Remove
        }
    }
}

/// Tracks and changes the favorite status of one article.
///
/// The toggle is split in three steps so a caller that does not want to hold
/// `&mut self` across the network call can show the optimistic value first:
/// [`begin_toggle`](Self::begin_toggle), [`submit`](Self::submit),
/// [`complete_toggle`](Self::complete_toggle). [`toggle`](Self::toggle) runs
/// all three.
pub struct FavoriteSynchronizer {
    gateway: Arc<dyn RemoteGateway>,
    session: Session,
    article_id: ArticleId,
    state: FavoriteState,
    cancel: CancellationToken,
}

impl FavoriteSynchronizer {
    pub fn new(session: Session, gateway: Arc<dyn RemoteGateway>, article_id: ArticleId) -> Self {
        Self {
            gateway,
            session,
            article_id,
            state: FavoriteState::Unknown,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this synchronizer's requests to an owning view: cancelling
    /// `parent` cancels them too.
    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.cancel = parent.child_token();
        self
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn state(&self) -> FavoriteState {
        self.state
    }

    /// Optimistic favorite status, `None` until a check succeeded.
    pub fn is_favorite(&self) -> Option<bool> {
        self.state.displayed()
    }

    /// Ask the backend whether the article is in the user's favorites.
    ///
    /// On failure the state drops back to `Unknown` and the error is logged
    /// and returned; nothing is retried.
    pub async fn check(&mut self) -> Result<bool, FavoriteError> {
        self.state = FavoriteState::Checking;
        match cancellable(&self.cancel, self.gateway.list_favorites()).await {
            Ok(favorites) => {
                let favorite = favorites.iter().any(|a| a.id == self.article_id);
                tracing::debug!(article_id = self.article_id, favorite, "Checked favorite status");
                self.state = FavoriteState::settled(favorite);
                Ok(favorite)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.session.user_id,
                    article_id = self.article_id,
                    error = %e,
                    "Failed to check favorite status"
                );
                self.state = FavoriteState::Unknown;
                Err(FavoriteError::Check(e))
            }
        }
    }

    /// Flip the displayed status and return the write that must follow.
    ///
    /// Only a settled status can be toggled; `Unknown`, `Checking` and
    /// `Reconciling` are rejected with [`FavoriteError::NotSettled`].
    pub fn begin_toggle(&mut self) -> Result<PendingToggle, FavoriteError> {
        let previous = match self.state {
            FavoriteState::Favorited => true,
            FavoriteState::NotFavorited => false,
            _ => return Err(FavoriteError::NotSettled(self.article_id)),
        };
        let target = !previous;
        self.state = FavoriteState::Reconciling { previous, target };
        Ok(PendingToggle {
            article_id: self.article_id,
            previous,
            target,
        })
    }

    /// Send the write for `pending`. Does not touch local state.
    pub async fn submit(&self, pending: &PendingToggle) -> Result<(), GatewayError> {
        let request = match pending.action() {
            FavoriteAction::Add => self.gateway.add_favorite(pending.article_id),
            FavoriteAction::Remove => self.gateway.remove_favorite(pending.article_id),
        };
        cancellable(&self.cancel, request).await
    }

    /// Settle a toggle with the outcome of its write.
    ///
    /// Success keeps the optimistic value. So does a 400 on add or a 404 on
    /// remove: the backend already holds the target status. Any other failure
    /// restores the pre-toggle value and returns [`FavoriteError::Write`].
    pub fn complete_toggle(
        &mut self,
        pending: PendingToggle,
        result: Result<(), GatewayError>,
    ) -> Result<bool, FavoriteError> {
        match result {
            Err(GatewayError::HttpStatus(status))
                if status == pending.action().already_applied_status() =>
            {
                tracing::debug!(
                    article_id = pending.article_id,
                    favorite = pending.target,
                    status,
                    "Backend already had the requested favorite status"
                );
                self.state = FavoriteState::settled(pending.target);
                Ok(pending.target)
            }
            Ok(()) => {
                tracing::info!(
                    article_id = pending.article_id,
                    favorite = pending.target,
                    "Favorite status saved"
                );
                self.state = FavoriteState::settled(pending.target);
                Ok(pending.target)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.session.user_id,
                    article_id = pending.article_id,
                    original_status = pending.previous,
                    error = %e,
                    "Favorite toggle failed, rolling back"
                );
                self.state = FavoriteState::settled(pending.previous);
                Err(FavoriteError::Write {
                    article_id: pending.article_id,
                    action: pending.action(),
                    source: e,
                })
            }
        }
    }

    /// Toggle and wait for the backend. Returns the settled status.
    pub async fn toggle(&mut self) -> Result<bool, FavoriteError> {
        let pending = self.begin_toggle()?;
        let result = self.submit(&pending).await;
        self.complete_toggle(pending, result)
    }

    /// Abandon in-flight requests.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FavoriteSynchronizer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// FavoritesList
// ============================================================================

/// The user's favorites as a paged list with confirmed removal.
pub struct FavoritesList {
    gateway: Arc<dyn RemoteGateway>,
    session: Session,
    items: Vec<Article>,
    paginator: Paginator,
    cancel: CancellationToken,
}

impl FavoritesList {
    pub fn new(session: Session, gateway: Arc<dyn RemoteGateway>, page_size: usize) -> Self {
        Self {
            gateway,
            session,
            items: Vec::new(),
            paginator: Paginator::new(page_size),
            cancel: CancellationToken::new(),
        }
    }

    pub fn items(&self) -> &[Article] {
        &self.items
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn current_page(&self) -> Page<'_, Article> {
        self.paginator.page(&self.items)
    }

    pub fn change_page(&mut self, target: usize) -> bool {
        self.paginator.change_page(target)
    }

    /// Fetch the favorites. On failure the previous list is kept.
    pub async fn load(&mut self) -> Result<(), GatewayError> {
        match cancellable(&self.cancel, self.gateway.list_favorites()).await {
            Ok(items) => {
                tracing::info!(
                    user_id = %self.session.user_id,
                    count = items.len(),
                    "Loaded favorites"
                );
                self.items = items;
                self.paginator.reset(self.items.len());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %self.session.user_id,
                    error = %e,
                    "Failed to load favorites, keeping previous list"
                );
                Err(e)
            }
        }
    }

    /// Remove `article_id` from the favorites.
    ///
    /// The entry leaves the list only after the backend confirmed the
    /// delete; the list then goes back to page 1.
    pub async fn remove(&mut self, article_id: ArticleId) -> Result<(), FavoriteError> {
        let result = cancellable(&self.cancel, self.gateway.remove_favorite(article_id)).await;
        if let Err(e) = result {
            tracing::warn!(
                user_id = %self.session.user_id,
                article_id,
                error = %e,
                "Failed to remove favorite"
            );
            return Err(FavoriteError::Write {
                article_id,
                action: FavoriteAction::Remove,
                source: e,
            });
        }
        self.items.retain(|a| a.id != article_id);
        self.paginator.reset(self.items.len());
        tracing::info!(article_id, remaining = self.items.len(), "Removed favorite");
        Ok(())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FavoritesList {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
