//! The personalized feed pipeline.
//!
//! An article reaches the screen through three stages, each a pure function
//! of the previous stage's output:
//!
//! 1. **Narrowing** by saved preferences ([`crate::catalog::narrow_by_preferences`])
//! 2. **Filtering** by ad-hoc criteria ([`FilterCriteria`])
//! 3. **Paging** ([`paginate`], [`Paginator`])
//!
//! [`FeedController`] owns the state feeding these stages and re-derives the
//! visible collection whenever any input changes.
//!
//! # Example
//!
//! ```ignore
//! use newsdeck::feed::{FeedController, FilterCriteria};
//!
//! let mut feed = FeedController::new(session, gateway, 5);
//! feed.load().await;
//! feed.apply_filter(FilterCriteria::new().with_sentiment("positive"));
//! for article in feed.current_page().items {
//!     println!("{}", article.title);
//! }
//! ```

mod controller;
mod filter;
mod pagination;

pub use controller::{FeedController, LoadOutcome};
pub use filter::FilterCriteria;
pub use pagination::{page_window, paginate, total_pages, Page, Paginator, WINDOW_RADIUS};
