//! Personalized news feed client.
//!
//! A user's feed is the backend's article catalog, narrowed to the categories
//! they saved as preferences, then filtered by ad-hoc criteria and paged.
//! Favorites are toggled optimistically and rolled back if the backend
//! disagrees.
//!
//! # Modules
//!
//! - [`gateway`] - the REST contract and its HTTP implementation
//! - [`preferences`] - the saved category set
//! - [`catalog`] - articles, categories and preference narrowing
//! - [`feed`] - filtering, pagination and the feed controller
//! - [`favorites`] - per-article favorite status and the favorites list
//! - [`config`] - the optional TOML config file
//! - [`session`] - the identity every component acts for
//!
//! # Backend endpoints
//!
//! Every request carries a `user-id` header.
//!
//! | Operation        | Method | Path                             |
//! |------------------|--------|----------------------------------|
//! | List articles    | GET    | `/api/articles`                  |
//! | Get one article  | GET    | `/api/articles/{id}`             |
//! | List categories  | GET    | `/api/articles/categories`       |
//! | Trending         | GET    | `/api/articles/trending?limit=N` |
//! | Get preferences  | GET    | `/api/preferences/`              |
//! | Save preferences | POST   | `/api/preferences/`              |
//! | List favorites   | GET    | `/api/articles/favorites`        |
//! | Add favorite     | POST   | `/api/articles/{id}/favorite`    |
//! | Remove favorite  | DELETE | `/api/articles/{id}/favorite`    |

pub mod catalog;
pub mod config;
pub mod favorites;
pub mod feed;
pub mod gateway;
pub mod preferences;
pub mod session;
pub mod util;
