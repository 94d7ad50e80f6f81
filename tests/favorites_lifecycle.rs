//! Integration tests for favorites: check, optimistic toggle with rollback,
//! and confirmed removal from the favorites list.

use std::sync::Arc;
use std::time::Duration;

use newsdeck::favorites::{FavoriteError, FavoriteState, FavoriteSynchronizer, FavoritesList};
use newsdeck::gateway::{GatewayError, HttpGateway, HttpGatewayOptions, RemoteGateway};
use newsdeck::session::{Session, UserId};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    Session::new(UserId::new("reader_1").unwrap())
}

fn gateway(server: &MockServer) -> Arc<dyn RemoteGateway> {
    let options = HttpGatewayOptions {
        timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_base_delay: Duration::from_millis(1),
    };
    Arc::new(HttpGateway::new(&server.uri(), session(), options).unwrap())
}

fn favorites_body(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({"id": id, "title": format!("Favorite {id}"), "category": "Tech"}))
            .collect(),
    )
}

async fn mount_favorites(server: &MockServer, ids: &[i64]) {
    Mock::given(method("GET"))
        .and(path("/api/articles/favorites"))
        .and(header("user-id", "reader_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(favorites_body(ids)))
        .mount(server)
        .await;
}

// ============================================================================
// FavoriteSynchronizer
// ============================================================================

#[tokio::test]
async fn test_check_then_add() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[1, 2]).await;
    Mock::given(method("POST"))
        .and(path("/api/articles/5/favorite"))
        .and(header("user-id", "reader_1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut favorite = FavoriteSynchronizer::new(session(), gateway(&server), 5);
    assert!(!favorite.check().await.unwrap());
    assert!(favorite.toggle().await.unwrap());
    assert_eq!(favorite.state(), FavoriteState::Favorited);
}

#[tokio::test]
async fn test_check_then_remove_then_add_restores_state() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[5]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/articles/5/favorite"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/articles/5/favorite"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut favorite = FavoriteSynchronizer::new(session(), gateway(&server), 5);
    assert!(favorite.check().await.unwrap());
    assert!(!favorite.toggle().await.unwrap());
    assert!(favorite.toggle().await.unwrap());
    assert_eq!(favorite.state(), FavoriteState::Favorited);
}

#[tokio::test]
async fn test_add_answered_already_favorited_keeps_target() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[]).await;
    // Backend answers 400 when the favorite already exists
    Mock::given(method("POST"))
        .and(path("/api/articles/5/favorite"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Already in favorites"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut favorite = FavoriteSynchronizer::new(session(), gateway(&server), 5);
    assert!(!favorite.check().await.unwrap());
    assert!(favorite.toggle().await.unwrap());
    assert_eq!(favorite.state(), FavoriteState::Favorited);
}

#[tokio::test]
async fn test_remove_answered_not_found_keeps_target() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[5]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/articles/5/favorite"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Favorite not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut favorite = FavoriteSynchronizer::new(session(), gateway(&server), 5);
    assert!(favorite.check().await.unwrap());
    assert!(!favorite.toggle().await.unwrap());
    assert_eq!(favorite.state(), FavoriteState::NotFavorited);
}

#[tokio::test]
async fn test_rejected_add_rolls_back() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[]).await;
    Mock::given(method("POST"))
        .and(path("/api/articles/8/favorite"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut favorite = FavoriteSynchronizer::new(session(), gateway(&server), 8);
    favorite.check().await.unwrap();
    let err = favorite.toggle().await.unwrap_err();

    assert!(matches!(
        err,
        FavoriteError::Write {
            article_id: 8,
            source: GatewayError::HttpStatus(500),
            ..
        }
    ));
    assert!(err.is_recoverable());
    assert_eq!(favorite.state(), FavoriteState::NotFavorited);
}

#[tokio::test]
async fn test_failed_check_stays_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles/favorites"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut favorite = FavoriteSynchronizer::new(session(), gateway(&server), 1);
    assert!(favorite.check().await.is_err());
    assert_eq!(favorite.is_favorite(), None);
    assert!(matches!(
        favorite.toggle().await,
        Err(FavoriteError::NotSettled(1))
    ));
}

// ============================================================================
// FavoritesList
// ============================================================================

#[tokio::test]
async fn test_list_pages_and_removes_after_confirmation() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[1, 2, 3, 4, 5, 6]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/articles/6/favorite"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = FavoritesList::new(session(), gateway(&server), 5);
    list.load().await.unwrap();
    assert_eq!(list.paginator().total_pages(), 2);
    assert!(list.change_page(2));
    assert_eq!(list.current_page().items.len(), 1);

    list.remove(6).await.unwrap();

    let remaining: Vec<i64> = list.items().iter().map(|a| a.id).collect();
    assert_eq!(remaining, vec![1, 2, 3, 4, 5]);
    assert_eq!(list.paginator().current_page(), 1);
    assert_eq!(list.paginator().total_pages(), 1);
}

#[tokio::test]
async fn test_list_keeps_entry_when_delete_fails() {
    let server = MockServer::start().await;
    mount_favorites(&server, &[1, 2]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/articles/2/favorite"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut list = FavoritesList::new(session(), gateway(&server), 5);
    list.load().await.unwrap();

    assert!(list.remove(2).await.is_err());
    assert_eq!(list.items().len(), 2);
}
