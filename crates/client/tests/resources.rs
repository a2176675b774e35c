mod support;

use std::sync::Arc;

use quire_auth::{can_delete_article, can_edit_article, can_manage_comment};
use quire_client::resources::{ArticleQuery, articles, comments};
use quire_client::{MemoryTokenStore, SessionManager};
use quire_core::{ArticleId, Credentials, Listing};
use support::TestServer;

async fn signed_in(srv: &TestServer, username: &str, password: &str) -> SessionManager {
    let mgr = SessionManager::from_config(&srv.config(), Arc::new(MemoryTokenStore::new())).unwrap();
    mgr.login(&Credentials::new(username, password)).await.unwrap();
    mgr
}

#[tokio::test]
async fn article_list_unwraps_the_pagination_envelope() {
    let srv = TestServer::spawn().await;
    let client = srv.client(Arc::new(MemoryTokenStore::new()));

    let listing = articles::list(&client, &ArticleQuery::default()).await.unwrap();

    assert!(matches!(listing, Listing::Paged { .. }));
    assert_eq!(listing.total(), Some(3));
    assert!(!listing.has_next());
    let titles: Vec<_> = listing.into_items().into_iter().map(|a| a.title).collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
}

#[tokio::test]
async fn tag_filter_accepts_a_bare_array() {
    let srv = TestServer::spawn().await;
    let client = srv.client(Arc::new(MemoryTokenStore::new()));

    let listing = articles::list(&client, &ArticleQuery::tagged("rust")).await.unwrap();

    assert!(matches!(listing, Listing::Plain(_)));
    let ids: Vec<i64> = listing.into_items().iter().map(|a| a.id.get()).collect();
    assert_eq!(ids, [1, 3]);
    assert!(
        srv.state
            .seen()
            .iter()
            .any(|s| s.path == "/api/articles/" && s.method == "GET")
    );
}

#[tokio::test]
async fn latest_articles_come_newest_first() {
    let srv = TestServer::spawn().await;
    let client = srv.client(Arc::new(MemoryTokenStore::new()));

    let latest = articles::latest(&client).await.unwrap();

    assert_eq!(latest.first().map(|a| a.title.as_str()), Some("Third"));
}

#[tokio::test]
async fn edit_rights_follow_authorship_and_staff_status() {
    let srv = TestServer::spawn().await;
    let alice = signed_in(&srv, "alice", "wonderland").await;
    let root = signed_in(&srv, "root", "toor").await;

    let own = articles::get(alice.client(), ArticleId::new(1)).await.unwrap();
    let other = articles::get(alice.client(), ArticleId::new(2)).await.unwrap();

    let alice_session = alice.session().await;
    assert!(can_edit_article(&alice_session, &own));
    assert!(!can_edit_article(&alice_session, &other));
    assert!(!can_delete_article(&alice_session, &other));

    let root_session = root.session().await;
    assert!(can_edit_article(&root_session, &other));
    assert!(can_delete_article(&root_session, &other));
}

#[tokio::test]
async fn comments_can_be_posted_listed_and_removed() {
    let srv = TestServer::spawn().await;
    let alice = signed_in(&srv, "alice", "wonderland").await;
    let article = ArticleId::new(2);

    let posted = comments::create(alice.client(), article, "Nice read").await.unwrap();
    assert_eq!(posted.author_name.as_deref(), Some("alice"));
    assert!(can_manage_comment(&alice.session().await, &posted));

    let thread = comments::list(alice.client(), article).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].content, "Nice read");

    comments::delete(alice.client(), posted.id).await.unwrap();
    assert!(comments::list(alice.client(), article).await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_comment_is_rejected_without_refresh() {
    let srv = TestServer::spawn().await;
    let client = srv.client(Arc::new(MemoryTokenStore::new()));

    let err = comments::create(&client, ArticleId::new(1), "hi").await.unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(srv.state.refresh_calls(), 0);
}
