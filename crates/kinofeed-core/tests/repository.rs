//! Cache-first repository behavior against a scripted source.

#![allow(clippy::unwrap_used)]

mod common;

use std::collections::HashSet;
use std::time::Duration;

use futures::StreamExt;
use kinofeed_core::{AppEvent, CachePolicy, ErrorKind, MovieId, Page, UiState};

use common::{FakeSource, MISSING_ID, ids, item_ids, repository};

#[tokio::test]
async fn test_concurrent_page_loads_share_one_request() {
    let (repo, source) =
        repository(FakeSource::new(vec![ids(1, 5), ids(6, 5), ids(11, 5)]).with_delay(
            Duration::from_millis(50),
        ))
        .await;

    let (a, b) = tokio::join!(
        repo.page(3, CachePolicy::CacheAndNetwork)
            .collect::<Vec<_>>(),
        repo.page(3, CachePolicy::CacheAndNetwork)
            .collect::<Vec<_>>(),
    );

    assert_eq!(source.page_calls(), 1);
    let a = a.last().unwrap().clone();
    let b = b.last().unwrap().clone();
    assert_eq!(a, b);
    assert_eq!(item_ids(&a.data.unwrap().items), ids(11, 5));
}

#[tokio::test]
async fn test_cached_page_emitted_before_failed_refresh() {
    let (repo, source) = repository(FakeSource::new(vec![ids(1, 20)])).await;
    repo.fetch_page(1).await.unwrap();
    source.set_online(false);

    let states: Vec<UiState<Page>> = repo
        .page(1, CachePolicy::CacheAndNetwork)
        .collect()
        .await;

    assert_eq!(states.len(), 2);
    let first = &states[0];
    assert!(first.loading);
    assert_eq!(first.error, None);
    assert_eq!(first.data.as_ref().unwrap().items.len(), 20);

    let last = &states[1];
    assert!(!last.loading);
    assert_eq!(last.error, Some(ErrorKind::Network));
    assert_eq!(item_ids(&last.data.as_ref().unwrap().items), ids(1, 20));
    assert!(last.can_retry());
}

#[tokio::test]
async fn test_failed_info_refresh_keeps_cached_record() {
    let (repo, source) = repository(FakeSource::new(vec![])).await;
    let cached = repo.fetch_info(MovieId(42)).await.unwrap();
    source.set_online(false);

    let states: Vec<_> = repo
        .info(MovieId(42), CachePolicy::CacheAndNetwork)
        .collect()
        .await;

    assert_eq!(
        states,
        vec![
            UiState::loading(Some(cached.clone())),
            UiState::failure(ErrorKind::Network, Some(cached.clone())),
        ]
    );
    assert_eq!(repo.store().get_info(MovieId(42)).await.unwrap(), Some(cached));
}

#[tokio::test]
async fn test_nothing_cached_and_offline() {
    let (repo, source) = repository(FakeSource::new(vec![ids(1, 3)])).await;
    source.set_online(false);

    let states: Vec<_> = repo.page(1, CachePolicy::CacheAndNetwork).collect().await;

    assert_eq!(
        states,
        vec![UiState::loading(None), UiState::failure(ErrorKind::Network, None)]
    );
}

#[tokio::test]
async fn test_successful_refresh_writes_through() {
    let (repo, source) = repository(FakeSource::new(vec![ids(1, 3)])).await;

    let states: Vec<_> = repo.page(1, CachePolicy::CacheAndNetwork).collect().await;

    assert_eq!(states.len(), 2);
    assert_eq!(states[0], UiState::loading(None));
    let fresh = states[1].data.clone().unwrap();
    assert_eq!(states[1], UiState::success(fresh.clone()));
    assert_eq!(source.page_calls(), 1);

    let cached = repo.store().get_page(1).await.unwrap().unwrap();
    assert_eq!(cached, fresh.items);
}

#[tokio::test]
async fn test_unknown_film_is_not_found() {
    let (repo, _source) = repository(FakeSource::new(vec![])).await;

    let last = repo
        .info(MovieId(MISSING_ID), CachePolicy::CacheAndNetwork)
        .collect::<Vec<_>>()
        .await
        .pop()
        .unwrap();

    assert_eq!(last, UiState::failure(ErrorKind::NotFound, None));
}

#[tokio::test]
async fn test_out_of_range_page_is_api_error() {
    let (repo, _source) = repository(FakeSource::new(vec![ids(1, 3)])).await;

    assert_eq!(
        repo.fetch_page(9).await,
        Err(ErrorKind::Api { status_code: 400 })
    );
    assert_eq!(repo.store().get_page(9).await.unwrap(), None);
}

#[tokio::test]
async fn test_page_fetch_retryable_after_source_panic() {
    let (repo, source) = repository(FakeSource::new(vec![ids(1, 3)]).with_panic_once()).await;

    assert_eq!(repo.fetch_page(1).await, Err(ErrorKind::Storage));

    let page = repo.fetch_page(1).await.unwrap();
    assert_eq!(item_ids(&page.items), ids(1, 3));
    assert_eq!(source.page_calls(), 2);
}

#[tokio::test]
async fn test_cache_only_never_fetches() {
    let (repo, source) = repository(FakeSource::new(vec![ids(1, 3)])).await;

    let empty: Vec<_> = repo.page(1, CachePolicy::CacheOnly).collect().await;
    assert_eq!(empty, vec![UiState::idle()]);

    repo.fetch_page(1).await.unwrap();
    let cached: Vec<_> = repo.page(1, CachePolicy::CacheOnly).collect().await;

    assert_eq!(cached.len(), 1);
    assert!(!cached[0].loading);
    assert_eq!(item_ids(&cached[0].data.as_ref().unwrap().items), ids(1, 3));
    assert_eq!(source.page_calls(), 1);
}

#[tokio::test]
async fn test_cache_if_fresh_skips_network_for_fresh_entries() {
    let (repo, source) = repository(FakeSource::new(vec![ids(1, 3)])).await;
    repo.fetch_page(1).await.unwrap();

    let fresh: Vec<_> = repo
        .page(1, CachePolicy::CacheIfFresh(Duration::from_secs(3600)))
        .collect()
        .await;
    assert_eq!(fresh.len(), 1);
    assert_eq!(source.page_calls(), 1);

    let stale: Vec<_> = repo
        .page(1, CachePolicy::CacheIfFresh(Duration::ZERO))
        .collect()
        .await;
    assert_eq!(stale.len(), 2);
    assert_eq!(source.page_calls(), 2);
}

#[tokio::test]
async fn test_next_pages_are_monotonic_and_disjoint() {
    let (repo, source) =
        repository(FakeSource::new(vec![ids(1, 4), ids(5, 4), ids(9, 4)])).await;

    let mut seen = HashSet::new();
    let mut numbers = Vec::new();
    while let Some(page) = repo.load_next_page().await.unwrap() {
        numbers.push(page.number);
        for film in &page.items {
            assert!(seen.insert(film.id), "film {} listed twice", film.id);
        }
    }

    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(repo.store().max_cached_page().await.unwrap(), 3);
    assert_eq!(source.page_calls(), 3);

    let listing = repo.cached_listing().await.unwrap();
    assert_eq!(item_ids(&listing), ids(1, 12));
}

#[tokio::test]
async fn test_concurrent_next_page_requests_share_fetch() {
    let (repo, source) = repository(
        FakeSource::new(vec![ids(1, 2), ids(3, 2)]).with_delay(Duration::from_millis(50)),
    )
    .await;

    let (a, b) = tokio::join!(repo.load_next_page(), repo.load_next_page());

    assert_eq!(a.unwrap().unwrap().number, 1);
    assert_eq!(b.unwrap().unwrap().number, 1);
    assert_eq!(source.page_calls(), 1);
}

#[tokio::test]
async fn test_dropped_stream_still_updates_cache() {
    let (repo, _source) = repository(
        FakeSource::new(vec![ids(1, 3)]).with_delay(Duration::from_millis(20)),
    )
    .await;

    drop(repo.page(1, CachePolicy::CacheAndNetwork));
    tokio::time::sleep(Duration::from_millis(200)).await;

    let cached = repo.store().get_page(1).await.unwrap().unwrap();
    assert_eq!(item_ids(&cached), ids(1, 3));
}

#[tokio::test]
async fn test_write_through_publishes_events() {
    let (repo, _source) = repository(FakeSource::new(vec![ids(1, 2)])).await;
    let mut events = repo.events().subscribe();

    repo.fetch_page(1).await.unwrap();
    repo.fetch_info(MovieId(7)).await.unwrap();

    assert_eq!(events.next().await, Some(AppEvent::PageCached { page: 1 }));
    assert_eq!(
        events.next().await,
        Some(AppEvent::InfoCached { id: MovieId(7) })
    );
}

#[tokio::test]
async fn test_search_cached_titles() {
    let (repo, _source) = repository(FakeSource::new(vec![vec![1, 12, 3]])).await;
    repo.fetch_page(1).await.unwrap();

    let found = repo.search_cached("film 1").await.unwrap();
    assert_eq!(item_ids(&found), vec![1, 12]);
    assert!(repo.search_cached("nothing").await.unwrap().is_empty());
}
