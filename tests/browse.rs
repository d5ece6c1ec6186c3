//! End-to-end browse sessions through the async driver.
//!
//! Every test runs on paused tokio time: debounce timers and scripted fetch
//! latency advance virtually, so orderings are deterministic.

use std::rc::Rc;
use std::time::Duration;
use storefront::cache::ManualClock;
use storefront::domain::{Category, QueryKey, SortOrder};
use storefront::filters::{AddressBar, HistoryMode, MemoryAddressBar};
use storefront::source::MemoryCatalog;
use storefront::{initialize, Config, EmptyState, FetchError, Item, Storefront};

fn catalog() -> MemoryCatalog {
    let mut items: Vec<Item> = (1..=14)
        .map(|i| {
            Item::new(i, format!("Product {i}"), i as f64)
                .with_category("electronics")
                .with_rating(3.0 + (i % 3) as f64 * 0.6)
        })
        .collect();
    items.extend([
        Item::new(15, "Gold Ring", 168.0).with_category("jewelery").with_rating(3.9),
        Item::new(16, "Silver Ring", 10.99).with_category("jewelery").with_rating(4.2),
        Item::new(17, "Pearl Earrings", 42.0).with_category("jewelery").with_rating(4.0),
    ]);
    MemoryCatalog::new(items)
}

fn storefront(catalog: &MemoryCatalog, query: &str) -> Storefront<MemoryCatalog, MemoryAddressBar> {
    Storefront::from_config(&Config::default(), Rc::new(catalog.clone()), MemoryAddressBar::new(query))
}

fn ids(store: &Storefront<MemoryCatalog, MemoryAddressBar>) -> Vec<u64> {
    store.view().items.iter().map(|item| item.id).collect()
}

#[tokio::test(start_paused = true)]
async fn pages_grow_six_twelve_fourteen() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "category=electronics");

    store.open().unwrap();
    assert!(store.view().is_loading_first_page);
    store.settle().await.unwrap();

    let mut seen = vec![(store.view().items.len(), store.view().has_more)];
    for _ in 0..2 {
        store.sentinel_visible().unwrap();
        assert!(store.view().is_loading_next_page);
        // the new page pushes the sentinel back out of view
        store.sentinel_hidden().unwrap();
        store.settle().await.unwrap();
        seen.push((store.view().items.len(), store.view().has_more));
    }

    assert_eq!(seen, vec![(6, true), (12, true), (14, false)]);
    assert_eq!(ids(&store), (1..=14u64).collect::<Vec<_>>());
    assert_eq!(catalog.call_count(), 3);

    store.sentinel_visible().unwrap();
    assert_eq!(store.pending_fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_page_requests_share_one_fetch() {
    let catalog = catalog().with_latency(Duration::from_millis(200));
    let mut store = storefront(&catalog, "");

    store.open().unwrap();
    store.request_next_page().unwrap();
    store.sentinel_visible().unwrap();
    store.sentinel_hidden().unwrap();
    assert_eq!(catalog.call_count(), 1);
    assert_eq!(store.pending_fetches(), 1);

    store.settle().await.unwrap();
    assert_eq!(store.view().items.len(), 6);
    assert_eq!(catalog.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn sentinel_visible_during_first_load_keeps_paging() {
    let catalog = catalog().with_latency(Duration::from_millis(100));
    let mut store = storefront(&catalog, "category=electronics");

    store.open().unwrap();
    store.sentinel_visible().unwrap();
    assert_eq!(store.pending_fetches(), 1);

    assert!(store.step().await.unwrap());
    assert_eq!(store.view().items.len(), 6);
    assert_eq!(store.pending_fetches(), 1);
    assert!(store.view().is_loading_next_page);

    store.sentinel_hidden().unwrap();
    store.settle().await.unwrap();
    assert_eq!(store.view().items.len(), 12);
    assert!(store.view().has_more);
    assert_eq!(catalog.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn visible_sentinel_pages_to_the_end() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "category=electronics");

    store.open().unwrap();
    store.sentinel_visible().unwrap();
    store.settle().await.unwrap();

    assert_eq!(store.view().items.len(), 14);
    assert!(!store.view().has_more);
    assert_eq!(catalog.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn typed_then_cleared_search_never_fetches() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "");
    store.open().unwrap();
    store.settle().await.unwrap();

    store.search_input("Product 2").unwrap();
    tokio::time::advance(Duration::from_millis(80)).await;
    store.search_input("").unwrap();
    store.settle().await.unwrap();

    let typed = QueryKey {
        search_text: "Product 2".to_string(),
        ..QueryKey::default()
    };
    assert!(!store.engine().cache().contains(&typed));
    assert_eq!(catalog.call_count(), 1);
    assert_eq!(store.filters().search_text, "");
    assert!(store
        .address_bar()
        .writes()
        .iter()
        .all(|(query, _)| !query.contains("search")));
}

#[tokio::test(start_paused = true)]
async fn search_settles_after_the_debounce_delay() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "category=jewelery");
    store.open().unwrap();
    store.settle().await.unwrap();

    let started = tokio::time::Instant::now();
    for prefix in ["r", "ri", "rin", "ring"] {
        store.search_input(prefix).unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    assert_eq!(store.filters().search_text, "");

    store.settle().await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(700));
    assert_eq!(store.filters().search_text, "ring");
    assert_eq!(store.address_bar().query_string(), "category=jewelery&search=ring");
    // "Earrings" matches too; ascending by price
    assert_eq!(ids(&store), vec![16, 17, 15]);
    assert_eq!(catalog.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn late_response_for_abandoned_key_stays_out_of_view() {
    let catalog = catalog();
    catalog.set_category_latency(Some("electronics"), Duration::from_millis(500));
    catalog.set_category_latency(Some("jewelery"), Duration::from_millis(50));
    let mut store = storefront(&catalog, "category=electronics");

    store.open().unwrap();
    store.set_category("jewelery").unwrap();

    assert!(store.step().await.unwrap());
    assert_eq!(ids(&store), vec![16, 17, 15]);

    assert!(store.step().await.unwrap());
    assert_eq!(ids(&store), vec![16, 17, 15]);

    let electronics = QueryKey {
        category: Category::parse("electronics"),
        ..QueryKey::default()
    };
    let abandoned = store.engine().cache().entry(&electronics).unwrap();
    assert_eq!(abandoned.items().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_filters_url_and_cache() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "?category=jewelery&sort=desc&rating=4&utm_source=mail");
    store.open().unwrap();
    store.settle().await.unwrap();
    assert_eq!(ids(&store), vec![17, 16]);

    store.set_category("all").unwrap();
    store.settle().await.unwrap();
    store.search_input("ring").unwrap();
    let calls_before = catalog.call_count();

    store.reset().unwrap();

    assert!(store.filters().is_default());
    assert!(!store.search_pending());
    assert_eq!(store.address_bar().query_string(), "");
    assert_eq!(store.engine().cache().len(), 1);
    assert_eq!(catalog.call_count(), calls_before + 1);

    store.settle().await.unwrap();
    assert_eq!(store.view().items.len(), 6);
    assert_eq!(store.filters().search_text, "");
}

#[tokio::test(start_paused = true)]
async fn only_the_page_entry_is_pushed() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "?sort=desc&bogus=1&rating=11");
    store.open().unwrap();
    store.settle().await.unwrap();

    store.set_sort_order(SortOrder::Asc).unwrap();
    store.set_rating_threshold(4).unwrap();
    store.settle().await.unwrap();

    let writes = store.address_bar().writes();
    assert_eq!(writes[0], ("sort=desc&bogus=1".to_string(), HistoryMode::Push));
    assert_eq!(store.address_bar().pushes(), 1);
    assert!(writes[1..].iter().all(|(_, mode)| *mode == HistoryMode::Replace));
    assert_eq!(store.address_bar().query_string(), "rating=4&bogus=1");
}

#[tokio::test(start_paused = true)]
async fn transient_failure_is_retried_then_surfaced() {
    let catalog = catalog();
    catalog.fail_next(FetchError::Network("connection reset".to_string()));
    let mut store = storefront(&catalog, "");
    store.open().unwrap();
    store.settle().await.unwrap();

    assert_eq!(catalog.call_count(), 2);
    assert_eq!(store.view().items.len(), 6);

    catalog.fail_next(FetchError::Server { status: 503 });
    catalog.fail_next(FetchError::Server { status: 503 });
    store.request_next_page().unwrap();
    store.settle().await.unwrap();

    assert_eq!(store.view().error, Some(&FetchError::Server { status: 503 }));
    assert_eq!(store.view().items.len(), 6);
    assert_eq!(store.view().error.unwrap().to_string(), "Server error (503). Click to retry.");

    store.retry().unwrap();
    store.settle().await.unwrap();
    assert!(store.view().error.is_none());
    assert_eq!(store.view().items.len(), 12);
}

#[tokio::test(start_paused = true)]
async fn rating_filter_reports_empty_state() {
    let catalog = catalog();
    let mut store = storefront(&catalog, "category=jewelery&rating=1");
    store.open().unwrap();
    store.settle().await.unwrap();

    assert!(store.view().items.is_empty());
    assert_eq!(
        store.view().empty_state,
        Some(EmptyState::NoRatingMatches { threshold: 1 })
    );
}

#[tokio::test(start_paused = true)]
async fn warm_keys_are_served_until_stale() {
    let catalog = catalog();
    let clock = ManualClock::default();
    let engine = initialize(&Config::default()).with_clock(clock.clone());
    let mut store = Storefront::new(engine, Rc::new(catalog.clone()), MemoryAddressBar::new(""));

    store.open().unwrap();
    store.settle().await.unwrap();
    store.set_category("jewelery").unwrap();
    store.settle().await.unwrap();
    assert_eq!(catalog.call_count(), 2);

    clock.advance(chrono::Duration::minutes(2));
    store.set_category("all").unwrap();
    assert!(!store.view().is_loading_first_page);
    assert_eq!(store.view().items.len(), 6);
    assert_eq!(catalog.call_count(), 2);

    clock.advance(chrono::Duration::minutes(6));
    store.set_category("jewelery").unwrap();
    assert!(store.view().is_loading_first_page);
    assert_eq!(catalog.call_count(), 3);
}
