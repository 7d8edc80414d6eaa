//! Integration tests for pagination, category switching and stale-result handling.
//!
//! `ScriptedFetcher` replays canned pages in order. `GatedFetcher` parks every
//! fetch until the test answers it, so completions can be delivered out of order.

use headlines::controller::{FeedState, HeadlinesController};
use headlines::news::{Article, Category, FetchError, HeadlineFetcher};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

fn page(prefix: &str, n: usize) -> Vec<Article> {
    (0..n)
        .map(|i| Article {
            title: format!("{prefix} {i}"),
            url: format!("https://x/{prefix}/{i}"),
            ..Default::default()
        })
        .collect()
}

fn urls(state: &FeedState) -> Vec<String> {
    state.articles.iter().map(|a| a.url.clone()).collect()
}

// ============================================================================
// Scripted fetcher
// ============================================================================

#[derive(Default)]
struct ScriptedFetcher {
    results: Mutex<VecDeque<Result<Vec<Article>, FetchError>>>,
    calls: Mutex<Vec<(Category, u32, u32)>>,
}

impl ScriptedFetcher {
    fn with(results: Vec<Result<Vec<Article>, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            calls: Mutex::default(),
        })
    }

    fn push(&self, result: Result<Vec<Article>, FetchError>) {
        self.results.lock().unwrap().push_back(result);
    }

    fn calls(&self) -> Vec<(Category, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl HeadlineFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, FetchError> {
        self.calls.lock().unwrap().push((category, page, page_size));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}

#[tokio::test]
async fn test_twenty_then_five_reaches_end_of_data() {
    let fetcher = ScriptedFetcher::with(vec![Ok(page("general", 20)), Ok(page("more", 5))]);
    let controller = HeadlinesController::new(Arc::clone(&fetcher), Category::General, 20);

    controller.refresh().await;
    let state = controller.state();
    assert_eq!(state.articles.len(), 20);
    assert!(!state.end_of_data);

    controller.load_more().await;
    let state = controller.state();
    assert_eq!(state.articles.len(), 25);
    assert!(state.end_of_data);
    assert_eq!(state.current_page, 2);

    controller.load_more().await;
    assert_eq!(
        fetcher.calls(),
        vec![(Category::General, 1, 20), (Category::General, 2, 20)]
    );
}

#[tokio::test]
async fn test_short_first_page_blocks_load_more() {
    let fetcher = ScriptedFetcher::with(vec![Ok(page("general", 7))]);
    let controller = HeadlinesController::new(Arc::clone(&fetcher), Category::General, 20);

    controller.refresh().await;
    assert!(controller.state().end_of_data);

    controller.load_more().await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_select_category_replaces_and_resets_cursor() {
    let fetcher = ScriptedFetcher::with(vec![
        Ok(page("general", 2)),
        Ok(page("general-2", 2)),
        Ok(page("sports", 1)),
    ]);
    let controller = HeadlinesController::new(Arc::clone(&fetcher), Category::General, 2);

    controller.refresh().await;
    controller.load_more().await;
    assert_eq!(controller.state().current_page, 2);

    controller.select_category(Category::Sports).await;
    let state = controller.state();
    assert_eq!(state.category, Category::Sports);
    assert_eq!(state.current_page, 1);
    assert_eq!(urls(&state), vec!["https://x/sports/0".to_string()]);
    assert_eq!(fetcher.calls().last(), Some(&(Category::Sports, 1, 2)));
}

#[tokio::test]
async fn test_failed_load_more_leaves_list_alone() {
    let fetcher = ScriptedFetcher::with(vec![Ok(page("general", 3)), Err(FetchError::Timeout)]);
    let controller = HeadlinesController::new(Arc::clone(&fetcher), Category::General, 3);

    controller.refresh().await;
    let before = controller.state();

    controller.load_more().await;
    let after = controller.state();
    assert_eq!(urls(&after), urls(&before));
    assert_eq!(after.error, None);
    assert!(!after.is_loading_more);
    assert!(!after.end_of_data);

    // The cursor stayed advanced: the retry asks for page 3
    fetcher.push(Ok(page("page-3", 3)));
    controller.load_more().await;
    assert_eq!(fetcher.calls().last(), Some(&(Category::General, 3, 3)));
    assert_eq!(controller.state().articles.len(), 6);
}

#[tokio::test]
async fn test_failed_refresh_keeps_articles() {
    let fetcher = ScriptedFetcher::with(vec![Ok(page("general", 4)), Err(FetchError::HttpStatus(503))]);
    let controller = HeadlinesController::new(Arc::clone(&fetcher), Category::General, 10);

    controller.refresh().await;
    controller.refresh().await;

    let state = controller.state();
    assert_eq!(state.articles.len(), 4);
    assert!(!state.is_refreshing);
    let error = state.error.unwrap_or_default();
    assert!(error.starts_with("Failed to load headlines:"), "{error}");
    assert!(error.contains("503"), "{error}");
}

#[tokio::test]
async fn test_subscribers_see_every_phase() {
    let fetcher = ScriptedFetcher::with(vec![Ok(page("general", 1))]);
    let controller = HeadlinesController::new(fetcher, Category::General, 20);
    let mut rx = controller.subscribe();

    controller.refresh().await;
    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert!(!state.is_refreshing);
    assert_eq!(state.articles.len(), 1);

    // Nothing to do at end of data: no notification
    controller.load_more().await;
    assert!(!rx.has_changed().unwrap());
}

// ============================================================================
// Gated fetcher
// ============================================================================

struct PendingFetch {
    category: Category,
    page: u32,
    respond: oneshot::Sender<Result<Vec<Article>, FetchError>>,
}

impl PendingFetch {
    fn answer(self, result: Result<Vec<Article>, FetchError>) {
        let _ = self.respond.send(result);
    }
}

struct GatedFetcher {
    calls: mpsc::UnboundedSender<PendingFetch>,
}

impl HeadlineFetcher for GatedFetcher {
    async fn fetch(
        &self,
        category: Category,
        page: u32,
        _page_size: u32,
    ) -> Result<Vec<Article>, FetchError> {
        let (respond, rx) = oneshot::channel();
        self.calls
            .send(PendingFetch {
                category,
                page,
                respond,
            })
            .expect("test dropped the call receiver");
        rx.await.unwrap_or(Err(FetchError::Timeout))
    }
}

fn gated(
    category: Category,
    page_size: u32,
) -> (
    Arc<HeadlinesController<GatedFetcher>>,
    mpsc::UnboundedReceiver<PendingFetch>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = HeadlinesController::new(GatedFetcher { calls: tx }, category, page_size);
    (Arc::new(controller), rx)
}

#[tokio::test]
async fn test_stale_load_more_after_category_switch_is_discarded() {
    let (controller, mut calls) = gated(Category::General, 2);

    let c = Arc::clone(&controller);
    let refresh = tokio::spawn(async move { c.refresh().await });
    calls.recv().await.unwrap().answer(Ok(page("general", 2)));
    refresh.await.unwrap();

    let c = Arc::clone(&controller);
    let load_more = tokio::spawn(async move { c.load_more().await });
    let general_page_2 = calls.recv().await.unwrap();
    assert_eq!((general_page_2.category, general_page_2.page), (Category::General, 2));

    let c = Arc::clone(&controller);
    let switch = tokio::spawn(async move { c.select_category(Category::Sports).await });
    let sports_page_1 = calls.recv().await.unwrap();
    assert_eq!((sports_page_1.category, sports_page_1.page), (Category::Sports, 1));

    sports_page_1.answer(Ok(page("sports", 2)));
    switch.await.unwrap();

    // The general page arrives late and must not land in the sports list
    general_page_2.answer(Ok(page("general-late", 2)));
    load_more.await.unwrap();

    let state = controller.state();
    assert_eq!(state.category, Category::Sports);
    assert_eq!(
        urls(&state),
        vec![
            "https://x/sports/0".to_string(),
            "https://x/sports/1".to_string()
        ]
    );
    assert_eq!(state.current_page, 1);
    assert!(!state.is_loading_more);

    // Paging continues normally in the new category
    let c = Arc::clone(&controller);
    let next = tokio::spawn(async move { c.load_more().await });
    let sports_page_2 = calls.recv().await.unwrap();
    assert_eq!((sports_page_2.category, sports_page_2.page), (Category::Sports, 2));
    sports_page_2.answer(Ok(page("sports-2", 1)));
    next.await.unwrap();
    assert_eq!(controller.state().articles.len(), 3);
}

#[tokio::test]
async fn test_overlapping_refreshes_latest_wins() {
    let (controller, mut calls) = gated(Category::Technology, 5);

    let c = Arc::clone(&controller);
    let first = tokio::spawn(async move { c.refresh().await });
    let first_call = calls.recv().await.unwrap();

    let c = Arc::clone(&controller);
    let second = tokio::spawn(async move { c.refresh().await });
    let second_call = calls.recv().await.unwrap();

    second_call.answer(Ok(page("second", 1)));
    second.await.unwrap();
    first_call.answer(Ok(page("first", 3)));
    first.await.unwrap();

    let state = controller.state();
    assert_eq!(urls(&state), vec!["https://x/second/0".to_string()]);
    assert!(!state.is_refreshing);
}

#[tokio::test]
async fn test_stale_refresh_error_is_discarded() {
    let (controller, mut calls) = gated(Category::Health, 5);

    let c = Arc::clone(&controller);
    let first = tokio::spawn(async move { c.refresh().await });
    let first_call = calls.recv().await.unwrap();

    let c = Arc::clone(&controller);
    let second = tokio::spawn(async move { c.refresh().await });
    calls.recv().await.unwrap().answer(Ok(page("health", 5)));
    second.await.unwrap();

    first_call.answer(Err(FetchError::HttpStatus(500)));
    first.await.unwrap();

    let state = controller.state();
    assert_eq!(state.error, None);
    assert_eq!(state.articles.len(), 5);
}

#[tokio::test]
async fn test_rapid_load_more_issues_one_fetch() {
    let (controller, mut calls) = gated(Category::General, 2);

    let c = Arc::clone(&controller);
    let refresh = tokio::spawn(async move { c.refresh().await });
    calls.recv().await.unwrap().answer(Ok(page("general", 2)));
    refresh.await.unwrap();

    let c = Arc::clone(&controller);
    let first = tokio::spawn(async move { c.load_more().await });
    let pending = calls.recv().await.unwrap();
    assert!(controller.state().is_loading_more);

    // Second call while the first is in flight returns without fetching
    controller.load_more().await;
    assert!(calls.try_recv().is_err());

    pending.answer(Ok(page("general-2", 2)));
    first.await.unwrap();
    assert_eq!(controller.state().articles.len(), 4);
}

#[tokio::test]
async fn test_load_more_suppressed_while_refreshing() {
    let (controller, mut calls) = gated(Category::General, 2);

    let c = Arc::clone(&controller);
    let refresh = tokio::spawn(async move { c.refresh().await });
    let pending = calls.recv().await.unwrap();

    controller.load_more().await;
    assert!(calls.try_recv().is_err());
    assert!(!controller.state().is_loading_more);

    pending.answer(Ok(page("general", 2)));
    refresh.await.unwrap();
    assert_eq!(controller.state().current_page, 1);
}

// ============================================================================
// Intent ordering on a multi-threaded runtime
// ============================================================================

/// Answers every request with a page named after its category.
struct EchoFetcher;

impl HeadlineFetcher for EchoFetcher {
    async fn fetch(
        &self,
        category: Category,
        _page: u32,
        _page_size: u32,
    ) -> Result<Vec<Article>, FetchError> {
        tokio::task::yield_now().await;
        Ok(page(category.as_str(), 2))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_back_to_back_switches_last_intent_wins() {
    for _ in 0..500 {
        let controller = Arc::new(HeadlinesController::new(EchoFetcher, Category::General, 20));

        // Intents are published in key-press order; only the fetches race
        let mut tasks = Vec::new();
        for category in [Category::Business, Category::Entertainment] {
            let pending = controller.begin_select_category(category).unwrap();
            let c = Arc::clone(&controller);
            tasks.push(tokio::spawn(async move { c.complete_refresh(pending).await }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let state = controller.state();
        assert_eq!(state.category, Category::Entertainment);
        assert_eq!(urls(&state)[0], "https://x/entertainment/0");
        assert!(!state.is_refreshing);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_back_to_back_refreshes_last_intent_wins() {
    for _ in 0..500 {
        let controller = Arc::new(HeadlinesController::new(EchoFetcher, Category::Science, 20));

        let first = controller.begin_refresh();
        let second = controller.begin_refresh();
        let c = Arc::clone(&controller);
        let a = tokio::spawn(async move { c.complete_refresh(second).await });
        let c = Arc::clone(&controller);
        let b = tokio::spawn(async move { c.complete_refresh(first).await });
        a.await.unwrap();
        b.await.unwrap();

        let state = controller.state();
        assert_eq!(state.articles.len(), 2);
        assert!(!state.is_refreshing);
    }
}

// ============================================================================
// Invariants over random operation sequences
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Refresh(Result<usize, ()>),
    LoadMore(Result<usize, ()>),
    Select(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let outcome = prop_oneof![
        4 => (0usize..=6).prop_map(Ok::<usize, ()>),
        1 => Just(Err(())),
    ]
    .boxed();
    prop_oneof![
        outcome.clone().prop_map(Op::Refresh),
        outcome.prop_map(Op::LoadMore),
        (0usize..Category::ALL.len()).prop_map(Op::Select),
    ]
}

fn scripted(outcome: &Result<usize, ()>) -> Result<Vec<Article>, FetchError> {
    match outcome {
        Ok(n) => Ok(page("p", *n)),
        Err(()) => Err(FetchError::Timeout),
    }
}

proptest! {
    #[test]
    fn prop_sequential_ops_keep_invariants(ops in proptest::collection::vec(op(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            const PAGE_SIZE: u32 = 5;
            let fetcher = ScriptedFetcher::with(Vec::new());
            let controller = HeadlinesController::new(Arc::clone(&fetcher), Category::General, PAGE_SIZE);

            for op in ops {
                let before = controller.state();
                let calls_before = fetcher.calls().len();

                match &op {
                    Op::Refresh(outcome) => {
                        fetcher.push(scripted(outcome));
                        controller.refresh().await;
                        let after = controller.state();
                        match outcome {
                            Ok(n) => {
                                prop_assert_eq!(after.current_page, 1);
                                prop_assert_eq!(after.articles.len(), *n);
                                prop_assert_eq!(after.end_of_data, *n < PAGE_SIZE as usize);
                                prop_assert_eq!(after.error, None);
                            }
                            Err(()) => {
                                prop_assert_eq!(&after.articles, &before.articles);
                                prop_assert!(after.error.is_some());
                                // The cursor keeps describing the list on screen
                                prop_assert_eq!(after.current_page, before.current_page);
                                prop_assert_eq!(
                                    after.end_of_data,
                                    before.end_of_data || before.articles.is_empty()
                                );
                            }
                        }
                    }
                    Op::LoadMore(outcome) => {
                        if before.end_of_data {
                            controller.load_more().await;
                            prop_assert_eq!(fetcher.calls().len(), calls_before);
                            prop_assert_eq!(controller.state(), before);
                            continue;
                        }
                        fetcher.push(scripted(outcome));
                        controller.load_more().await;
                        let after = controller.state();
                        prop_assert_eq!(after.current_page, before.current_page + 1);
                        prop_assert_eq!(&after.error, &before.error);
                        match outcome {
                            Ok(n) => prop_assert_eq!(after.articles.len(), before.articles.len() + n),
                            Err(()) => {
                                prop_assert_eq!(&after.articles, &before.articles);
                                prop_assert_eq!(after.end_of_data, before.end_of_data);
                            }
                        }
                    }
                    Op::Select(i) => {
                        let category = Category::ALL[*i];
                        if category != before.category {
                            fetcher.push(Ok(page("s", 2)));
                        }
                        controller.select_category(category).await;
                        let after = controller.state();
                        prop_assert_eq!(after.category, category);
                        if category != before.category {
                            prop_assert_eq!(after.current_page, 1);
                            prop_assert_eq!(after.articles.len(), 2);
                        } else {
                            prop_assert_eq!(after, before);
                        }
                    }
                }

                let state = controller.state();
                prop_assert!(!state.is_busy());
                prop_assert!(state.current_page >= 1);
            }
            Ok(())
        })?;
    }
}
