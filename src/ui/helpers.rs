//! Helpers for spawning controller work off the UI task.
//!
//! Controller operations await the network, so the event loop never awaits
//! them inline. State changes are published on the UI task as the key is
//! handled; the fetch becomes a tokio task whose result reaches the UI through
//! the controller's watch channel.

use crate::app::App;
use crate::news::{Category, HeadlineFetcher};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking background task would otherwise vanish inside the runtime with
/// nothing in the log.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

fn spawn_task(task: &'static str, future: impl Future<Output = ()> + Send + 'static) {
    tokio::spawn(async move {
        if let Err(panic_msg) = catch_task_panic(future).await {
            tracing::error!(task, error = %panic_msg, "Background task panicked");
        }
    });
}

/// Reload the current category from page 1 (initial load and retry).
///
/// The new session is published before this returns, so intents take effect
/// in key-press order; only the fetch runs on the spawned task.
pub(super) fn spawn_refresh<F, S>(app: &App<F, S>)
where
    F: HeadlineFetcher + 'static,
{
    let controller = Arc::clone(&app.controller);
    let pending = controller.begin_refresh();
    spawn_task("refresh", async move { controller.complete_refresh(pending).await });
}

/// Switch categories now and fetch the first page in the background.
pub(super) fn spawn_select_category<F, S>(app: &App<F, S>, category: Category)
where
    F: HeadlineFetcher + 'static,
{
    let controller = Arc::clone(&app.controller);
    let Some(pending) = controller.begin_select_category(category) else {
        return;
    };
    spawn_task("select_category", async move {
        controller.complete_refresh(pending).await
    });
}

pub(super) fn spawn_load_more<F, S>(app: &App<F, S>)
where
    F: HeadlineFetcher + 'static,
{
    let controller = Arc::clone(&app.controller);
    spawn_task("load_more", async move { controller.load_more().await });
}
