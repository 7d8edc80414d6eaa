//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, controller state changes, and periodic ticks.

use crate::app::App;
use crate::controller::FeedState;
use crate::news::HeadlineFetcher;
use crate::storage::FlagStore;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::watch;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

use super::helpers::{spawn_load_more, spawn_refresh};
use super::input::handle_input;
use super::render::render;

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// SIGTERM and SIGINT, merged into one future per loop iteration.
struct ShutdownSignals {
    #[cfg(unix)]
    term: Signal,
    #[cfg(unix)]
    int: Signal,
}

impl ShutdownSignals {
    fn install() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            term: signal(SignalKind::terminate())?,
            #[cfg(unix)]
            int: signal(SignalKind::interrupt())?,
        })
    }

    /// Resolves with the signal name once either arrives.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        std::future::pending().await
    }
}

/// Raw mode plus alternate screen; both are undone on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout))?,
        })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restores the terminal before the default panic output is printed.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        previous(info);
    }));
}

/// Drive the TUI until the user quits, a shutdown signal arrives or the
/// terminal event stream ends.
///
/// The loop multiplexes shutdown signals, key presses, controller state
/// changes and a 250ms tick that expires status messages. The first page of
/// the current category is requested before the first frame.
pub async fn run<F, S>(app: &mut App<F, S>, mut state_rx: watch::Receiver<FeedState>) -> Result<()>
where
    F: HeadlineFetcher + 'static,
    S: FlagStore,
{
    install_panic_hook();
    let mut signals = ShutdownSignals::install()?;
    let mut guard = TerminalGuard::enter()?;
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    app.apply_state(state_rx.borrow_and_update().clone());
    spawn_refresh(app);

    loop {
        if app.needs_redraw {
            guard.terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        tokio::select! {
            biased;

            name = signals.recv() => {
                tracing::info!(signal = name, "Shutting down");
                break;
            }

            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    app.needs_redraw = true;
                    match handle_input(app, key.code, key.modifiers).await {
                        Ok(Action::Quit) => break,
                        Ok(Action::Continue) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Input handler failed");
                            app.set_status(format!("Error: {:#}", e));
                        }
                    }
                }
                Some(Ok(Event::Resize(..))) => app.needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Terminal event stream failed");
                    break;
                }
                None => break,
            },

            Ok(()) = state_rx.changed() => {
                app.apply_state(state_rx.borrow_and_update().clone());
            }

            _ = tick.tick() => {
                if app.clear_expired_status() {
                    app.needs_redraw = true;
                }
            }
        }

        if app.take_load_more_trigger() {
            tracing::debug!(
                selected = app.selected,
                loaded = app.feed.articles.len(),
                "Near end of list, loading more"
            );
            spawn_load_more(app);
        }
    }

    Ok(())
}
