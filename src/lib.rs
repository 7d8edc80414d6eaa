//! Terminal reader for NewsAPI top headlines.
//!
//! - [`news`]: headline types and the HTTP fetcher
//! - [`controller`]: pagination and category state, published over a watch channel
//! - [`storage`]: read/favorite flag sets and session preferences in SQLite
//! - [`app`] and [`ui`]: the ratatui front end

pub mod app;
pub mod config;
pub mod controller;
pub mod keybindings;
pub mod news;
pub mod storage;
pub mod ui;
pub mod util;
