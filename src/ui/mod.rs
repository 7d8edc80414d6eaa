//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `helpers` - Spawning controller work off the UI task
//! - `render` - Layout and view dispatch
//! - `categories` - Category chip bar
//! - `articles` - Headline list widget
//! - `preview` - Selected headline details
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay

mod articles;
mod categories;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod preview;
mod render;
mod status;

pub use articles::format_relative_time;
pub use loop_runner::{run, Action};
