//! Interactive terminal surface: one-shot commands and the menu loop.

mod commands;
mod menu;

pub use commands::*;
pub use menu::*;
