//! Helper functions shared by the loader and the template filters

mod date;
mod html;

pub use date::*;
pub use html::*;
