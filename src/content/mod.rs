//! Turns one channel block into the HTML fragment shown on its page.

pub mod classifier;
pub mod links;
pub mod markdown;
pub mod text_blocks;

pub use classifier::render_content;
