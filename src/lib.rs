pub mod config;
pub mod logger;
pub mod channel;
pub mod slug;
pub mod slug_map;
pub mod content;
pub mod description;
pub mod template;
pub mod view;
pub mod page_size;
pub mod site_builder;
pub mod feed;
pub mod poller;
mod text_utils;
mod test_data;
