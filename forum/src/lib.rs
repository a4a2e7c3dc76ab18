pub mod api;
pub mod cli;
pub mod error;
pub mod feed;
pub mod models;
pub mod post_view;
pub mod services;
pub mod session;
pub mod settings;
pub mod timer;
