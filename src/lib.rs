pub mod actions;
pub mod api;
pub mod config;
pub mod demo_api;
pub mod http_client;
pub mod markup;
pub mod models;
pub mod persist;
pub mod rank;
pub mod session;
pub mod status;
pub mod view;
