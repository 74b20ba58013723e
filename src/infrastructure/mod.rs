pub mod auth;
pub mod config;
pub mod db;
pub mod fetcher;
pub mod http;
pub mod notifier;
pub mod repositories;
