pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod fetch_error;
pub mod geo;
pub mod scoring;
pub mod seed;
pub mod services;
pub mod weather;
