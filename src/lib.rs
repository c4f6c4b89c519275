pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod geoip;
pub mod methods;
pub mod models;
pub mod normalizer;
pub mod prayer;
pub mod schedule;
pub mod service;
