pub mod audit;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod kv;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
