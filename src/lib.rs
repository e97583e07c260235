//! Library crate for speedmodelling-back, exposing modules for binaries,
//! racer agents and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod racer;
pub mod routes;
pub mod services;
pub mod state;
