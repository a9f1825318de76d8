// src/services/mod.rs

//! Workflows behind the HTTP handlers. Each is generic over the store
//! traits it touches so it can be unit-tested against in-memory fakes.

pub mod auth;
pub mod profile;
pub mod questions;
pub mod scoring;
