// src/models/mod.rs

pub mod profile;
pub mod question;
pub mod submission;
pub mod user;
