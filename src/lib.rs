//! Idea Board library.
//!
//! A service where users post ideas, like them, and discuss them in comment
//! threads, exposed as a JSON API over SQLite.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod web;
