//! Bridge REST API adapter.

pub mod rest;
