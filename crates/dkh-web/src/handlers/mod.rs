//! Request handlers

pub mod api;
pub mod error;
pub mod pages;
