//! HTTP handlers

pub mod health;
pub mod customers;
pub mod predict;
