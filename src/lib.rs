//! Bookshelf Backend - Subscription Billing Core
//!
//! This crate implements the billing state-synchronization engine for the
//! My Bookshelf reading platform: customer provisioning, hosted checkout,
//! webhook-driven reconciliation of subscription state, cancellation, and
//! the premium access gate.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
