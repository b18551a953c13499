//! Commerce License - License lifecycle engine for purchased privileges.
//!
//! Licenses are created when an order is placed, activated when it is
//! fulfilled (or on placement, per offering), and canceled with the order.
//! Every entry into and exit from `active` runs exactly one grant or revoke
//! hook of the license's kind.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
