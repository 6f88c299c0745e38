//! Rackspace Core
//!
//! Core types shared by the Rackspace Cloud DNS and Cloud Load Balancers
//! client and the example workflows built on it.
//!
//! This crate contains:
//! - Domain types: entities returned by the remote APIs (domains, jobs, load balancers)
//! - DTOs: request bodies for the mutating calls, with fluent builders

pub mod domain;
pub mod dto;
