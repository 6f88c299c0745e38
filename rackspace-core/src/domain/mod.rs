//! Core domain types
//!
//! Read-only snapshots of resources owned by the remote services. The local
//! process never mutates these; it fetches a fresh copy whenever it needs one.

pub mod dns;
pub mod job;
pub mod loadbalancer;
