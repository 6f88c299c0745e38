//! Data Transfer Objects for the mutating API calls
//!
//! Request bodies are built with small fluent builders and serialized in the
//! camelCase shape the Rackspace APIs expect.

pub mod dns;
pub mod loadbalancer;
