//! Cloud Load Balancers domain types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A load balancer as reported by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub id: u64,
    pub name: String,
    pub protocol: String,
    pub port: u16,
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    pub status: LoadBalancerStatus,
    /// Omitted by the list endpoint
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub virtual_ips: Vec<VirtualIp>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    #[serde(default)]
    pub updated: Option<Timestamp>,
}

impl LoadBalancer {
    /// Address of the first public IPv4 virtual IP, if the load balancer has one
    pub fn public_ipv4(&self) -> Option<&str> {
        self.virtual_ips
            .iter()
            .find(|vip| vip.vip_type == VirtualIpType::Public && vip.ip_version == IpVersion::Ipv4)
            .map(|vip| vip.address.as_str())
    }
}

/// Wrapper the service uses for timestamps: `{"time": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub time: DateTime<Utc>,
}

/// Provisioning status of a load balancer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadBalancerStatus {
    Active,
    Build,
    PendingUpdate,
    PendingDelete,
    Suspended,
    Error,
    Deleted,
    #[serde(other)]
    Unrecognized,
}

impl LoadBalancerStatus {
    /// Statuses from which the load balancer will never become active on its own
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Error | Self::Suspended | Self::Deleted | Self::PendingDelete
        )
    }
}

impl fmt::Display for LoadBalancerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Build => "BUILD",
            Self::PendingUpdate => "PENDING_UPDATE",
            Self::PendingDelete => "PENDING_DELETE",
            Self::Suspended => "SUSPENDED",
            Self::Error => "ERROR",
            Self::Deleted => "DELETED",
            Self::Unrecognized => "UNRECOGNIZED",
        };
        f.write_str(s)
    }
}

/// Balancing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    LeastConnections,
    Random,
    RoundRobin,
    WeightedLeastConnections,
    WeightedRoundRobin,
}

/// A back-end node receiving traffic from a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: u64,
    pub address: String,
    pub port: u16,
    pub condition: NodeCondition,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub weight: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeCondition {
    Enabled,
    Disabled,
    Draining,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualIp {
    pub id: u64,
    pub address: String,
    #[serde(rename = "type")]
    pub vip_type: VirtualIpType,
    pub ip_version: IpVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VirtualIpType {
    Public,
    Servicenet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpVersion {
    Ipv4,
    Ipv6,
}
