//! Cloud Load Balancers request bodies

use serde::{Deserialize, Serialize};

use crate::domain::loadbalancer::{Algorithm, NodeCondition, VirtualIpType};

/// A node to attach when creating a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddNode {
    pub address: String,
    pub port: u16,
    pub condition: NodeCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
}

impl AddNode {
    /// An enabled node with no explicit weight
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            condition: NodeCondition::Enabled,
            weight: None,
        }
    }

    pub fn condition(mut self, condition: NodeCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn weight(mut self, weight: u8) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Request to create a load balancer
///
/// ```
/// use rackspace_core::domain::loadbalancer::Algorithm;
/// use rackspace_core::dto::loadbalancer::{AddNode, CreateLoadBalancer};
///
/// let create = CreateLoadBalancer::builder("jclouds-example", "HTTP", 80)
///     .algorithm(Algorithm::WeightedLeastConnections)
///     .node(AddNode::new("10.180.0.1", 80).weight(20))
///     .build();
/// assert!(create.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoadBalancer {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    pub nodes: Vec<AddNode>,
    pub virtual_ips: Vec<VirtualIpRequest>,
}

/// Virtual IP allocation request; the service picks the address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualIpRequest {
    #[serde(rename = "type")]
    pub vip_type: VirtualIpType,
}

impl CreateLoadBalancer {
    pub fn builder(
        name: impl Into<String>,
        protocol: impl Into<String>,
        port: u16,
    ) -> CreateLoadBalancerBuilder {
        CreateLoadBalancerBuilder {
            inner: CreateLoadBalancer {
                name: name.into(),
                protocol: protocol.into(),
                port,
                algorithm: None,
                nodes: Vec::new(),
                virtual_ips: Vec::new(),
            },
        }
    }

    /// Checks the constraints the service would otherwise reject with a 400
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("load balancer name cannot be empty".to_string());
        }
        if self.name.len() > 128 {
            return Err("load balancer name must be at most 128 characters".to_string());
        }
        if self.nodes.is_empty() {
            return Err("at least one node is required".to_string());
        }
        if self.virtual_ips.is_empty() {
            return Err("a virtual IP type is required".to_string());
        }
        for node in &self.nodes {
            if let Some(weight) = node.weight {
                if !(1..=100).contains(&weight) {
                    return Err(format!(
                        "node {} weight must be between 1 and 100, got {}",
                        node.address, weight
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct CreateLoadBalancerBuilder {
    inner: CreateLoadBalancer,
}

impl CreateLoadBalancerBuilder {
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.inner.algorithm = Some(algorithm);
        self
    }

    pub fn node(mut self, node: AddNode) -> Self {
        self.inner.nodes.push(node);
        self
    }

    pub fn nodes(mut self, nodes: impl IntoIterator<Item = AddNode>) -> Self {
        self.inner.nodes.extend(nodes);
        self
    }

    /// Replaces any previously requested virtual IP
    pub fn virtual_ip_type(mut self, vip_type: VirtualIpType) -> Self {
        self.inner.virtual_ips = vec![VirtualIpRequest { vip_type }];
        self
    }

    /// Builds the request, defaulting to a public virtual IP
    pub fn build(mut self) -> CreateLoadBalancer {
        if self.inner.virtual_ips.is_empty() {
            self.inner.virtual_ips.push(VirtualIpRequest {
                vip_type: VirtualIpType::Public,
            });
        }
        self.inner
    }
}
