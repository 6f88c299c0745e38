//! Cloud Load Balancers command handlers
//!
//! Creates a load balancer in front of existing servers and waits for it to
//! become active.

use std::net::Ipv4Addr;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use colored::*;
use rackspace_client::RackspaceClient;
use rackspace_core::domain::loadbalancer::{
    Algorithm, LoadBalancer, LoadBalancerStatus, VirtualIpType,
};
use rackspace_core::dto::loadbalancer::{AddNode, CreateLoadBalancer};

/// Load balancer subcommands
#[derive(Subcommand)]
pub enum ClbCommands {
    /// Create a load balancer for servers that already exist
    CreateWithExistingServers {
        /// Load balancer name
        #[arg(long, default_value = "jclouds-example")]
        name: String,

        /// Back-end node as IPV4_ADDRESS[:WEIGHT]; repeat for more nodes
        #[arg(long = "node", default_values_t = default_nodes())]
        nodes: Vec<NodeSpec>,

        /// Port the nodes listen on
        #[arg(long, default_value_t = 80)]
        node_port: u16,
    },
    /// List load balancers in the zone
    List,
}

/// Handle load balancer commands
pub async fn handle_clb_command(
    command: ClbCommands,
    zone: &str,
    client: &RackspaceClient,
) -> Result<()> {
    match command {
        ClbCommands::CreateWithExistingServers {
            name,
            nodes,
            node_port,
        } => {
            let add_nodes = create_node_requests(&nodes, node_port);
            create_load_balancer(client, zone, &name, add_nodes).await
        }
        ClbCommands::List => list_load_balancers(client, zone).await,
    }
}

/// A node address with an optional weight, parsed from `IPV4_ADDRESS[:WEIGHT]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub address: String,
    pub weight: Option<u8>,
}

impl FromStr for NodeSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (address, weight) = match s.rsplit_once(':') {
            Some((address, weight)) => {
                let weight = weight
                    .parse::<u8>()
                    .map_err(|e| format!("invalid weight '{}': {}", weight, e))?;
                (address, Some(weight))
            }
            None => (s, None),
        };

        if address.is_empty() {
            return Err("node address cannot be empty".to_string());
        }
        if address.parse::<Ipv4Addr>().is_err() {
            return Err(format!("'{}' is not an IPv4 address", address));
        }

        Ok(Self {
            address: address.to_string(),
            weight,
        })
    }
}

impl std::fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.weight {
            Some(weight) => write!(f, "{}:{}", self.address, weight),
            None => f.write_str(&self.address),
        }
    }
}

/// Example addresses only; substitute the private IPs of real servers
fn default_nodes() -> Vec<NodeSpec> {
    vec![
        NodeSpec {
            address: "10.180.0.1".to_string(),
            weight: Some(20),
        },
        NodeSpec {
            address: "10.180.0.2".to_string(),
            weight: Some(10),
        },
    ]
}

/// Turn node specs into enabled node requests
fn create_node_requests(nodes: &[NodeSpec], port: u16) -> Vec<AddNode> {
    nodes
        .iter()
        .map(|spec| {
            let node = AddNode::new(spec.address.clone(), port);
            match spec.weight {
                Some(weight) => node.weight(weight),
                None => node,
            }
        })
        .collect()
}

/// Create the load balancer and wait for it to become active
///
/// Browsing to the address afterwards shows "Service Unavailable" unless the
/// nodes are real servers.
async fn create_load_balancer(
    client: &RackspaceClient,
    zone: &str,
    name: &str,
    nodes: Vec<AddNode>,
) -> Result<()> {
    println!("{}", "Create Cloud Load Balancer".bold());

    let request = CreateLoadBalancer::builder(name, "HTTP", 80)
        .algorithm(Algorithm::WeightedLeastConnections)
        .nodes(nodes)
        .virtual_ip_type(VirtualIpType::Public)
        .build();

    let created = client
        .create_load_balancer(zone, &request)
        .await
        .with_context(|| format!("Failed to create load balancer {}", name))?;

    // Set RUST_LOG=rackspace_client=debug to watch the polling
    let load_balancer = client
        .await_load_balancer_active(zone, created.id, client.config().await_config.clone())
        .await
        .with_context(|| format!("Load balancer {} ({}) did not become active", created.name, created.id))?;

    print_load_balancer(&load_balancer);

    let address = load_balancer
        .public_ipv4()
        .ok_or_else(|| anyhow!("Public IPv4 address not found."))?;
    println!("  Go to {}", format!("http://{}", address).cyan());

    Ok(())
}

/// List load balancers in a zone
async fn list_load_balancers(client: &RackspaceClient, zone: &str) -> Result<()> {
    let load_balancers = client.list_load_balancers(zone).await?;

    if load_balancers.is_empty() {
        println!("{}", format!("No load balancers found in {}.", zone).yellow());
    } else {
        println!(
            "{}",
            format!("Found {} load balancer(s) in {}:", load_balancers.len(), zone).bold()
        );
        println!();
        for load_balancer in load_balancers {
            print_load_balancer(&load_balancer);
        }
    }

    Ok(())
}

/// Print a load balancer summary
fn print_load_balancer(load_balancer: &LoadBalancer) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        load_balancer.name.bold(),
        format!("({})", load_balancer.id).dimmed()
    );
    println!("    Status:   {}", colorize_status(load_balancer.status));
    println!(
        "    Listener: {}/{}",
        load_balancer.protocol, load_balancer.port
    );
    for node in &load_balancer.nodes {
        println!(
            "    Node:     {}:{} {:?}{}",
            node.address,
            node.port,
            node.condition,
            node.weight
                .map(|w| format!(" weight {}", w))
                .unwrap_or_default()
        );
    }
    for vip in &load_balancer.virtual_ips {
        println!(
            "    VIP:      {} {:?} {:?}",
            vip.address, vip.vip_type, vip.ip_version
        );
    }
    println!();
}

/// Colorize load balancer status for display
fn colorize_status(status: LoadBalancerStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        LoadBalancerStatus::Active => status_str.green(),
        LoadBalancerStatus::Build | LoadBalancerStatus::PendingUpdate => status_str.cyan(),
        LoadBalancerStatus::Unrecognized => status_str.dimmed(),
        _ => status_str.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackspace_core::domain::loadbalancer::NodeCondition;

    #[test]
    fn test_node_spec_parsing() {
        assert_eq!(
            "10.180.0.1:20".parse::<NodeSpec>().unwrap(),
            NodeSpec {
                address: "10.180.0.1".to_string(),
                weight: Some(20)
            }
        );
        assert_eq!("10.180.0.3".parse::<NodeSpec>().unwrap().weight, None);
        assert!("10.180.0.1:heavy".parse::<NodeSpec>().is_err());
        assert!(":20".parse::<NodeSpec>().is_err());
    }

    #[test]
    fn test_node_spec_rejects_non_ipv4() {
        assert!("2001:db8::1".parse::<NodeSpec>().is_err());
        assert!("[2001:db8::1]:20".parse::<NodeSpec>().is_err());
        assert!("web-1:20".parse::<NodeSpec>().is_err());
    }

    #[test]
    fn test_node_spec_display_round_trips() {
        for spec in default_nodes() {
            assert_eq!(spec.to_string().parse::<NodeSpec>().unwrap(), spec);
        }
    }

    #[test]
    fn test_default_node_requests() {
        let nodes = create_node_requests(&default_nodes(), 80);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].address, "10.180.0.1");
        assert_eq!(nodes[0].weight, Some(20));
        assert_eq!(nodes[1].weight, Some(10));
        assert!(nodes.iter().all(|n| n.condition == NodeCondition::Enabled && n.port == 80));
    }
}
