//! Cloud DNS command handlers
//!
//! Updates a single domain, then the contact email of every domain on the
//! account, awaiting the asynchronous job after each change.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use rackspace_client::{JobAwaiter, RackspaceClient};
use rackspace_core::domain::dns::Domain;
use rackspace_core::dto::dns::UpdateDomain;

/// DNS subcommands
#[derive(Subcommand)]
pub enum DnsCommands {
    /// Update one domain, then the email address of every domain
    UpdateDomains {
        /// Domain whose email is used for the batch update
        #[arg(long, default_value = "jclouds-example.com")]
        name: String,

        /// Domain that gets the single update
        #[arg(long, default_value = "alt-jclouds-example.com")]
        alt_name: String,

        /// TTL to set on the single domain
        #[arg(long, default_value_t = 600001)]
        ttl: u32,
    },
    /// List all domains
    List,
}

/// Handle DNS commands
pub async fn handle_dns_command(command: DnsCommands, client: &RackspaceClient) -> Result<()> {
    match command {
        DnsCommands::UpdateDomains {
            name,
            alt_name,
            ttl,
        } => {
            update_domain(client, &alt_name, ttl).await?;
            update_domains(client, &name).await
        }
        DnsCommands::List => list_domains(client).await,
    }
}

/// Update email, TTL and comment of a single domain
async fn update_domain(client: &RackspaceClient, alt_name: &str, ttl: u32) -> Result<()> {
    println!("{}", "Update Domain".bold());

    let domain = client
        .find_domain_by_name(alt_name)
        .await
        .with_context(|| format!("Failed to look up domain {}", alt_name))?;

    let update = UpdateDomain::builder()
        .email(format!("jcloudie@{}", alt_name))
        .ttl(ttl)
        .comment("Hello Domain Update")
        .build();

    let job = client
        .update_domain(domain.id, &update)
        .await
        .with_context(|| format!("Failed to submit update for domain {}", alt_name))?;

    JobAwaiter::new(client, client.config().await_config.clone())
        .await_one(job.job_id)
        .await
        .with_context(|| format!("Update of domain {} did not complete", alt_name))?;

    let updated = client.get_domain(domain.id).await?;
    print_domain(&updated);

    Ok(())
}

/// Set the same email address on every domain in one batch
async fn update_domains(client: &RackspaceClient, name: &str) -> Result<()> {
    println!("{}", "Update Domains".bold());

    let ids: Vec<u64> = client.list_domains().await?.iter().map(|d| d.id).collect();
    let email = format!("jclouder@{}", name);

    let job = client
        .update_domain_emails(&ids, &email)
        .await
        .context("Failed to submit batch email update")?;

    JobAwaiter::new(client, client.config().await_config.clone())
        .await_one(job.job_id)
        .await
        .with_context(|| format!("Email update of {} domain(s) did not complete", ids.len()))?;

    for domain in client.list_domains().await? {
        print_domain(&domain);
    }

    Ok(())
}

/// List all domains
async fn list_domains(client: &RackspaceClient) -> Result<()> {
    let domains = client.list_domains().await?;

    if domains.is_empty() {
        println!("{}", "No domains found.".yellow());
    } else {
        println!("{}", format!("Found {} domain(s):", domains.len()).bold());
        println!();
        for domain in domains {
            print_domain(&domain);
        }
    }

    Ok(())
}

/// Print a domain summary
fn print_domain(domain: &Domain) {
    println!("  {} {} {}", "▸".cyan(), domain.name.bold(), format!("({})", domain.id).dimmed());
    if let Some(email) = &domain.email_address {
        println!("    Email:   {}", email);
    }
    if let Some(ttl) = domain.ttl {
        println!("    TTL:     {}", ttl);
    }
    if let Some(comment) = &domain.comment {
        println!("    Comment: {}", comment.dimmed());
    }
    if let Some(updated) = domain.updated {
        println!(
            "    Updated: {}",
            updated.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
}
