//! Reconnaissance agent definition.
//!
//! DNS, WHOIS and subdomain lookups answered from fixtures.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::domains::agents::{Agent, AgentError, AgentResult, Command, CommandInvocation};

/// DNS record types served by `dns-lookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Mx,
    Ns,
    Txt,
}

/// Parameters for `dns-lookup`.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsLookupParams {
    pub domain: String,

    /// Restrict the answer to one record type.
    #[serde(default)]
    pub record_type: Option<RecordType>,
}

/// Parameters for `whois`.
#[derive(Debug, Clone, Deserialize)]
pub struct WhoisParams {
    pub domain: String,
}

/// Parameters for `subdomain-enum`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubdomainEnumParams {
    pub domain: String,

    /// Maximum number of subdomains to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

const SUBDOMAIN_PREFIXES: &[&str] = &["www", "mail", "api", "dev", "staging", "vpn", "cdn"];

/// Reconnaissance agent.
pub struct ReconAgent;

impl ReconAgent {
    pub const ID: &'static str = "recon";
    pub const NAME: &'static str = "Reconnaissance Agent";
    pub const DESCRIPTION: &'static str =
        "Passive reconnaissance: DNS record lookup, WHOIS registration data and subdomain enumeration.";
    pub const VERSION: &'static str = "1.0.0";

    /// Build the agent.
    pub fn build() -> AgentResult<Agent> {
        Agent::builder(Self::ID)
            .name(Self::NAME)
            .description(Self::DESCRIPTION)
            .version(Self::VERSION)
            .capabilities(["dns-lookup", "whois", "subdomain-enum"])
            .command(
                Command::new("dns-lookup", "Resolve DNS records for a domain", dns_lookup)
                    .require(["domain"]),
            )
            .command(
                Command::new("whois", "Fetch registration data for a domain", whois)
                    .require(["domain"]),
            )
            .command(
                Command::new(
                    "subdomain-enum",
                    "Enumerate known subdomains of a domain",
                    subdomain_enum,
                )
                .require(["domain"]),
            )
            .build()
    }
}

/// Reject obviously malformed domain names.
fn check_domain(domain: &str) -> AgentResult<()> {
    let valid = !domain.is_empty()
        && domain.len() <= 253
        && domain.contains('.')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));

    if valid {
        Ok(())
    } else {
        Err(AgentError::execution_failed(format!(
            "Invalid domain name: {}",
            domain
        )))
    }
}

fn fixture_records(domain: &str) -> Vec<(RecordType, String)> {
    vec![
        (RecordType::A, "93.184.216.34".to_string()),
        (RecordType::Aaaa, "2606:2800:220:1:248:1893:25c8:1946".to_string()),
        (RecordType::Mx, format!("10 mail.{}", domain)),
        (RecordType::Ns, format!("ns1.{}", domain)),
        (RecordType::Ns, format!("ns2.{}", domain)),
        (RecordType::Txt, "v=spf1 -all".to_string()),
    ]
}

#[instrument(skip_all)]
async fn dns_lookup(input: CommandInvocation) -> AgentResult<Value> {
    let params: DnsLookupParams = input.parse_params()?;
    check_domain(&params.domain)?;
    info!("DNS lookup requested for '{}'", params.domain);

    let records: Vec<Value> = fixture_records(&params.domain)
        .into_iter()
        .filter(|(kind, _)| params.record_type.is_none_or(|wanted| wanted == *kind))
        .map(|(kind, value)| json!({ "type": kind, "value": value, "ttl": 3600 }))
        .collect();

    Ok(json!({
        "domain": params.domain,
        "records": records,
        "resolvedAt": chrono::Utc::now().to_rfc3339(),
    }))
}

#[instrument(skip_all)]
async fn whois(input: CommandInvocation) -> AgentResult<Value> {
    let params: WhoisParams = input.parse_params()?;
    check_domain(&params.domain)?;
    info!("WHOIS requested for '{}'", params.domain);

    Ok(json!({
        "domain": params.domain,
        "registrar": "Example Registrar, Inc.",
        "createdDate": "1995-08-14T04:00:00Z",
        "expiryDate": "2030-08-13T04:00:00Z",
        "nameServers": [format!("ns1.{}", params.domain), format!("ns2.{}", params.domain)],
        "status": ["clientTransferProhibited"],
    }))
}

#[instrument(skip_all)]
async fn subdomain_enum(input: CommandInvocation) -> AgentResult<Value> {
    let params: SubdomainEnumParams = input.parse_params()?;
    check_domain(&params.domain)?;
    info!("Subdomain enumeration requested for '{}'", params.domain);

    let limit = params.limit.unwrap_or(SUBDOMAIN_PREFIXES.len());
    let subdomains: Vec<String> = SUBDOMAIN_PREFIXES
        .iter()
        .take(limit)
        .map(|prefix| format!("{}.{}", prefix, params.domain))
        .collect();

    Ok(json!({
        "domain": params.domain,
        "count": subdomains.len(),
        "subdomains": subdomains,
    }))
}
