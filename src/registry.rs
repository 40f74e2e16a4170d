//! # Parser Registry
//!
//! Maps an inbound email's sender to a registered extraction strategy.
//!
//! Routing runs in two global tiers: every registration's exact-email
//! patterns are checked before any registration's domain patterns. A later
//! registration's exact address therefore beats an earlier registration's
//! domain. Within a tier, registration order is the final tie-break.
//!
//! The registry is an explicit object built once at startup and injected
//! where routing is needed; there is no ambient global state.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::ingest::types::{EmailMessage, ExtractionStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactEmail,
    Domain,
}

pub struct ParserRegistration {
    strategy: Arc<dyn ExtractionStrategy>,
    email_patterns: HashSet<String>,
    domain_patterns: HashSet<String>,
}

/// Successful routing result.
pub struct RouteMatch {
    pub strategy: Arc<dyn ExtractionStrategy>,
    /// Registry key of the matched strategy.
    pub source: String,
    pub match_type: MatchType,
}

/// Summary of one registration, for the debug surface.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationInfo {
    pub source: String,
    pub display_name: String,
    pub email_patterns: Vec<String>,
    pub domain_patterns: Vec<String>,
}

#[derive(Default)]
pub struct ParserRegistry {
    registrations: Vec<ParserRegistration>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy for a set of exact sender addresses and,
    /// optionally, whole sender domains. Patterns are stored lowercased.
    pub fn register(
        &mut self,
        strategy: Arc<dyn ExtractionStrategy>,
        email_patterns: &[&str],
        domain_patterns: &[&str],
    ) {
        self.registrations.push(ParserRegistration {
            strategy,
            email_patterns: email_patterns
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect(),
            domain_patterns: domain_patterns
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect(),
        });
    }

    /// Route a From header to a strategy, or None when no pattern matches.
    pub fn find_parser(&self, from_header: &str) -> Option<RouteMatch> {
        let address = extract_address(from_header);
        let domain = address_domain(&address);

        // Tier 1: exact addresses, across ALL registrations.
        for reg in &self.registrations {
            if reg.email_patterns.contains(&address) {
                return Some(RouteMatch {
                    strategy: Arc::clone(&reg.strategy),
                    source: reg.strategy.source().to_string(),
                    match_type: MatchType::ExactEmail,
                });
            }
        }

        // Tier 2: domains, in registration order.
        if !domain.is_empty() {
            for reg in &self.registrations {
                if reg.domain_patterns.contains(&domain) {
                    return Some(RouteMatch {
                        strategy: Arc::clone(&reg.strategy),
                        source: reg.strategy.source().to_string(),
                        match_type: MatchType::Domain,
                    });
                }
            }
        }

        None
    }

    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.registrations
            .iter()
            .map(|reg| {
                let mut email_patterns: Vec<String> =
                    reg.email_patterns.iter().cloned().collect();
                email_patterns.sort();
                let mut domain_patterns: Vec<String> =
                    reg.domain_patterns.iter().cloned().collect();
                domain_patterns.sort();
                RegistrationInfo {
                    source: reg.strategy.source().to_string(),
                    display_name: reg.strategy.display_name().to_string(),
                    email_patterns,
                    domain_patterns,
                }
            })
            .collect()
    }
}

/// Bare address from a `"Name <addr>"` or plain-address header, lowercased.
pub fn extract_address(from_header: &str) -> String {
    let addr = match (from_header.find('<'), from_header.find('>')) {
        (Some(start), Some(end)) if start < end => &from_header[start + 1..end],
        _ => from_header.trim(),
    };
    addr.trim().to_lowercase()
}

/// Substring after the first `@`, or empty when there is none.
pub fn address_domain(address: &str) -> String {
    address
        .split_once('@')
        .map(|(_, d)| d.to_string())
        .unwrap_or_default()
}

/// Structured per-email audit record, one per processed message.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAudit {
    pub message_id: String,
    pub from: String,
    pub subject: String,
    pub matched_source: Option<String>,
    pub matched_parser: Option<String>,
    pub candidate_count: usize,
    pub errors: Vec<String>,
}

impl EmailAudit {
    pub fn for_message(
        message: &EmailMessage,
        route: Option<&RouteMatch>,
        candidate_count: usize,
        errors: Vec<String>,
    ) -> Self {
        Self {
            message_id: message.message_id.clone(),
            from: message.from.clone(),
            subject: message.subject.clone(),
            matched_source: route.map(|r| r.source.clone()),
            matched_parser: route.map(|r| r.strategy.display_name().to_string()),
            candidate_count,
            errors,
        }
    }
}
