//! Host allow-list deciding which callback URLs are authoritative.

use url::{Host, Url};

/// Development hosts that must never be rendered inside the checkout browser.
pub const DEFAULT_LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "10.0.2.2", "0.0.0.0"];

/// Allow-list entry prefix that extends trust to subdomains.
const WILDCARD_PREFIX: &str = "*.";

/// Which hosts may report a payment outcome, and which hosts are blocked.
///
/// A host is trusted when it equals an allow-listed host. Subdomains are only
/// accepted for entries written as `*.parent`: `*.back2use.vn` matches
/// `api.back2use.vn` but neither `back2use.vn` nor `evilback2use.vn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    trusted_hosts: Vec<String>,
    loopback_hosts: Vec<String>,
}

impl TrustPolicy {
    /// A policy trusting exactly `trusted_hosts`, with the default loopback list.
    pub fn new<I, S>(trusted_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            trusted_hosts: trusted_hosts
                .into_iter()
                .map(|h| normalize(h.as_ref()))
                .filter(|h| !h.is_empty())
                .collect(),
            loopback_hosts: DEFAULT_LOOPBACK_HOSTS.iter().map(|h| (*h).to_owned()).collect(),
        }
    }

    /// A policy trusting the backend the app talks to.
    pub fn for_backend(base_url: &Url) -> Self {
        Self::new(base_url.host_str())
    }

    pub fn with_trusted_host(mut self, host: &str) -> Self {
        let host = normalize(host);
        if !host.is_empty() && !self.trusted_hosts.contains(&host) {
            self.trusted_hosts.push(host);
        }
        self
    }

    /// Replace the loopback list.
    pub fn with_loopback_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.loopback_hosts = hosts.into_iter().map(|h| normalize(h.as_ref())).collect();
        self
    }

    pub fn trusted_hosts(&self) -> &[String] {
        &self.trusted_hosts
    }

    pub fn is_trusted(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = normalize(host);
        self.trusted_hosts
            .iter()
            .any(|trusted| match trusted.strip_prefix(WILDCARD_PREFIX) {
                Some(parent) => host
                    .strip_suffix(parent)
                    .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
                None => host == *trusted,
            })
    }

    pub fn is_loopback(&self, url: &Url) -> bool {
        match url.host() {
            Some(Host::Ipv4(ip)) if ip.is_loopback() => true,
            Some(Host::Ipv6(ip)) if ip.is_loopback() => true,
            Some(_) => url
                .host_str()
                .map(normalize)
                .is_some_and(|host| self.loopback_hosts.contains(&host)),
            None => false,
        }
    }
}

fn normalize(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}
