//! Fallback-aware DNS resolution.
//!
//! Custom servers are queried in order for A records; the first non-empty
//! answer wins. When none answers, or none is configured, the platform
//! resolver is used and the answer is tagged `"system"`.

use crate::types::{NpmjackError, ResolutionResult, Result, SYSTEM_RESOLVER};
use async_trait::async_trait;
use dashmap::DashMap;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::TokioAsyncResolver;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_DNS_PORT: u16 = 53;

/// The DNS wire protocol, kept behind a trait.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// A-record query against one server.
    async fn query_a(&self, server: SocketAddr, host: &str, timeout: Duration) -> Result<Vec<IpAddr>>;

    /// Platform resolver lookup.
    async fn system(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// `hickory-resolver` for custom servers, `tokio::net::lookup_host` for the platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct HickoryBackend;

#[async_trait]
impl DnsBackend for HickoryBackend {
    async fn query_a(&self, server: SocketAddr, host: &str, timeout: Duration) -> Result<Vec<IpAddr>> {
        let servers = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.ip_strategy = LookupIpStrategy::Ipv4Only;
        opts.use_hosts_file = false;
        opts.cache_size = 0;

        let resolver = TokioAsyncResolver::tokio(config, opts);
        let lookup = resolver
            .lookup_ip(host)
            .await
            .map_err(|e| NpmjackError::DnsError(format!("{} via {}: {}", host, server, e)))?;

        Ok(lookup.iter().collect())
    }

    async fn system(&self, host: &str) -> Result<Vec<IpAddr>> {
        let addrs: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| NpmjackError::DnsError(format!("{}: {}", host, e)))?
            .map(|addr| addr.ip())
            .collect();

        if addrs.is_empty() {
            return Err(NpmjackError::DnsError(format!("{}: no addresses", host)));
        }
        Ok(addrs)
    }
}

/// A configured DNS server: IP literal or hostname, plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl ServerAddr {
    /// Socket address when the host is an IP literal.
    pub fn literal(&self) -> Option<SocketAddr> {
        self.host
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
struct Server {
    /// The entry as configured; used as the resolver tag.
    label: String,
    addr: ServerAddr,
}

/// Parse `host`, `host:port`, `ip`, `ip:port`, `[v6]` or `[v6]:port`.
/// Port defaults to 53.
pub fn parse_server(raw: &str) -> Option<ServerAddr> {
    let raw = raw.trim();
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Some(ServerAddr {
            host: addr.ip().to_string(),
            port: addr.port(),
        });
    }

    let bare = raw.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Some(ServerAddr {
            host: ip.to_string(),
            port: DEFAULT_DNS_PORT,
        });
    }

    let (host, port) = match raw.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok().filter(|p| *p > 0)?),
        None => (raw, DEFAULT_DNS_PORT),
    };
    if !is_hostname(host) {
        return None;
    }
    Some(ServerAddr {
        host: host.to_ascii_lowercase(),
        port,
    })
}

fn is_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Ordered resolver chain shared by every in-flight request.
pub struct Resolver {
    servers: Vec<Server>,
    timeout: Duration,
    backend: Arc<dyn DnsBackend>,
    last_used: DashMap<String, String>,
}

impl Resolver {
    /// Resolver over `servers` using the hickory backend.
    pub fn new(servers: &[String], timeout: Duration) -> Self {
        Self::with_backend(servers, timeout, Arc::new(HickoryBackend))
    }

    /// Resolver with an explicit backend. Unparseable entries are skipped.
    pub fn with_backend(servers: &[String], timeout: Duration, backend: Arc<dyn DnsBackend>) -> Self {
        let servers = servers
            .iter()
            .filter_map(|label| match parse_server(label) {
                Some(addr) => Some(Server {
                    label: label.trim().to_string(),
                    addr,
                }),
                None => {
                    warn!("Ignoring invalid resolver address: {}", label);
                    None
                }
            })
            .collect();

        Self {
            servers,
            timeout,
            backend,
            last_used: DashMap::new(),
        }
    }

    /// Whether any custom server survived parsing.
    pub fn has_custom(&self) -> bool {
        !self.servers.is_empty()
    }

    /// Resolve `host` through the chain.
    pub async fn resolve(&self, host: &str) -> ResolutionResult {
        for server in &self.servers {
            let query = async {
                let addr = self.server_socket(&server.addr).await?;
                self.backend.query_a(addr, host, self.timeout).await
            };
            match tokio::time::timeout(self.timeout, query).await {
                Ok(Ok(addrs)) if !addrs.is_empty() => {
                    debug!("Resolved {} via {} to {:?}", host, server.label, addrs);
                    self.last_used.insert(host.to_string(), server.label.clone());
                    return ResolutionResult {
                        addrs: Ok(addrs),
                        resolver: server.label.clone(),
                    };
                }
                Ok(Ok(_)) => debug!("No A records for {} from {}", host, server.label),
                Ok(Err(e)) => debug!("DNS resolution failed with resolver {}: {}", server.label, e),
                Err(_) => debug!("DNS query to {} for {} timed out", server.label, host),
            }
        }

        if self.has_custom() {
            debug!("All custom resolvers failed for {}, trying system DNS", host);
        }

        let addrs = self.backend.system(host).await;
        self.last_used.insert(host.to_string(), SYSTEM_RESOLVER.to_string());
        ResolutionResult {
            addrs,
            resolver: SYSTEM_RESOLVER.to_string(),
        }
    }

    /// Address to query for `server`. Hostnames go through the platform resolver.
    async fn server_socket(&self, server: &ServerAddr) -> Result<SocketAddr> {
        if let Some(addr) = server.literal() {
            return Ok(addr);
        }
        let ip = self
            .backend
            .system(&server.host)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| NpmjackError::DnsError(format!("{}: no addresses", server.host)))?;
        Ok(SocketAddr::new(ip, server.port))
    }

    /// Tag of the resolver that last answered for `host`.
    pub fn last_resolver(&self, host: &str) -> String {
        self.last_used
            .get(host)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| SYSTEM_RESOLVER.to_string())
    }
}

/// Installs a [`Resolver`] as reqwest's connection-time DNS hook.
pub struct ResolverHook(pub Arc<Resolver>);

impl Resolve for ResolverHook {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.0);
        Box::pin(async move {
            let result = resolver.resolve(name.as_str()).await;
            let addrs = result
                .addrs
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            let addrs: Addrs = Box::new(addrs.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}
