//! HTTP client for target fetches.

use crate::config::Options;
use crate::transport::resolver::{Resolver, ResolverHook};
use crate::types::{Result, SYSTEM_RESOLVER};
use reqwest::{Client, Proxy};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A fetched target body with its status.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

/// Shared HTTP client wired to the resolver chain.
pub struct Transport {
    client: Client,
    resolver: Option<Arc<Resolver>>,
}

impl Transport {
    /// Build the client. The resolver hook is installed only when the
    /// resolver has custom servers; an invalid proxy is ignored.
    pub fn new(options: &Options, resolver: Option<Arc<Resolver>>) -> Result<Self> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .http1_only()
            .pool_max_idle_per_host(options.concurrency.max(1))
            .pool_idle_timeout(Duration::from_secs(30));

        if options.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(options.timeout));
        }

        if !options.user_agent.is_empty() {
            builder = builder.user_agent(&options.user_agent);
        }

        let resolver = resolver.filter(|r| r.has_custom());
        if let Some(resolver) = &resolver {
            builder = builder.dns_resolver(Arc::new(ResolverHook(Arc::clone(resolver))));
        }

        if let Some(raw) = &options.proxy {
            match proxy_url(raw).map(|url| Proxy::all(&url)) {
                Some(Ok(proxy)) => {
                    debug!("Using proxy {}", raw);
                    builder = builder.proxy(proxy);
                }
                Some(Err(e)) => warn!("Ignoring proxy {}: {}", raw, e),
                None => warn!("Ignoring invalid proxy address {} (expected host:port)", raw),
            }
        }

        Ok(Self {
            client: builder.build()?,
            resolver,
        })
    }

    /// Underlying client, shared with the claim checker.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url`. Non-success statuses are returned, not treated as errors.
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        Ok(Page { status, body })
    }

    /// Resolver tag for the host of `url`. IP literals bypass DNS and count as system.
    pub fn resolver_for(&self, url: &str) -> String {
        let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            Some(host) => host,
            None => return SYSTEM_RESOLVER.to_string(),
        };

        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if bare.parse::<IpAddr>().is_ok() {
            return SYSTEM_RESOLVER.to_string();
        }

        match &self.resolver {
            Some(resolver) => resolver.last_resolver(&host),
            None => SYSTEM_RESOLVER.to_string(),
        }
    }
}

/// Validate a `host:port` proxy (an `http://` prefix is tolerated) and
/// return the proxy URL.
pub fn proxy_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let authority = raw
        .strip_prefix("http://")
        .or_else(|| raw.strip_prefix("https://"))
        .unwrap_or(raw)
        .trim_end_matches('/');

    let (host, port) = authority.rsplit_once(':')?;
    if host.is_empty() || host.contains('/') || port.parse::<u16>().ok()? == 0 {
        return None;
    }
    Some(format!("http://{}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_proxy_url() {
        assert_eq!(proxy_url("127.0.0.1:8080"), Some("http://127.0.0.1:8080".to_string()));
        assert_eq!(proxy_url("http://proxy.local:3128/"), Some("http://proxy.local:3128".to_string()));
        assert_eq!(proxy_url("proxy.local"), None);
        assert_eq!(proxy_url(":8080"), None);
        assert_eq!(proxy_url("proxy.local:http"), None);
        assert_eq!(proxy_url("proxy.local:0"), None);
    }

    #[test]
    fn test_invalid_proxy_does_not_fail_construction() {
        let options = Options {
            proxy: Some("not a proxy".to_string()),
            ..Options::default()
        };
        assert!(Transport::new(&options, None).is_ok());
    }

    #[test]
    fn test_resolver_for_without_custom_resolvers() {
        let transport = Transport::new(&Options::default(), None).unwrap();
        assert_eq!(transport.resolver_for("https://example.com/app.js"), SYSTEM_RESOLVER);
        assert_eq!(transport.resolver_for("http://127.0.0.1:8080/"), SYSTEM_RESOLVER);
        assert_eq!(transport.resolver_for("http://[::1]/"), SYSTEM_RESOLVER);
        assert_eq!(transport.resolver_for("not a url"), SYSTEM_RESOLVER);
    }

    #[tokio::test]
    async fn test_fetch_returns_body_for_any_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/package.json"))
            .and(header("user-agent", "npmjack-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"dependencies":{}}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.js"))
            .respond_with(ResponseTemplate::new(404).set_body_string("require('still-scanned')"))
            .mount(&server)
            .await;

        let options = Options {
            user_agent: "npmjack-test".to_string(),
            ..Options::default()
        };
        let transport = Transport::new(&options, None).unwrap();

        let page = transport.fetch(&format!("{}/package.json", server.uri())).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.body.contains("dependencies"));

        let page = transport.fetch(&format!("{}/missing.js", server.uri())).await.unwrap();
        assert_eq!(page.status, 404);
        assert_eq!(page.body, "require('still-scanned')");
    }
}
