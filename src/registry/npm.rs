//! npm registry claim checks.

use crate::config::Options;
use crate::registry::cache::ClaimCache;
use crate::types::Package;
use futures::future::join_all;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Limiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Decides whether package names are registered on the public registry.
pub struct ClaimChecker {
    client: Client,
    cache: ClaimCache,
    rate_limiter: Arc<Limiter>,
    registry_url: String,
}

impl ClaimChecker {
    /// Checker sharing `client` with the target transport.
    pub fn new(client: Client, options: &Options) -> Self {
        let rate = NonZeroU32::new(options.registry_rate_limit).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        Self {
            client,
            cache: ClaimCache::new(),
            rate_limiter,
            registry_url: options.registry_url.trim_end_matches('/').to_string(),
        }
    }

    /// Metadata URL for `name`. The scope slash is percent-encoded.
    pub fn package_url(&self, name: &str) -> String {
        let path = match name.strip_prefix('@') {
            Some(scoped) => format!("@{}", urlencoding::encode(scoped)),
            None => urlencoding::encode(name).into_owned(),
        };
        format!("{}/{}", self.registry_url, path)
    }

    /// HEAD the registry entry. Success means claimed; anything else,
    /// including network failure, means unclaimed.
    pub async fn is_claimed(&self, name: &str) -> bool {
        if let Some(claimed) = self.cache.get(name) {
            trace!("Cache hit for {}", name);
            return claimed;
        }

        self.rate_limiter.until_ready().await;

        let url = self.package_url(name);
        trace!("Checking registry: {}", url);

        let claimed = match self.client.head(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Package claimed: {}", name);
                true
            }
            Ok(response) => {
                debug!("Package NOT claimed: {} (HTTP {})", name, response.status());
                false
            }
            Err(e) => {
                warn!("Claim check failed for {}: {}; treating as unclaimed", name, e);
                false
            }
        };

        self.cache.set(name, claimed);
        claimed
    }

    /// Set `claimed` on every package. Order is preserved.
    pub async fn annotate(&self, packages: Vec<Package>) -> Vec<Package> {
        join_all(packages.into_iter().map(|mut package| async move {
            package.claimed = self.is_claimed(&package.name).await;
            package
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn checker(registry_url: &str) -> ClaimChecker {
        let options = Options {
            registry_url: registry_url.to_string(),
            registry_rate_limit: 100,
            ..Options::default()
        };
        ClaimChecker::new(Client::new(), &options)
    }

    #[test]
    fn test_package_url() {
        let checker = checker("https://registry.npmjs.org/");
        assert_eq!(checker.package_url("lodash"), "https://registry.npmjs.org/lodash");
        assert_eq!(
            checker.package_url("@babel/core"),
            "https://registry.npmjs.org/@babel%2Fcore"
        );
    }

    #[tokio::test]
    async fn test_claimed_and_unclaimed() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/express"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/internal-billing-sdk"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let checker = checker(&server.uri());
        assert!(checker.is_claimed("express").await);
        assert!(!checker.is_claimed("internal-billing-sdk").await);
        // second lookup served from cache; the mock expects a single hit
        assert!(checker.is_claimed("express").await);
    }

    #[tokio::test]
    async fn test_server_error_is_unclaimed() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let checker = checker(&server.uri());
        assert!(!checker.is_claimed("react").await);
    }

    #[tokio::test]
    async fn test_network_failure_is_unclaimed() {
        let checker = checker("http://127.0.0.1:1");
        assert!(!checker.is_claimed("react").await);
    }

    #[tokio::test]
    async fn test_annotate_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/react"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let checker = checker(&server.uri());
        let packages = checker
            .annotate(vec![Package::new("react"), Package::new("acme-private"), Package::new("@acme/ui")])
            .await;

        let summary: Vec<(&str, bool)> = packages.iter().map(|p| (p.name.as_str(), p.claimed)).collect();
        assert_eq!(summary, vec![("react", true), ("acme-private", false), ("@acme/ui", false)]);
    }

    #[tokio::test]
    #[ignore = "requires network access to registry.npmjs.org"]
    async fn test_live_registry() {
        let checker = checker(crate::config::DEFAULT_REGISTRY_URL);
        assert!(checker.is_claimed("lodash").await);
        assert!(!checker.is_claimed("this-package-definitely-does-not-exist-12345xyz").await);
    }
}
