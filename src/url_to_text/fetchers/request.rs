use async_trait::async_trait;
use log::debug;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{redirect, Client};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use super::{DocumentFetcher, FetchedDocument};
use crate::config::FetchConfig;
use crate::error::{BoxError, IntakeError};
use crate::url_to_text::guard::{check_url_shape, is_public_address, HostResolver};

pub struct RequestFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl RequestFetcher {
    /// Every host name the client connects to, redirect targets included, is
    /// looked up through `resolver`.
    pub fn new(config: &FetchConfig, resolver: Arc<dyn HostResolver>) -> Result<Self, IntakeError> {
        let max_redirects = config.max_redirects;
        let allow_private_networks = config.allow_private_networks;

        // Literal addresses are checked here; names are checked when they resolve.
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= max_redirects {
                return attempt.error(format!("more than {max_redirects} redirects"));
            }
            match check_url_shape(attempt.url(), allow_private_networks) {
                Ok(()) => attempt.follow(),
                Err(e) => attempt.error(e.to_string()),
            }
        });

        let dns = GuardedDns {
            resolver,
            allow_private_networks,
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(policy)
            .dns_resolver(Arc::new(dns))
            .build()
            .map_err(|e| IntakeError::FetchFailed(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Name resolution for the HTTP client that refuses internal addresses.
///
/// The addresses checked are the ones connected to, so a redirect hop or a
/// second lookup of the same name cannot reach a private network.
struct GuardedDns {
    resolver: Arc<dyn HostResolver>,
    allow_private_networks: bool,
}

impl Resolve for GuardedDns {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        let allow_private_networks = self.allow_private_networks;
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = resolver.resolve(&host, 0).await?;
            if addrs.is_empty() {
                return Err(format!("host {host} has no addresses").into());
            }
            if !allow_private_networks {
                if let Some(addr) = addrs.iter().find(|a| !is_public_address(a)) {
                    return Err(format!("host {host} resolves to non-public address {addr}").into());
                }
            }
            let addrs: Addrs = Box::new(addrs.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<_, BoxError>(addrs)
        })
    }
}

#[async_trait]
impl DocumentFetcher for RequestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, BoxError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        if let Some(length) = response.content_length() {
            if length as usize > self.max_body_bytes {
                return Err(format!(
                    "response body of {length} bytes exceeds {} byte limit",
                    self.max_body_bytes
                )
                .into());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(format!(
                    "response body exceeds {} byte limit",
                    self.max_body_bytes
                )
                .into());
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} ({} bytes, status {})", final_url, body.len(), status);

        Ok(FetchedDocument {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
            final_url,
        })
    }
}
