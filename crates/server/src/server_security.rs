use crate::config;
use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

/// Where `serve` listens. Without `--bind` this is loopback on `$PORT`.
#[derive(Debug)]
pub(crate) struct BindTarget {
    pub(crate) requested: String,
    pub(crate) resolved: Vec<SocketAddr>,
    pub(crate) addr: SocketAddr,
}

impl BindTarget {
    /// Resolves the requested address and applies the loopback guard before
    /// any credentials are read.
    pub(crate) async fn resolve(bind: Option<&str>, public: bool) -> Result<Self> {
        let requested = match bind {
            Some(bind) => bind.to_string(),
            None => config::default_bind()?,
        };
        // Tokio resolution so "localhost:3000" works.
        let resolved: Vec<SocketAddr> = tokio::net::lookup_host(requested.as_str())
            .await
            .with_context(|| format!("Failed to resolve bind address: {requested}"))?
            .collect();
        Self::from_resolved(requested, resolved, public)
    }

    fn from_resolved(requested: String, resolved: Vec<SocketAddr>, public: bool) -> Result<Self> {
        if let Some(exposed) = resolved.iter().find(|addr| !addr.ip().is_loopback()) {
            if !public {
                anyhow::bail!(
                    "Refusing to bind to non-loopback address {} on port {} without --public \
                     (requested {requested}). The phenotype API has no caller authentication; \
                     leave --bind unset to listen on loopback at ${}, or pass --public only \
                     behind a trusted proxy.",
                    exposed.ip(),
                    exposed.port(),
                    config::PORT_ENV,
                );
            }
        }
        let addr = resolved
            .iter()
            .copied()
            .find(SocketAddr::is_ipv4)
            .or_else(|| resolved.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Bind address resolved to nothing: {requested}"))?;
        Ok(Self {
            requested,
            resolved,
            addr,
        })
    }

    /// Resolved addresses, comma separated, for the `--public` banner.
    pub(crate) fn resolved_list(&self) -> String {
        self.resolved
            .iter()
            .map(SocketAddr::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
