//! Network layer: DNS resolver chain and the HTTP transport bound to it.

pub mod client;
pub mod resolver;

pub use client::{proxy_url, Page, Transport};
pub use resolver::{parse_server, DnsBackend, HickoryBackend, Resolver, ResolverHook, ServerAddr};
