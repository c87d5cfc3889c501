//! Test doubles and common utilities for the contract tests
//!
//! The doubles share their counters through `Arc`, so a clone handed to the
//! engine keeps feeding the instance the test still holds.

use async_trait::async_trait;
use dyndns_core::error::{Error, Result};
use dyndns_core::traits::{ApiGateway, IpResolver};
use dyndns_core::types::{Family, ResolvedAddress};
use dyndns_core::{Method, Site};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// A site pointing at `sofa.example.com` with a well-formed token
pub fn test_site() -> Site {
    Site {
        host: "sofa".to_string(),
        domain: "example.com".to_string(),
        token: "0123456789abcdef".repeat(4),
        method: Method::Local,
        gateway: None,
        ttl_sec: None,
    }
}

/// A `{page, pages, data}` listing envelope
pub fn page_envelope(page: u32, pages: u32, data: Value) -> Value {
    json!({ "page": page, "pages": pages, "data": data })
}

/// One recorded gateway invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// An `ApiGateway` that replays scripted responses and records every call
///
/// Routes are keyed by (verb, path); hitting an unscripted route fails the
/// call with a transport error, which the engine must surface, so a test
/// that forgets a route cannot pass by accident.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    responses: Arc<Mutex<HashMap<(&'static str, String), Value>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for one (verb, path) route
    pub fn script(&self, method: &'static str, path: &str, reply: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), reply);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls matching a (verb, path) pair
    pub fn count_of(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Number of mutating (POST/PUT/DELETE) calls
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method != "GET")
            .count()
    }

    /// Bodies of all PUT calls, in order
    pub fn put_bodies(&self) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == "PUT")
            .filter_map(|c| c.body.clone())
            .collect()
    }

    fn dispatch(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        self.responses
            .lock()
            .unwrap()
            .get(&(method, path.to_string()))
            .cloned()
            .ok_or_else(|| Error::transport(format!("unscripted route: {method} {path}")))
    }
}

#[async_trait]
impl ApiGateway for ScriptedGateway {
    async fn get(&self, path: &str) -> Result<Value> {
        self.dispatch("GET", path, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.dispatch("POST", path, Some(body))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.dispatch("PUT", path, Some(body))
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.dispatch("DELETE", path, None)
    }
}

/// What a scripted resolver should do for one family
#[derive(Debug, Clone)]
pub enum ResolverScript {
    Address(IpAddr),
    Absent,
    Fail(&'static str),
}

/// An `IpResolver` with a fixed answer per family
#[derive(Clone)]
pub struct ScriptedResolver {
    v4: ResolverScript,
    v6: ResolverScript,
    calls: Arc<Mutex<Vec<Family>>>,
}

impl ScriptedResolver {
    pub fn new(v4: ResolverScript, v6: ResolverScript) -> Self {
        Self {
            v4,
            v6,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: a resolver returning one v4 address and no v6
    pub fn v4_only(addr: &str) -> Self {
        Self::new(
            ResolverScript::Address(addr.parse().unwrap()),
            ResolverScript::Absent,
        )
    }

    /// Families the engine asked about, in order
    pub fn resolved_families(&self) -> Vec<Family> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self, family: Family) -> Result<Option<ResolvedAddress>> {
        self.calls.lock().unwrap().push(family);
        let script = match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        };
        match script {
            ResolverScript::Address(addr) => Ok(Some(ResolvedAddress::new(family, *addr))),
            ResolverScript::Absent => Ok(None),
            ResolverScript::Fail(msg) => Err(Error::transport(*msg)),
        }
    }

    fn method_name(&self) -> &'static str {
        "scripted"
    }
}
