//! In-memory stand-ins for the alerts API and the cluster.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ocs_measure::{Alert, AlertSource, ClusterClient, ClusterError, MeasureError};
use serde_json::json;

pub fn alert(name: &str, state: &str) -> Alert {
    Alert::new(json!({
        "labels": {"alertname": name, "severity": "critical"},
        "state": state,
    }))
}

/// Replays a fixed sequence of responses, repeating the last one.
pub struct ScriptedAlerts {
    responses: Mutex<VecDeque<Result<Vec<Alert>, u16>>>,
    calls: AtomicUsize,
}

impl ScriptedAlerts {
    pub fn new(responses: Vec<Result<Vec<Alert>, u16>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(alerts: Vec<Alert>) -> Self {
        Self::new(vec![Ok(alerts)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSource for ScriptedAlerts {
    async fn active_alerts(&self) -> Result<Vec<Alert>, MeasureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or(Ok(Vec::new()))
        };
        next.map_err(|status| MeasureError::AlertQuery {
            url: "http://prometheus/api/v1/alerts?silenced=false&inhibited=false".to_string(),
            status,
            body: String::new(),
        })
    }
}

/// Records scale calls against a mutable list of deployments.
pub struct FakeCluster {
    deployments: Mutex<Vec<(String, String)>>,
    scale_calls: Mutex<Vec<(String, i32)>>,
    list_calls: AtomicUsize,
    /// Deployments renamed (replaced) when they are scaled to zero
    replace_on_downscale: bool,
    fail_scale_of: Option<String>,
    /// Listings after this many successful ones fail
    lists_before_failure: Option<usize>,
}

impl FakeCluster {
    /// `deployments` are `(selector, name)` pairs in listing order.
    pub fn new(deployments: &[(&str, &str)]) -> Self {
        Self {
            deployments: Mutex::new(
                deployments
                    .iter()
                    .map(|(selector, name)| ((*selector).to_string(), (*name).to_string()))
                    .collect(),
            ),
            scale_calls: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            replace_on_downscale: false,
            fail_scale_of: None,
            lists_before_failure: None,
        }
    }

    /// Simulate the operator redeploying downscaled daemons under new names.
    pub fn replacing_downscaled(mut self) -> Self {
        self.replace_on_downscale = true;
        self
    }

    pub fn failing_scale_of(mut self, name: &str) -> Self {
        self.fail_scale_of = Some(name.to_string());
        self
    }

    /// Let the first `count` listings succeed and fail every later one.
    pub fn failing_lists_after(mut self, count: usize) -> Self {
        self.lists_before_failure = Some(count);
        self
    }

    pub fn scale_calls(&self) -> Vec<(String, i32)> {
        self.scale_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_names(&self, selector: &str) -> Result<Vec<String>, ClusterError> {
        let previous = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.lists_before_failure.is_some_and(|count| previous >= count) {
            return Err(ClusterError::Other("apiserver unavailable".to_string()));
        }
        Ok(self
            .deployments
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn scale(&self, name: &str, replicas: i32) -> Result<(), ClusterError> {
        self.scale_calls
            .lock()
            .unwrap()
            .push((name.to_string(), replicas));

        if self.fail_scale_of.as_deref() == Some(name) {
            return Err(ClusterError::Other(format!("cannot scale {name}")));
        }

        if replicas == 0 && self.replace_on_downscale {
            let mut deployments = self.deployments.lock().unwrap();
            for (_, existing) in deployments.iter_mut() {
                if existing == name {
                    *existing = format!("{name}-replacement");
                }
            }
        }
        Ok(())
    }
}
