//! Fault-injection measurements for Ceph monitoring and alerting.
//!
//! This crate disrupts Ceph daemons running under an operator on
//! Kubernetes/OpenShift and records what the alerting stack reported while
//! the disruption was in effect.
//!
//! This crate provides:
//! - A background watcher that polls the Prometheus alerts API and keeps an
//!   ordered, deduplicated alert log
//! - A timed operation runner with minimum-duration and measure-after support
//! - A read-through result cache so measurements can be replayed
//! - Three scenarios: stop a manager, stop a monitor minority, stop an OSD
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ocs_measure::{FileResultStore, Harness, KubeCluster, Measurer, PrometheusClient, Scenario};
//!
//! let cluster = Arc::new(KubeCluster::connect("openshift-storage").await?);
//! let alerts = Arc::new(PrometheusClient::new(config.prometheus.clone())?);
//! let store = Arc::new(FileResultStore::new(config.env_data.ensure_measurement_dir()?));
//!
//! let harness = Harness::new(cluster, Measurer::new(store, alerts));
//! let record = harness.run(Scenario::StopMgr, None).await?;
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod error;
pub mod measure;
pub mod prometheus;
pub mod record;
pub mod scenarios;
pub mod store;
pub mod timed;
pub mod watcher;

pub use cluster::{ClusterClient, KubeCluster};
pub use config::{Config, EnvData};
pub use error::{ClusterError, MeasureError};
pub use measure::{MeasureOptions, Measurer};
pub use prometheus::{PrometheusClient, PrometheusConfig};
pub use record::{Alert, MeasurementRecord};
pub use scenarios::{Harness, Scenario};
pub use store::{FileResultStore, MemoryResultStore, ResultStore};
pub use timed::{run_timed, Timed};
pub use watcher::{AlertLog, AlertSource, AlertWatcher, WatcherHandle};
