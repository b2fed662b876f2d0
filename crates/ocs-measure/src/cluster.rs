//! Access to the Ceph daemon deployments.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::constants::DEPLOYMENT;
use crate::error::ClusterError;

/// Deployment operations the scenarios need, bound to one namespace.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Names of deployments matching a label selector, in listing order.
    async fn list_names(&self, selector: &str) -> Result<Vec<String>, ClusterError>;

    /// Set the replica count of a deployment.
    async fn scale(&self, name: &str, replicas: i32) -> Result<(), ClusterError>;
}

/// [`ClusterClient`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeCluster {
    deployments: Api<Deployment>,
    namespace: String,
}

impl KubeCluster {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            deployments: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }

    /// Connect using the local kubeconfig or in-cluster service account.
    pub async fn connect(namespace: &str) -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, namespace))
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn list_names(&self, selector: &str) -> Result<Vec<String>, ClusterError> {
        debug!(
            kind = DEPLOYMENT,
            namespace = %self.namespace,
            selector = %selector,
            "Listing resources"
        );
        let list = self
            .deployments
            .list(&ListParams::default().labels(selector))
            .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|deployment| deployment.metadata.name)
            .collect())
    }

    async fn scale(&self, name: &str, replicas: i32) -> Result<(), ClusterError> {
        let patch = json!({ "spec": { "replicas": replicas } });
        self.deployments
            .patch_scale(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        info!(
            kind = DEPLOYMENT,
            namespace = %self.namespace,
            deployment = %name,
            replicas,
            "Scaled deployment"
        );
        Ok(())
    }
}
