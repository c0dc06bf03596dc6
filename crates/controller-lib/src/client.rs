//! Platform API seam for the derived-resource collection
//!
//! The reconciler talks to the cluster through the [`VpaApi`] trait so tests
//! can substitute an in-memory backend. The production implementation is a
//! thin wrapper over namespaced `kube::Api` calls.

use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};

use crate::resources::VerticalPodAutoscaler;

/// Get/Create/Update access to VerticalPodAutoscalers, scoped by namespace.
#[async_trait]
pub trait VpaApi: Send + Sync {
    /// Fetch a VPA by name. `Ok(None)` means the object does not exist;
    /// every other failure is surfaced as an error.
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VerticalPodAutoscaler>, kube::Error>;

    /// Create a new VPA. The caller is responsible for having set the owner
    /// reference on `vpa`.
    async fn create(
        &self,
        namespace: &str,
        vpa: &VerticalPodAutoscaler,
    ) -> Result<VerticalPodAutoscaler, kube::Error>;

    /// Replace an existing VPA. `vpa` must carry the resourceVersion read
    /// during the preceding get so the server can detect write conflicts.
    async fn update(
        &self,
        namespace: &str,
        vpa: &VerticalPodAutoscaler,
    ) -> Result<VerticalPodAutoscaler, kube::Error>;
}

#[async_trait]
impl<T: VpaApi + ?Sized> VpaApi for std::sync::Arc<T> {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VerticalPodAutoscaler>, kube::Error> {
        (**self).get(namespace, name).await
    }

    async fn create(
        &self,
        namespace: &str,
        vpa: &VerticalPodAutoscaler,
    ) -> Result<VerticalPodAutoscaler, kube::Error> {
        (**self).create(namespace, vpa).await
    }

    async fn update(
        &self,
        namespace: &str,
        vpa: &VerticalPodAutoscaler,
    ) -> Result<VerticalPodAutoscaler, kube::Error> {
        (**self).update(namespace, vpa).await
    }
}

/// Kube-client-backed implementation of [`VpaApi`].
pub struct KubeVpaApi {
    client: Client,
}

impl KubeVpaApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced(&self, namespace: &str) -> Api<VerticalPodAutoscaler> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl VpaApi for KubeVpaApi {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VerticalPodAutoscaler>, kube::Error> {
        self.namespaced(namespace).get_opt(name).await
    }

    async fn create(
        &self,
        namespace: &str,
        vpa: &VerticalPodAutoscaler,
    ) -> Result<VerticalPodAutoscaler, kube::Error> {
        self.namespaced(namespace)
            .create(&PostParams::default(), vpa)
            .await
    }

    async fn update(
        &self,
        namespace: &str,
        vpa: &VerticalPodAutoscaler,
    ) -> Result<VerticalPodAutoscaler, kube::Error> {
        self.namespaced(namespace)
            .replace(&vpa.name_any(), &PostParams::default(), vpa)
            .await
    }
}
