use crate::framework::{FrameworkError, ResourceClient, StoreEntity};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard store operations.
///
/// Implementors supply the inner [`ResourceClient`] and an error mapping; `get` and
/// `update` come for free with tracing spans attached.
#[async_trait]
pub trait ActorClient<T: StoreEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Apply an update to an entity and return the stored result.
    #[tracing::instrument(skip(self))]
    async fn update(&self, id: T::Id, update: T::Update) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().update(id, update).await.map_err(Self::map_error)
    }
}
