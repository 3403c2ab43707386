//! # Core Store Framework
//!
//! This module defines the generic building blocks for the in-process record store.
//!
//! ## Key Types
//!
//! - [`StoreEntity`]: The trait that all stored record types must implement.
//! - [`ResourceActor`]: The generic actor that owns the records.
//! - [`ResourceClient`]: The generic client for communicating with the actor.
//! - [`FrameworkError`]: Common errors (e.g., ActorClosed, NotFound).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Source of "now" for audit stamps.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Trait that any record type must implement to be managed by [`ResourceActor`].
///
/// # Architecture Note
/// The actor, not the entity, decides *when* a record was created or changed: it passes
/// the current instant into [`StoreEntity::from_create_params`] and [`StoreEntity::touch`].
///
/// Identities come from a `u64` counter inside the actor, starting at 1, so `Id` must be
/// constructible from a `u64`.
pub trait StoreEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    type Id: Eq + Hash + Copy + Send + Sync + Display + Debug + From<u64>;

    /// The data required to create a new instance (DTO).
    type Create: Send + Sync + Debug;

    /// The data required to mutate an existing instance.
    type Update: Send + Sync + Debug;

    /// The error type for this entity.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full record from the assigned ID, the payload and the creation instant.
    fn from_create_params(
        id: Self::Id,
        params: Self::Create,
        now: DateTime<Utc>,
    ) -> Result<Self, Self::Error>;

    /// Apply a mutation. The actor calls [`StoreEntity::touch`] afterwards on success.
    fn apply_update(&mut self, update: Self::Update) -> Result<(), Self::Error>;

    /// Record that the entity changed at `now`.
    fn touch(&mut self, now: DateTime<Utc>);
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the store framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor.
///
/// Records are only created, read and mutated; there is no delete.
#[derive(Debug)]
pub enum ResourceRequest<T: StoreEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that owns a collection of records.
///
/// # Concurrency Model
/// The actor processes its messages *sequentially*, so the `store` needs no `Mutex`.
/// Readers get clones; nothing outside the actor ever holds a reference into the map.
pub struct ResourceActor<T: StoreEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id: u64,
    clock: Clock,
}

impl<T: StoreEntity> ResourceActor<T> {
    /// Creates a new actor stamping records with the wall clock.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - The capacity of the MPSC channel. If the channel is full,
    ///   calls to the client will wait until there is space.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        Self::with_clock(buffer_size, Utc::now)
    }

    /// Creates a new actor using `clock` for audit stamps.
    pub fn with_clock(
        buffer_size: usize,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: 1,
            clock: Box::new(clock),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    pub async fn run(mut self) {
        // Extract just the type name (e.g., "Order" instead of "completion_notifier::model::order::Order")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    let now = (self.clock)();

                    match T::from_create_params(id, params, now) {
                        Ok(item) => {
                            self.next_id += 1;
                            self.store.insert(id, item);
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };

                    // Work on a copy so a rejected update leaves the stored record untouched.
                    let mut updated = item.clone();
                    match updated.apply_update(update) {
                        Ok(()) => {
                            updated.touch((self.clock)());
                            *item = updated.clone();
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(updated));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a [`ResourceActor`].
///
/// Holds only the sender half, so cloning is cheap and clones can be shared across tasks.
#[derive(Clone)]
pub struct ResourceClient<T: StoreEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: StoreEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Create { params, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Get { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Update {
                id,
                update,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Note {
        id: u64,
        text: String,
        created: DateTime<Utc>,
        changed: DateTime<Utc>,
    }

    #[derive(Debug)]
    struct NoteCreate {
        text: String,
    }

    #[derive(Debug)]
    struct NoteUpdate {
        text: String,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("note must not be empty")]
    struct EmptyNote;

    impl StoreEntity for Note {
        type Id = u64;
        type Create = NoteCreate;
        type Update = NoteUpdate;
        type Error = EmptyNote;

        fn from_create_params(
            id: u64,
            params: NoteCreate,
            now: DateTime<Utc>,
        ) -> Result<Self, EmptyNote> {
            if params.text.is_empty() {
                return Err(EmptyNote);
            }
            Ok(Self {
                id,
                text: params.text,
                created: now,
                changed: now,
            })
        }

        fn apply_update(&mut self, update: NoteUpdate) -> Result<(), EmptyNote> {
            if update.text.is_empty() {
                return Err(EmptyNote);
            }
            self.text = update.text;
            Ok(())
        }

        fn touch(&mut self, now: DateTime<Utc>) {
            self.changed = now.max(self.created);
        }
    }

    /// Clock that advances one second per reading.
    fn ticking_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ticks = Arc::new(AtomicI64::new(0));
        move || start + Duration::seconds(ticks.fetch_add(1, Ordering::SeqCst))
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_resource_actor_stamps_audit_times() {
        let (actor, client) = ResourceActor::<Note>::with_clock(10, ticking_clock());
        tokio::spawn(actor.run());

        let id = client
            .create(NoteCreate { text: "first".into() })
            .await
            .unwrap();
        assert_eq!(id, 1);

        let created = client.get(id).await.unwrap().unwrap();
        assert_eq!(created.created, created.changed);

        let updated = client
            .update(id, NoteUpdate { text: "second".into() })
            .await
            .unwrap();
        assert_eq!(updated.text, "second");
        assert_eq!(updated.created, created.created);
        assert!(updated.changed > updated.created);

        // Reads have no side effects on the audit stamps.
        let reread = client.get(id).await.unwrap().unwrap();
        assert_eq!(reread, updated);
    }

    #[tokio::test]
    async fn test_rejected_create_does_not_consume_an_id() {
        let (actor, client) = ResourceActor::<Note>::new(10);
        tokio::spawn(actor.run());

        let err = client.create(NoteCreate { text: String::new() }).await;
        assert!(matches!(err, Err(FrameworkError::EntityError(_))));

        let id = client.create(NoteCreate { text: "ok".into() }).await.unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_record_untouched() {
        let (actor, client) = ResourceActor::<Note>::with_clock(10, ticking_clock());
        tokio::spawn(actor.run());

        let id = client.create(NoteCreate { text: "keep".into() }).await.unwrap();
        let before = client.get(id).await.unwrap().unwrap();

        let err = client.update(id, NoteUpdate { text: String::new() }).await;
        assert!(matches!(err, Err(FrameworkError::EntityError(_))));

        let after = client.get(id).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let (actor, client) = ResourceActor::<Note>::new(10);
        tokio::spawn(actor.run());

        assert!(client.get(7).await.unwrap().is_none());
        let err = client.update(7, NoteUpdate { text: "x".into() }).await;
        assert!(matches!(err, Err(FrameworkError::NotFound(id)) if id == "7"));
    }

    #[tokio::test]
    async fn test_client_reports_closed_actor() {
        let (actor, client) = ResourceActor::<Note>::new(10);
        drop(actor);

        let err = client.get(1).await;
        assert!(matches!(err, Err(FrameworkError::ActorClosed)));
    }
}
