//! Storage implementations for different backends

pub mod files;
pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;
pub mod timed;

pub use files::{InMemoryFileStore, LocalFileStore};
pub use in_memory::InMemoryStore;
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoStore;
pub use timed::TimedStore;

use crate::core::entity::Entity;
use crate::core::store::EntityStore;
use crate::entities::{Annexure, Blog, ContactQuery, Property, TeamMember, User};
use std::sync::Arc;
use std::time::Duration;

/// One store handle per record type
#[derive(Clone)]
pub struct EntityStores {
    pub properties: Arc<dyn EntityStore<Property>>,
    pub team_members: Arc<dyn EntityStore<TeamMember>>,
    pub queries: Arc<dyn EntityStore<ContactQuery>>,
    pub users: Arc<dyn EntityStore<User>>,
    pub blogs: Arc<dyn EntityStore<Blog>>,
    pub annexures: Arc<dyn EntityStore<Annexure>>,
}

impl EntityStores {
    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            properties: Arc::new(InMemoryStore::<Property>::new()),
            team_members: Arc::new(InMemoryStore::<TeamMember>::new()),
            queries: Arc::new(InMemoryStore::<ContactQuery>::new()),
            users: Arc::new(InMemoryStore::<User>::new()),
            blogs: Arc::new(InMemoryStore::<Blog>::new()),
            annexures: Arc::new(InMemoryStore::<Annexure>::new()),
        }
    }

    /// MongoDB collections in `database`, with indexes ensured
    #[cfg(feature = "mongodb_backend")]
    pub async fn mongodb(
        database: ::mongodb::Database,
    ) -> crate::core::error::EstateResult<Self> {
        async fn open<T: Entity>(
            database: &::mongodb::Database,
        ) -> crate::core::error::EstateResult<Arc<dyn EntityStore<T>>> {
            let store = MongoStore::<T>::new(database.clone());
            store.ensure_indexes().await?;
            Ok(Arc::new(store))
        }

        Ok(Self {
            properties: open(&database).await?,
            team_members: open(&database).await?,
            queries: open(&database).await?,
            users: open(&database).await?,
            blogs: open(&database).await?,
            annexures: open(&database).await?,
        })
    }

    /// Wrap every store so each call fails after `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Self {
        fn timed<T: Entity>(store: Arc<dyn EntityStore<T>>, timeout: Duration) -> Arc<dyn EntityStore<T>> {
            Arc::new(TimedStore::new(store, timeout))
        }

        Self {
            properties: timed(self.properties, timeout),
            team_members: timed(self.team_members, timeout),
            queries: timed(self.queries, timeout),
            users: timed(self.users, timeout),
            blogs: timed(self.blogs, timeout),
            annexures: timed(self.annexures, timeout),
        }
    }
}
