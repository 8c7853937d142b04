pub mod supabase;

use crate::errors::StoreError;
use crate::types::{NewResume, ResumeRecord, Session};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub use supabase::SupabaseStore;

/// A trait for the delegated persisted-resume store.
///
/// Every call runs on behalf of `session`; the store itself is responsible for
/// scoping rows to their owner and for upsert consistency.
#[async_trait]
pub trait ResumeStore: Send + Sync + Debug + DynClone {
    /// All records owned by the session's user, newest first.
    async fn list(&self, session: &Session) -> Result<Vec<ResumeRecord>, StoreError>;

    /// Inserts a record, replacing an existing one with the same owner and job title.
    async fn upsert(&self, session: &Session, resume: &NewResume)
        -> Result<ResumeRecord, StoreError>;

    async fn delete(&self, session: &Session, id: &str) -> Result<(), StoreError>;
}

dyn_clone::clone_trait_object!(ResumeStore);

/// The store used when none is configured. Every call fails.
#[derive(Clone, Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl ResumeStore for UnavailableStore {
    async fn list(&self, _session: &Session) -> Result<Vec<ResumeRecord>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn upsert(
        &self,
        _session: &Session,
        _resume: &NewResume,
    ) -> Result<ResumeRecord, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn delete(&self, _session: &Session, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }
}
