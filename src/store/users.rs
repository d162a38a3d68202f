//! # User Store
//!
//! In-memory user records keyed by login name, with a secondary index from
//! user handle to login name so finish steps can resolve the user a session
//! points at.

use crate::store::models::User;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct UserIndex {
    by_name: HashMap<String, User>,
    names_by_handle: HashMap<Vec<u8>, String>,
}

impl UserIndex {
    fn upsert(&mut self, user: User) {
        // Drop a stale handle mapping if the record under this name changed handle
        if let Some(previous) = self.by_name.get(&user.name) {
            if previous.handle != user.handle {
                self.names_by_handle.remove(&previous.handle);
            }
        }
        self.names_by_handle
            .insert(user.handle.clone(), user.name.clone());
        self.by_name.insert(user.name.clone(), user);
    }
}

/// Shared user map
///
/// Cloning is cheap: all clones point at the same map.
#[derive(Clone, Default)]
pub struct UserStore {
    inner: Arc<Mutex<UserIndex>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user for `name`, creating it first if needed
    ///
    /// The lookup and the insert happen under one lock, so concurrent callers
    /// with the same name all get the same record.
    pub async fn get_or_create(&self, name: &str) -> User {
        let mut index = self.inner.lock().await;
        if let Some(user) = index.by_name.get(name) {
            return user.clone();
        }

        tracing::debug!(user = %name, "creating new user");
        let user = User::new(name);
        index.upsert(user.clone());
        user
    }

    pub async fn find_by_name(&self, name: &str) -> Option<User> {
        self.inner.lock().await.by_name.get(name).cloned()
    }

    pub async fn find_by_handle(&self, handle: &[u8]) -> Option<User> {
        let index = self.inner.lock().await;
        index
            .names_by_handle
            .get(handle)
            .and_then(|name| index.by_name.get(name))
            .cloned()
    }

    /// Upsert by login name, replacing the whole stored record
    ///
    /// Finish steps never call this: they go through [`UserStore::update`],
    /// so two ceremonies for one user cannot overwrite each other's copy.
    pub async fn save(&self, user: User) {
        tracing::debug!(user = %user.name, "saving user");
        self.inner.lock().await.upsert(user);
    }

    /// Mutate the stored record for `handle` in place
    ///
    /// This is the upsert path of the ceremony finish steps (append or
    /// update a credential). The read, the mutation and the write-back all
    /// happen under the store lock. Returns `None` if no user has that handle.
    pub async fn update<F, R>(&self, handle: &[u8], f: F) -> Option<R>
    where
        F: FnOnce(&mut User) -> R,
    {
        let mut index = self.inner.lock().await;
        let name = index.names_by_handle.get(handle)?.clone();
        let user = index.by_name.get_mut(&name)?;
        Some(f(user))
    }
}
