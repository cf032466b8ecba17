//! Sled-backed document store
//!
//! Users and posts are stored as JSON documents under prefixed keys
//! (`user:{id}`, `post:{id}`). Sled gives per-document atomicity; nothing
//! here spans two keys in one transaction.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::sync::Arc;

use crate::models::{Post, User};
use crate::store::{PostStore, Result, StoreError, UserStore};

const USER_PREFIX: &str = "user:";
const POST_PREFIX: &str = "post:";

/// Store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "chirp.db".to_string(),
            cache_capacity: 64 * 1024 * 1024, // 64MB
            use_compression: true,
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }
}

/// Sled-backed implementation of [`UserStore`] and [`PostStore`]
pub struct SledStore {
    db: Arc<Db>,
}

impl SledStore {
    /// Open (or create) a store with the given configuration
    pub fn new(config: KvConfig) -> Result<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression)
            .open()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Create a temporary in-memory store (for testing)
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn get_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_doc<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    fn remove_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.remove(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_docs<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut docs = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = entry?;
            docs.push(serde_json::from_slice(&bytes)?);
        }
        Ok(docs)
    }
}

fn user_key(id: &str) -> String {
    format!("{USER_PREFIX}{id}")
}

fn post_key(id: &str) -> String {
    format!("{POST_PREFIX}{id}")
}

#[async_trait]
impl UserStore for SledStore {
    async fn get(&self, id: &str) -> Result<Option<User>> {
        self.get_doc(&user_key(id))
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.scan_docs(USER_PREFIX)?;
        Ok(users
            .into_iter()
            .find(|u| u.username == identifier || u.email == identifier))
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let users: Vec<User> = self.scan_docs(USER_PREFIX)?;
        Ok(users
            .into_iter()
            .find(|u| u.username == username || u.email == email))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.scan_docs(USER_PREFIX)?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        self.put_doc(&user_key(&user.id), user)
    }

    async fn update(&self, user: &User) -> Result<()> {
        self.put_doc(&user_key(&user.id), user)
    }

    async fn delete(&self, id: &str) -> Result<Option<User>> {
        self.remove_doc(&user_key(id))
    }

    async fn list(&self) -> Result<Vec<User>> {
        self.scan_docs(USER_PREFIX)
    }
}

#[async_trait]
impl PostStore for SledStore {
    async fn get(&self, id: &str) -> Result<Option<Post>> {
        self.get_doc(&post_key(id))
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        self.put_doc(&post_key(&post.id), post)
    }

    async fn update(&self, post: &Post) -> Result<()> {
        self.put_doc(&post_key(&post.id), post)
    }

    async fn delete(&self, id: &str) -> Result<Option<Post>> {
        self.remove_doc(&post_key(id))
    }

    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        let posts: Vec<Post> = self.scan_docs(POST_PREFIX)?;
        Ok(posts.into_iter().filter(|p| p.author_id == author_id).collect())
    }

    async fn find_by_authors(&self, author_ids: &[String]) -> Result<Vec<Post>> {
        let posts: Vec<Post> = self.scan_docs(POST_PREFIX)?;
        Ok(posts
            .into_iter()
            .filter(|p| author_ids.iter().any(|id| id == &p.author_id))
            .collect())
    }

    async fn list(&self) -> Result<Vec<Post>> {
        self.scan_docs(POST_PREFIX)
    }
}
