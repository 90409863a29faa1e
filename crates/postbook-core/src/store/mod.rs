//! The post store: owns the posts, the edit target and the write-back to storage.

mod outcome;


use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::SystemClock;
use crate::domain::{IdAllocator, Post, PostId, trim_text};
use crate::error::PostError;
use crate::ports::{Clock, KeyValueStore, StorageError};
use crate::render::{self, DisplayZone, HtmlSanitizer, PostListView, Sanitizer};

pub use outcome::{Committed, DeleteConfirmation, LoadReport, LoadStatus, SaveKind, Saved};

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Key under which the whole post sequence is persisted.
    pub storage_key: String,
    /// `chrono` format string for rendered timestamps.
    pub timestamp_format: String,
    /// Zone rendered timestamps are shown in.
    pub display_zone: DisplayZone,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: "posts".to_string(),
            timestamp_format: render::DEFAULT_TIMESTAMP_FORMAT.to_string(),
            display_zone: DisplayZone::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from a variable lookup. Unusable values fall back to
    /// the defaults with a warning.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let timestamp_format = match var("POSTBOOK_TIMESTAMP_FORMAT") {
            Some(format) if render::is_valid_timestamp_format(&format) => format,
            Some(format) => {
                tracing::warn!(
                    format = %format,
                    "Invalid POSTBOOK_TIMESTAMP_FORMAT, using default"
                );
                defaults.timestamp_format
            }
            None => defaults.timestamp_format,
        };

        let display_zone = match var("POSTBOOK_TIMEZONE").map(|zone| zone.parse::<DisplayZone>()) {
            Some(Ok(zone)) => zone,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid POSTBOOK_TIMEZONE, using local time");
                defaults.display_zone
            }
            None => defaults.display_zone,
        };

        Self {
            storage_key: var("POSTBOOK_STORAGE_KEY")
                .filter(|key| !key.trim().is_empty())
                .unwrap_or(defaults.storage_key),
            timestamp_format,
            display_zone,
        }
    }
}

/// In-memory post list backed by a key-value store.
///
/// Every successful mutation rewrites the full sequence under
/// [`StoreConfig::storage_key`] before returning.
pub struct PostStore {
    posts: Vec<Post>,
    editing_id: Option<PostId>,
    ids: IdAllocator,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
}

impl PostStore {
    /// Create an empty store using the wall clock. Call [`load`](Self::load) to
    /// pick up persisted posts.
    pub fn new(storage: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        storage: Arc<dyn KeyValueStore>,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts: Vec::new(),
            editing_id: None,
            ids: IdAllocator::new(),
            storage,
            clock,
            config,
        }
    }

    /// Create a store and load it in one step.
    pub fn open(storage: Arc<dyn KeyValueStore>, config: StoreConfig) -> (Self, LoadReport) {
        let mut store = Self::new(storage, config);
        let report = store.load();
        (store, report)
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn editing_id(&self) -> Option<PostId> {
        self.editing_id
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    /// Replace the in-memory state with what the backend holds.
    ///
    /// Never fails: an absent, malformed or unreadable entry leaves the store
    /// empty and is reported in the returned [`LoadReport`].
    pub fn load(&mut self) -> LoadReport {
        self.posts.clear();
        self.editing_id = None;
        self.ids = IdAllocator::new();

        let key = self.config.storage_key.clone();
        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %key, "No persisted posts");
                return LoadReport::new(LoadStatus::Missing);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read posts; starting empty");
                return LoadReport::new(LoadStatus::Unavailable(e));
            }
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Persisted posts are malformed; starting empty");
                return LoadReport::new(LoadStatus::Malformed {
                    reason: e.to_string(),
                });
            }
        };

        let mut report = LoadReport::new(LoadStatus::Loaded);
        let mut posts = Vec::with_capacity(records.len());

        for record in records {
            match serde_json::from_value::<Post>(record) {
                Ok(post) if trim_text(&post.title).is_empty() => {
                    tracing::debug!(id = %post.id, "Skipping post with empty title");
                    report.skipped += 1;
                }
                Ok(mut post) => {
                    if post.updated_at < post.created_at {
                        post.updated_at = post.created_at;
                    }
                    posts.push(post);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable post record");
                    report.skipped += 1;
                }
            }
        }

        // Stable, so equal timestamps keep their persisted order.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        for post in &posts {
            self.ids.observe(post.id);
        }

        let now = self.clock.now();
        let mut in_use: HashSet<PostId> = posts.iter().map(|p| p.id).collect();
        let mut seen = HashSet::with_capacity(posts.len());
        for post in &mut posts {
            if !seen.insert(post.id) {
                let fresh = Self::allocate(&mut self.ids, now, |id| in_use.contains(&id));
                tracing::warn!(old_id = %post.id, new_id = %fresh, "Reassigning duplicate post id");
                post.id = fresh;
                in_use.insert(fresh);
                seen.insert(fresh);
                report.reassigned += 1;
            }
        }

        report.loaded = posts.len();
        self.posts = posts;

        if report.reassigned > 0 {
            report.persist_error = self.persist();
        }

        tracing::info!(
            key = %key,
            loaded = report.loaded,
            skipped = report.skipped,
            reassigned = report.reassigned,
            "Posts loaded"
        );

        report
    }

    /// Create a post, or update the one being edited.
    ///
    /// Title and content are trimmed. An empty title is rejected without any
    /// change, and edit mode is kept so the caller can correct the input. On
    /// success edit mode is cleared. A stale edit target (deleted in the
    /// meantime) falls through to creating a new post.
    pub fn save(
        &mut self,
        title: &str,
        content: &str,
        published: bool,
    ) -> Result<Committed<Saved>, PostError> {
        let title = trim_text(title);
        if title.is_empty() {
            tracing::debug!("Rejected save with empty title");
            return Err(PostError::empty_title());
        }
        let content = trim_text(content);
        let now = self.clock.now();

        let target = self.editing_id.and_then(|id| self.position(id));
        let saved = match target {
            Some(idx) => {
                let post = &mut self.posts[idx];
                post.title = title.to_string();
                post.content = content.to_string();
                post.published = published;
                post.touch(now);
                Saved {
                    post: post.clone(),
                    kind: SaveKind::Updated,
                }
            }
            None => {
                if let Some(stale) = self.editing_id {
                    tracing::debug!(id = %stale, "Edit target no longer exists; creating a new post");
                }
                let posts = &self.posts;
                let id = Self::allocate(&mut self.ids, now, |id| posts.iter().any(|p| p.id == id));
                let post = Post::new(id, title.to_string(), content.to_string(), published, now);
                self.posts.insert(0, post.clone());
                Saved {
                    post,
                    kind: SaveKind::Created,
                }
            }
        };

        self.editing_id = None;
        let persist_error = self.persist();

        tracing::info!(id = %saved.post.id, kind = ?saved.kind, "Post saved");
        Ok(Committed::new(saved, persist_error))
    }

    /// Enter edit mode for `id` and return the post so its fields can be shown.
    pub fn start_edit(&mut self, id: PostId) -> Result<&Post, PostError> {
        let idx = self.position(id).ok_or(PostError::NotFound(id))?;
        self.editing_id = Some(id);
        tracing::debug!(id = %id, "Editing post");
        Ok(&self.posts[idx])
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
    }

    /// Describe the delete the presentation layer should confirm.
    pub fn request_delete(&self, id: PostId) -> Result<DeleteConfirmation, PostError> {
        self.get(id)
            .map(DeleteConfirmation::for_post)
            .ok_or(PostError::NotFound(id))
    }

    /// Remove a post. The caller is responsible for confirming first.
    pub fn delete(&mut self, id: PostId) -> Result<Committed<Post>, PostError> {
        let idx = self.position(id).ok_or(PostError::NotFound(id))?;
        let removed = self.posts.remove(idx);
        let persist_error = self.persist();

        tracing::info!(id = %id, "Post deleted");
        Ok(Committed::new(removed, persist_error))
    }

    pub fn toggle_publish(&mut self, id: PostId) -> Result<Committed<Post>, PostError> {
        let now = self.clock.now();
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PostError::NotFound(id))?;
        post.published = !post.published;
        post.touch(now);
        let post = post.clone();
        let persist_error = self.persist();

        tracing::info!(id = %id, published = post.published, "Post publish state toggled");
        Ok(Committed::new(post, persist_error))
    }

    /// Posts whose title or content contains `query`, ignoring case and
    /// surrounding whitespace. An empty query yields every post. Order is the
    /// stored order.
    pub fn filter<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Post> + use<'a> {
        let needle = trim_text(query).to_lowercase();
        self.posts.iter().filter(move |post| post.matches(&needle))
    }

    /// Sanitized view of the posts matching `query`.
    pub fn render<S: Sanitizer + ?Sized>(&self, query: &str, sanitizer: &S) -> PostListView {
        render::project(
            self.filter(query),
            sanitizer,
            &self.config.timestamp_format,
            self.config.display_zone,
        )
    }

    /// HTML markup for the posts matching `query`.
    pub fn render_html(&self, query: &str) -> String {
        render::html_fragment(&self.render(query, &HtmlSanitizer))
    }

    /// A fresh id for which `in_use` is false. Once the allocator has run past
    /// the largest representable id, the lowest unused id is taken instead.
    fn allocate(
        ids: &mut IdAllocator,
        now: DateTime<Utc>,
        in_use: impl Fn(PostId) -> bool,
    ) -> PostId {
        if let Some(id) = ids.next_id(now) {
            return id;
        }
        let id = (1..=u64::MAX)
            .map(PostId)
            .find(|&id| !in_use(id))
            .unwrap_or(PostId(0));
        tracing::warn!(id = %id, "Id range exhausted; reusing lowest free id");
        id
    }

    fn position(&self, id: PostId) -> Option<usize> {
        self.posts.iter().position(|p| p.id == id)
    }

    fn persist(&self) -> Option<PostError> {
        let key = &self.config.storage_key;
        let written = serde_json::to_string(&self.posts)
            .map_err(|e| StorageError::Serialization(e.to_string()))
            .and_then(|json| self.storage.set(key, &json));

        match written {
            Ok(()) => {
                tracing::debug!(key = %key, count = self.posts.len(), "Posts persisted");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to persist posts; in-memory state kept");
                Some(PostError::Persistence(e))
            }
        }
    }
}
