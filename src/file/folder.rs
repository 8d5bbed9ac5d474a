//! Folder types and repository.
//!
//! Every query is scoped by owner. A folder id that belongs to another user
//! behaves exactly like one that does not exist.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::format::escape_html;
use crate::db::DbPool;
use crate::{FilenestError, Result};

/// Maximum folder name length in characters (before escaping).
pub const MAX_FOLDER_NAME_LENGTH: usize = 100;

/// Identifier of the synthetic root entry in a folder path.
pub const ROOT_PATH_ID: &str = "homepage-root";

/// Display name of the synthetic root entry in a folder path.
pub const ROOT_PATH_NAME: &str = "homepage";

pub(crate) const FOLDER_COLUMNS: &str = "id, user_id, name, parent_id, created_at";

/// A folder in a user's tree.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Owner.
    pub user_id: i64,
    /// Folder name (HTML-escaped).
    pub name: String,
    /// Parent folder ID (None for root-level folders).
    pub parent_id: Option<i64>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Owner.
    pub user_id: i64,
    /// Folder name, already validated.
    pub name: String,
    /// Parent folder ID (None for root-level folders).
    pub parent_id: Option<i64>,
}

impl NewFolder {
    /// Create a root-level folder.
    pub fn new(user_id: i64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            parent_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the parent folder from an optional id.
    pub fn with_parent_opt(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Validate and normalize a folder name.
///
/// The name is trimmed, must be non-empty and at most
/// [`MAX_FOLDER_NAME_LENGTH`] characters, and is HTML-escaped.
pub fn normalize_folder_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FilenestError::Validation(
            "Folder name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_FOLDER_NAME_LENGTH {
        return Err(FilenestError::Validation(format!(
            "Folder name must be at most {MAX_FOLDER_NAME_LENGTH} characters"
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenestError::Validation(
            "Folder name cannot contain control characters".to_string(),
        ));
    }
    Ok(escape_html(trimmed))
}

/// One entry of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEntry {
    /// The synthetic top of every tree.
    Root,
    /// A real ancestor folder.
    Folder {
        /// Folder ID.
        id: i64,
        /// Folder name.
        name: String,
    },
}

impl PathEntry {
    /// Display name of the entry.
    pub fn name(&self) -> &str {
        match self {
            PathEntry::Root => ROOT_PATH_NAME,
            PathEntry::Folder { name, .. } => name,
        }
    }
}

/// Ancestor chain of a folder, from the synthetic root down to (not
/// including) the folder itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    ancestors: Vec<PathEntry>,
    truncated: bool,
}

impl FolderPath {
    /// Build a path from root-first ancestors.
    pub fn new(ancestors: &[Folder]) -> Self {
        Self {
            ancestors: ancestors
                .iter()
                .map(|f| PathEntry::Folder {
                    id: f.id,
                    name: f.name.clone(),
                })
                .collect(),
            truncated: false,
        }
    }

    /// Keep only the `levels` ancestors nearest to the folder.
    ///
    /// The root entry is shown only when the whole chain fits.
    pub fn truncate(mut self, levels: usize) -> Self {
        if self.ancestors.len() > levels {
            let drop = self.ancestors.len() - levels;
            self.ancestors.drain(..drop);
            self.truncated = true;
        }
        self
    }

    /// Whether ancestors were dropped by [`FolderPath::truncate`].
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// All entries, root first.
    pub fn entries(&self) -> Vec<PathEntry> {
        let mut entries = Vec::with_capacity(self.ancestors.len() + 1);
        if !self.truncated {
            entries.push(PathEntry::Root);
        }
        entries.extend(self.ancestors.iter().cloned());
        entries
    }

    /// Number of entries including the root, if shown.
    pub fn len(&self) -> usize {
        self.ancestors.len() + usize::from(!self.truncated)
    }

    /// True only for a path truncated to zero levels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Repository for folder persistence.
pub struct FolderRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a folder. The caller validates name and parent ownership.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        let created = sqlx::query_as::<_, Folder>(&format!(
            "INSERT INTO folders (user_id, name, parent_id, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(folder.user_id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Get a folder owned by `owner`.
    pub async fn get_by_id(&self, owner: i64, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// List the direct children of `parent` (None = root level).
    pub async fn list_by_parent(&self, owner: i64, parent: Option<i64>) -> Result<Vec<Folder>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_by_parent_in(&mut *conn, owner, parent).await
    }

    /// Same as [`FolderRepository::list_by_parent`] on an existing connection
    /// or transaction.
    pub(crate) async fn list_by_parent_in(
        conn: &mut SqliteConnection,
        owner: i64,
        parent: Option<i64>,
    ) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE user_id = $1 AND parent_id IS $2
             ORDER BY id"
        ))
        .bind(owner)
        .bind(parent)
        .fetch_all(conn)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Rename a folder. Returns the updated folder, or None if not owned.
    pub async fn rename(&self, owner: i64, id: i64, name: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders SET name = $1 WHERE id = $2 AND user_id = $3
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(name)
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// Re-parent a folder in one statement.
    ///
    /// The row is only updated when `parent` (if any) is owned by `owner`
    /// and neither is the folder nor has it among its ancestors. Returns
    /// None when nothing was updated.
    pub async fn move_under(
        &self,
        owner: i64,
        id: i64,
        parent: Option<i64>,
    ) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "WITH RECURSIVE chain(id) AS (
                 SELECT $1
                 UNION
                 SELECT f.parent_id FROM folders f JOIN chain c ON f.id = c.id
                 WHERE f.user_id = $2 AND f.parent_id IS NOT NULL
             )
             UPDATE folders SET parent_id = $1
             WHERE id = $3 AND user_id = $2
               AND ($1 IS NULL OR (
                   EXISTS (SELECT 1 FROM folders p WHERE p.id = $1 AND p.user_id = $2)
                   AND NOT EXISTS (SELECT 1 FROM chain WHERE chain.id = $3)
               ))
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(parent)
        .bind(owner)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// Delete a folder row. Returns true if a row was removed.
    pub async fn delete(&self, owner: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.pool)
            .await
            .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count the direct child folders of a folder.
    pub async fn count_children(&self, owner: i64, id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE user_id = $1 AND parent_id = $2")
                .bind(owner)
                .bind(id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| FilenestError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Parent of a folder. Outer None means the folder is not owned.
    pub async fn get_parent(&self, owner: i64, id: i64) -> Result<Option<Option<i64>>> {
        Ok(self.get_by_id(owner, id).await?.map(|f| f.parent_id))
    }

    /// Ancestors of a folder, root first, not including the folder itself.
    ///
    /// The walk stops at the first hop that leaves the owner's tree and
    /// refuses to loop on a corrupted (cyclic) chain.
    pub async fn ancestors(&self, owner: i64, id: i64) -> Result<Vec<Folder>> {
        let folder = self
            .get_by_id(owner, id)
            .await?
            .ok_or_else(|| FilenestError::NotFound("folder".to_string()))?;

        let mut chain = Vec::new();
        let mut seen = HashSet::from([folder.id]);
        let mut next = folder.parent_id;

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                break;
            }
            match self.get_by_id(owner, parent_id).await? {
                Some(parent) => {
                    next = parent.parent_id;
                    chain.push(parent);
                }
                None => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        users.create(&NewUser::new("alice", "hash")).await.unwrap();
        users.create(&NewUser::new("bob", "hash")).await.unwrap();
        db
    }

    fn folder(id: i64, name: &str) -> Folder {
        Folder {
            id,
            user_id: 1,
            name: name.to_string(),
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_folder_name() {
        assert_eq!(normalize_folder_name("  Docs  ").unwrap(), "Docs");
        assert_eq!(normalize_folder_name("a<b").unwrap(), "a&lt;b");
        assert!(normalize_folder_name("   ").is_err());
        assert!(normalize_folder_name("").is_err());
        assert!(normalize_folder_name("bad\u{0}name").is_err());
        assert!(normalize_folder_name(&"x".repeat(100)).is_ok());
        assert!(normalize_folder_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_folder_path_untruncated_includes_root() {
        let path = FolderPath::new(&[folder(1, "a"), folder(2, "b")]);
        let entries = path.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], PathEntry::Root);
        assert_eq!(entries[2].name(), "b");
        assert!(!path.is_truncated());
    }

    #[test]
    fn test_folder_path_truncate_keeps_nearest() {
        let ancestors: Vec<Folder> = (1..=5).map(|i| folder(i, &format!("f{i}"))).collect();

        let path = FolderPath::new(&ancestors).truncate(3);
        let entries = path.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], PathEntry::Folder { id: 3, name: "f3".to_string() });
        assert_eq!(entries[2], PathEntry::Folder { id: 5, name: "f5".to_string() });
        assert!(path.is_truncated());
    }

    #[test]
    fn test_folder_path_truncate_when_fits() {
        let path = FolderPath::new(&[folder(1, "a")]).truncate(3);
        assert_eq!(path.len(), 2);
        assert_eq!(path.entries()[0], PathEntry::Root);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = FolderRepository::new(db.pool());

        let created = repo.create(&NewFolder::new(1, "Docs")).await.unwrap();
        assert_eq!(created.name, "Docs");
        assert_eq!(created.parent_id, None);

        let found = repo.get_by_id(1, created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_get_is_owner_scoped() {
        let db = setup().await;
        let repo = FolderRepository::new(db.pool());

        let created = repo.create(&NewFolder::new(1, "Docs")).await.unwrap();
        assert!(repo.get_by_id(2, created.id).await.unwrap().is_none());
        assert!(repo.rename(2, created.id, "x").await.unwrap().is_none());
        assert!(!repo.delete(2, created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_parent() {
        let db = setup().await;
        let repo = FolderRepository::new(db.pool());

        let docs = repo.create(&NewFolder::new(1, "Docs")).await.unwrap();
        repo.create(&NewFolder::new(1, "Pics")).await.unwrap();
        repo.create(&NewFolder::new(1, "Work").with_parent(docs.id))
            .await
            .unwrap();
        repo.create(&NewFolder::new(2, "Other")).await.unwrap();

        let root = repo.list_by_parent(1, None).await.unwrap();
        assert_eq!(root.len(), 2);

        let children = repo.list_by_parent(1, Some(docs.id)).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Work");
        assert_eq!(repo.count_children(1, docs.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ancestors_unbounded() {
        let db = setup().await;
        let repo = FolderRepository::new(db.pool());

        let mut parent = None;
        let mut ids = Vec::new();
        for i in 0..6 {
            let f = repo
                .create(&NewFolder::new(1, format!("level{i}")).with_parent_opt(parent))
                .await
                .unwrap();
            parent = Some(f.id);
            ids.push(f.id);
        }

        let chain = repo.ancestors(1, ids[5]).await.unwrap();
        let chain_ids: Vec<i64> = chain.iter().map(|f| f.id).collect();
        assert_eq!(chain_ids, ids[..5].to_vec());

        assert!(repo.ancestors(1, ids[0]).await.unwrap().is_empty());
        assert!(matches!(
            repo.ancestors(2, ids[5]).await,
            Err(FilenestError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_parent() {
        let db = setup().await;
        let repo = FolderRepository::new(db.pool());

        let docs = repo.create(&NewFolder::new(1, "Docs")).await.unwrap();
        let work = repo
            .create(&NewFolder::new(1, "Work").with_parent(docs.id))
            .await
            .unwrap();

        assert_eq!(repo.get_parent(1, work.id).await.unwrap(), Some(Some(docs.id)));
        assert_eq!(repo.get_parent(1, docs.id).await.unwrap(), Some(None));
        assert_eq!(repo.get_parent(2, docs.id).await.unwrap(), None);
    }
}
