//! Merged, sorted listing of a folder's direct contents.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::folder::{Folder, FolderRepository};
use super::metadata::{FileMetadata, FileRepository};
use crate::db::Database;
use crate::{FilenestError, Result};

/// Field a listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub enum SortKey {
    /// Case-insensitive name.
    #[default]
    #[serde(rename = "name")]
    Name,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortKey {
    /// Order used when the request does not name one.
    pub fn default_order(self) -> SortOrder {
        match self {
            SortKey::Name => SortOrder::Asc,
            SortKey::CreatedAt => SortOrder::Desc,
        }
    }

    /// Query-string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "createdAt" => Ok(SortKey::CreatedAt),
            _ => Err(format!("unknown sort key: {s}")),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Query-string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order: {s}")),
        }
    }
}

/// One item of a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A child folder.
    Folder(Folder),
    /// A file.
    File(FileMetadata),
}

impl Entry {
    /// Entry ID (unique per kind).
    pub fn id(&self) -> i64 {
        match self {
            Entry::Folder(f) => f.id,
            Entry::File(f) => f.id,
        }
    }

    /// Entry name.
    pub fn name(&self) -> &str {
        match self {
            Entry::Folder(f) => &f.name,
            Entry::File(f) => &f.name,
        }
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Entry::Folder(f) => f.created_at,
            Entry::File(f) => f.created_at,
        }
    }

    /// Whether the entry is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        other
            .is_folder()
            .cmp(&self.is_folder())
            .then_with(|| self.id().cmp(&other.id()))
    }
}

/// Sort entries in place.
///
/// Ties on the sort key fall back to folders before files, then ascending id,
/// regardless of direction.
pub fn sort_entries(entries: &mut [Entry], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| {
        let primary = match key {
            SortKey::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
            SortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.tie_break(b))
    });
}

/// Reads and sorts folder contents.
pub struct ContentLister<'a> {
    db: &'a Database,
}

impl<'a> ContentLister<'a> {
    /// Create a new lister.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List the direct folders and files under `folder` (None = root).
    ///
    /// Both reads run in one transaction so the listing is a consistent
    /// snapshot. `order` defaults to [`SortKey::default_order`].
    pub async fn list_contents(
        &self,
        owner: i64,
        folder: Option<i64>,
        key: SortKey,
        order: Option<SortOrder>,
    ) -> Result<Vec<Entry>> {
        let mut tx = self.db.begin().await?;

        if let Some(folder_id) = folder {
            let owned: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM folders WHERE id = $1 AND user_id = $2)",
            )
            .bind(folder_id)
            .bind(owner)
            .fetch_one(&mut *tx)
            .await?;
            if !owned {
                return Err(FilenestError::NotFound("folder".to_string()));
            }
        }

        let folders = FolderRepository::list_by_parent_in(&mut *tx, owner, folder).await?;
        let files = FileRepository::list_by_folder_in(&mut *tx, owner, folder).await?;
        tx.commit().await?;

        let mut entries: Vec<Entry> = folders
            .into_iter()
            .map(Entry::Folder)
            .chain(files.into_iter().map(Entry::File))
            .collect();
        sort_entries(&mut entries, key, order.unwrap_or(key.default_order()));

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::file::{NewFile, NewFolder};
    use crate::Database;
    use chrono::TimeZone;

    fn folder(id: i64, name: &str, secs: i64) -> Entry {
        Entry::Folder(Folder {
            id,
            user_id: 1,
            name: name.to_string(),
            parent_id: None,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        })
    }

    fn file(id: i64, name: &str, secs: i64) -> Entry {
        Entry::File(FileMetadata {
            id,
            user_id: 1,
            folder_id: None,
            name: name.to_string(),
            size: 1,
            path: format!("homepage/{name}"),
            blob_url: String::new(),
            blob_ref: String::new(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        })
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let mut entries = vec![folder(1, "Zeta", 0), folder(2, "alpha", 0), file(1, "Beta.txt", 0)];
        sort_entries(&mut entries, SortKey::Name, SortOrder::Asc);
        assert_eq!(names(&entries), ["alpha", "Beta.txt", "Zeta"]);

        sort_entries(&mut entries, SortKey::Name, SortOrder::Desc);
        assert_eq!(names(&entries), ["Zeta", "Beta.txt", "alpha"]);
    }

    #[test]
    fn test_sort_by_created_at() {
        let mut entries = vec![file(1, "old", 10), folder(1, "new", 30), file(2, "mid", 20)];
        sort_entries(&mut entries, SortKey::CreatedAt, SortOrder::Desc);
        assert_eq!(names(&entries), ["new", "mid", "old"]);

        sort_entries(&mut entries, SortKey::CreatedAt, SortOrder::Asc);
        assert_eq!(names(&entries), ["old", "mid", "new"]);
    }

    #[test]
    fn test_tie_break_does_not_flip() {
        let mut entries = vec![file(1, "same", 5), folder(9, "same", 5), folder(3, "Same", 5)];

        sort_entries(&mut entries, SortKey::Name, SortOrder::Asc);
        let asc: Vec<(bool, i64)> = entries.iter().map(|e| (e.is_folder(), e.id())).collect();
        assert_eq!(asc, [(true, 3), (true, 9), (false, 1)]);

        sort_entries(&mut entries, SortKey::CreatedAt, SortOrder::Desc);
        let desc: Vec<(bool, i64)> = entries.iter().map(|e| (e.is_folder(), e.id())).collect();
        assert_eq!(desc, asc);
    }

    #[test]
    fn test_default_orders() {
        assert_eq!(SortKey::Name.default_order(), SortOrder::Asc);
        assert_eq!(SortKey::CreatedAt.default_order(), SortOrder::Desc);
        assert_eq!(SortKey::default(), SortKey::Name);
    }

    #[test]
    fn test_parse_sort_params() {
        assert_eq!("createdAt".parse::<SortKey>().unwrap(), SortKey::CreatedAt);
        assert!("size".parse::<SortKey>().is_err());
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }

    async fn setup() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        users.create(&NewUser::new("alice", "hash")).await.unwrap();
        users.create(&NewUser::new("bob", "hash")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_list_contents_merges_and_sorts() {
        let db = setup().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        folders.create(&NewFolder::new(1, "Zeta")).await.unwrap();
        folders.create(&NewFolder::new(1, "alpha")).await.unwrap();
        files
            .create(&NewFile::new(1, "Beta.txt", 3, "u", "r"))
            .await
            .unwrap();
        folders.create(&NewFolder::new(2, "Bob's")).await.unwrap();

        let lister = ContentLister::new(&db);
        let entries = lister
            .list_contents(1, None, SortKey::Name, None)
            .await
            .unwrap();
        assert_eq!(names(&entries), ["alpha", "Beta.txt", "Zeta"]);
    }

    #[tokio::test]
    async fn test_list_contents_of_folder() {
        let db = setup().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let docs = folders.create(&NewFolder::new(1, "Docs")).await.unwrap();
        folders
            .create(&NewFolder::new(1, "Work").with_parent(docs.id))
            .await
            .unwrap();
        files
            .create(&NewFile::new(1, "cv.pdf", 3, "u", "r").in_folder(Some(docs.id)))
            .await
            .unwrap();

        let lister = ContentLister::new(&db);
        let entries = lister
            .list_contents(1, Some(docs.id), SortKey::CreatedAt, Some(SortOrder::Asc))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_folder());
    }

    #[tokio::test]
    async fn test_list_contents_foreign_folder_not_found() {
        let db = setup().await;
        let docs = FolderRepository::new(db.pool())
            .create(&NewFolder::new(1, "Docs"))
            .await
            .unwrap();

        let result = ContentLister::new(&db)
            .list_contents(2, Some(docs.id), SortKey::Name, None)
            .await;
        assert!(matches!(result, Err(FilenestError::NotFound(_))));
    }
}
