//! In-memory file and folder store owned by one session

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of the folder that always exists and can never be deleted
pub const ROOT_FOLDER: &str = "root";

/// Extension used when a file name carries none
const DEFAULT_EXTENSION: &str = "txt";

/// Opaque, unique identifier of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: FileId,
    pub name: String,
    /// Last `.`-delimited segment of the name, `txt` when absent
    pub extension: String,
    pub content: String,
    pub folder: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Listing view of a file, without its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub extension: String,
    pub modified_at: DateTime<Utc>,
}

impl From<&FileEntry> for FileSummary {
    fn from(entry: &FileEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            extension: entry.extension.clone(),
            modified_at: entry.modified_at,
        }
    }
}

/// Derive the extension of a file name
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Folders and files of one session.
///
/// Every id listed in a folder exists in the file map and each file is listed
/// in exactly one folder. The root folder is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    files: HashMap<FileId, FileEntry>,
    folders: IndexMap<String, Vec<FileId>>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create an empty workspace holding only the root folder
    pub fn new() -> Self {
        let mut folders = IndexMap::new();
        folders.insert(ROOT_FOLDER.to_string(), Vec::new());
        Self {
            files: HashMap::new(),
            folders,
        }
    }

    /// Store a new file, creating its folder when needed
    pub fn add_file(&mut self, name: &str, content: &str, folder: Option<&str>) -> FileId {
        let folder = folder.unwrap_or(ROOT_FOLDER);
        let now = Utc::now();
        let id = FileId::new();

        let entry = FileEntry {
            id: id.clone(),
            name: name.to_string(),
            extension: extension_of(name),
            content: content.to_string(),
            folder: folder.to_string(),
            created_at: now,
            modified_at: now,
        };

        self.files.insert(id.clone(), entry);
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(id.clone());

        tracing::debug!("Added file {} ({}) to folder {}", name, id, folder);
        id
    }

    /// Create an empty folder; false when it already exists
    pub fn add_folder(&mut self, name: &str) -> bool {
        if self.folders.contains_key(name) {
            return false;
        }
        self.folders.insert(name.to_string(), Vec::new());
        true
    }

    pub fn get_file(&self, id: &FileId) -> Option<&FileEntry> {
        self.files.get(id)
    }

    pub fn contains_file(&self, id: &FileId) -> bool {
        self.files.contains_key(id)
    }

    /// Replace a file's content; false when the id is unknown
    pub fn update_file(&mut self, id: &FileId, content: &str) -> bool {
        match self.files.get_mut(id) {
            Some(entry) => {
                entry.content = content.to_string();
                entry.modified_at = std::cmp::max(Utc::now(), entry.modified_at);
                true
            }
            None => false,
        }
    }

    /// Remove a file from its folder and the file map
    pub fn delete_file(&mut self, id: &FileId) -> bool {
        let Some(entry) = self.files.remove(id) else {
            return false;
        };
        if let Some(ids) = self.folders.get_mut(&entry.folder) {
            ids.retain(|existing| existing != id);
        }
        true
    }

    /// Remove a folder with every file in it; the root folder is refused
    pub fn delete_folder(&mut self, name: &str) -> bool {
        if name == ROOT_FOLDER {
            return false;
        }
        let Some(ids) = self.folders.shift_remove(name) else {
            return false;
        };
        for id in &ids {
            self.files.remove(id);
        }
        tracing::debug!("Deleted folder {} with {} file(s)", name, ids.len());
        true
    }

    pub fn has_folder(&self, name: &str) -> bool {
        self.folders.contains_key(name)
    }

    /// Summaries of the files in one folder, in insertion order
    pub fn list_folder(&self, name: &str) -> Vec<FileSummary> {
        self.folders
            .get(name)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.files.get(id))
                    .map(FileSummary::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every folder with its file summaries, in folder creation order
    pub fn folders(&self) -> IndexMap<String, Vec<FileSummary>> {
        self.folders
            .keys()
            .map(|name| (name.clone(), self.list_folder(name)))
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workspace_has_only_root() {
        let workspace = Workspace::new();
        let folders = workspace.folders();
        assert_eq!(folders.len(), 1);
        assert!(folders[ROOT_FOLDER].is_empty());
    }

    #[test]
    fn test_add_then_get_returns_content() {
        let mut workspace = Workspace::new();
        let id = workspace.add_file("main.py", "print('hi')\n", None);

        let entry = workspace.get_file(&id).unwrap();
        assert_eq!(entry.content, "print('hi')\n");
        assert_eq!(entry.extension, "py");
        assert_eq!(entry.folder, ROOT_FOLDER);
        assert_eq!(entry.created_at, entry.modified_at);
    }

    #[test]
    fn test_extension_derivation() {
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("Makefile"), "txt");
        assert_eq!(extension_of("trailing."), "txt");
        assert_eq!(extension_of(".bashrc"), "bashrc");
    }

    #[test]
    fn test_add_file_creates_folder() {
        let mut workspace = Workspace::new();
        let id = workspace.add_file("a.js", "", Some("scripts"));

        assert!(workspace.has_folder("scripts"));
        assert_eq!(workspace.list_folder("scripts")[0].id, id);
    }

    #[test]
    fn test_add_folder_twice() {
        let mut workspace = Workspace::new();
        assert!(workspace.add_folder("styles"));
        assert!(!workspace.add_folder("styles"));
        assert!(!workspace.add_folder(ROOT_FOLDER));
    }

    #[test]
    fn test_update_refreshes_modified_at() {
        let mut workspace = Workspace::new();
        let id = workspace.add_file("a.css", "body {}", None);
        let before = workspace.get_file(&id).unwrap().modified_at;

        assert!(workspace.update_file(&id, "p {}"));
        let entry = workspace.get_file(&id).unwrap();
        assert_eq!(entry.content, "p {}");
        assert!(entry.modified_at >= before);

        assert!(!workspace.update_file(&FileId::from("missing"), "x"));
    }

    #[test]
    fn test_delete_file_removes_from_folder() {
        let mut workspace = Workspace::new();
        let id = workspace.add_file("a.txt", "", None);

        assert!(workspace.delete_file(&id));
        assert!(workspace.get_file(&id).is_none());
        assert!(workspace.list_folder(ROOT_FOLDER).is_empty());
        assert!(!workspace.delete_file(&id));
    }

    #[test]
    fn test_delete_folder_cascades() {
        let mut workspace = Workspace::new();
        let a = workspace.add_file("a.sql", "", Some("db"));
        let b = workspace.add_file("b.sql", "", Some("db"));
        let kept = workspace.add_file("c.sql", "", None);

        let listed: Vec<FileId> = workspace.list_folder("db").into_iter().map(|s| s.id).collect();
        assert!(workspace.delete_folder("db"));

        for id in listed.iter().chain([&a, &b]) {
            assert!(workspace.get_file(id).is_none());
        }
        assert!(workspace.get_file(&kept).is_some());
        assert!(!workspace.has_folder("db"));
        assert!(!workspace.delete_folder("db"));
    }

    #[test]
    fn test_root_cannot_be_deleted() {
        let mut workspace = Workspace::new();
        workspace.add_file("a.txt", "", None);
        assert!(!workspace.delete_folder(ROOT_FOLDER));
        assert_eq!(workspace.file_count(), 1);
    }

    #[test]
    fn test_folders_keep_creation_order() {
        let mut workspace = Workspace::new();
        workspace.add_folder("zeta");
        workspace.add_folder("alpha");
        let names: Vec<String> = workspace.folders().keys().cloned().collect();
        assert_eq!(names, vec!["root", "zeta", "alpha"]);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut workspace = Workspace::new();
        let a = workspace.add_file("same.txt", "", None);
        let b = workspace.add_file("same.txt", "", None);
        assert_ne!(a, b);
        assert_eq!(workspace.list_folder(ROOT_FOLDER).len(), 2);
    }
}
