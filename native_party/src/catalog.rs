//! Read-only media catalog consulted for `video-list` / `image-list`.
//!
//! The catalog is queried on demand and never cached by the coordinator.
//! Scanning, thumbnail rendering and persistence are somebody else's job;
//! [`DirectoryCatalog`] only lists what is already on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use party_shared::MediaEntry;

pub trait MediaCatalog: Send + Sync {
    fn list_videos(&self) -> Result<Vec<MediaEntry>>;
    fn list_images(&self) -> Result<Vec<MediaEntry>>;
}

/// Catalog backed by the configured media directories.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    videos_path: PathBuf,
    images_path: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(videos_path: impl Into<PathBuf>, images_path: impl Into<PathBuf>) -> Self {
        Self {
            videos_path: videos_path.into(),
            images_path: images_path.into(),
        }
    }

    fn list(root: &Path) -> Result<Vec<MediaEntry>> {
        if !root.exists() {
            tracing::warn!(path = %root.display(), "media directory does not exist");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        collect_files(root, &mut files)?;

        let mut entries: Vec<MediaEntry> = files.iter().filter_map(|p| entry_for(p)).collect();
        entries.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.file.cmp(&b.file)));
        Ok(entries)
    }
}

impl MediaCatalog for DirectoryCatalog {
    fn list_videos(&self) -> Result<Vec<MediaEntry>> {
        Self::list(&self.videos_path)
    }

    fn list_images(&self) -> Result<Vec<MediaEntry>> {
        Self::list(&self.images_path)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let read = fs::read_dir(dir).with_context(|| format!("reading media directory '{}'", dir.display()))?;
    for entry in read {
        let entry = entry.with_context(|| format!("listing '{}'", dir.display()))?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        let file_type = entry
            .file_type()
            .with_context(|| format!("inspecting '{}'", path.display()))?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Title is the file stem, the thumbnail is `<stem>.jpg`.
fn entry_for(path: &Path) -> Option<MediaEntry> {
    let file = path.file_name()?.to_str()?.to_string();
    let stem = path.file_stem()?.to_str()?.to_string();
    Some(MediaEntry {
        thumbnail: format!("{stem}.jpg"),
        title: stem,
        file,
    })
}

/// Fixed listings, used when no media directories are wanted.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub videos: Vec<MediaEntry>,
    pub images: Vec<MediaEntry>,
}

impl MediaCatalog for StaticCatalog {
    fn list_videos(&self) -> Result<Vec<MediaEntry>> {
        Ok(self.videos.clone())
    }

    fn list_images(&self) -> Result<Vec<MediaEntry>> {
        Ok(self.images.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("native_party_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn lists_files_recursively_sorted_by_title() {
        let root = scratch_dir("catalog_list");
        fs::create_dir_all(root.join("series")).unwrap();
        fs::write(root.join("zeta.mp4"), b"").unwrap();
        fs::write(root.join("series").join("alpha.mkv"), b"").unwrap();
        fs::write(root.join(".hidden.mp4"), b"").unwrap();

        let catalog = DirectoryCatalog::new(&root, root.join("missing"));
        let videos = catalog.list_videos().unwrap();
        assert_eq!(
            videos,
            vec![
                MediaEntry {
                    title: "alpha".into(),
                    file: "alpha.mkv".into(),
                    thumbnail: "alpha.jpg".into(),
                },
                MediaEntry {
                    title: "zeta".into(),
                    file: "zeta.mp4".into(),
                    thumbnail: "zeta.jpg".into(),
                },
            ]
        );
        assert!(catalog.list_images().unwrap().is_empty());

        let _ = fs::remove_dir_all(&root);
    }
}
