//! In-memory filesystem backend
//!
//! A small test double implementing [`FsProvider`] entirely in memory. Kept
//! in the library proper (not behind `cfg(test)`) so downstream crates can
//! exercise their event handling without touching a real filesystem.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::provider::{FileMeta, FsProvider};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// In-memory filesystem. Directory listings come back in sorted order, which
/// keeps traversal order deterministic in tests.
#[derive(Debug, Default)]
pub struct MemFs {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a directory, creating missing ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = self.nodes.lock().unwrap();
        Self::insert_ancestors(&mut nodes, path.as_ref());
        nodes.insert(path.as_ref().to_path_buf(), Node::Dir);
    }

    /// Insert a file with the given contents, creating missing ancestors.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let mut nodes = self.nodes.lock().unwrap();
        Self::insert_ancestors(&mut nodes, path.as_ref());
        nodes.insert(path.as_ref().to_path_buf(), Node::File(contents.into()));
    }

    /// Remove a path (and nothing else). Useful for simulating entries that
    /// vanish mid-walk.
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.nodes.lock().unwrap().remove(path.as_ref());
    }

    fn insert_ancestors(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such file or directory: {}", path.display()),
        )
    }
}

impl FsProvider for MemFs {
    type Stream = io::Cursor<Vec<u8>>;

    async fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(Node::Dir) => Ok(FileMeta {
                is_dir: true,
                len: 0,
            }),
            Some(Node::File(data)) => Ok(FileMeta {
                is_dir: false,
                len: data.len() as u64,
            }),
            None => Err(Self::not_found(path)),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("not a directory: {}", path.display()),
                ));
            }
            None => return Err(Self::not_found(path)),
        }

        // BTreeMap iteration keeps children sorted.
        let names = nodes
            .keys()
            .filter(|k| k.parent() == Some(path))
            .filter_map(|k| k.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }

    async fn open_read_stream(&self, path: &Path) -> io::Result<Self::Stream> {
        let nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(Node::File(data)) => Ok(io::Cursor::new(data.clone())),
            Some(Node::Dir) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stat_and_listing() {
        let fs = MemFs::new();
        fs.add_file("/scan/mem/foo.txt", b"hello".to_vec());

        // Ancestors were created implicitly.
        assert!(fs.stat(Path::new("/scan")).await.unwrap().is_dir);
        assert!(fs.stat(Path::new("/scan/mem")).await.unwrap().is_dir);

        let meta = fs.stat(Path::new("/scan/mem/foo.txt")).await.unwrap();
        assert!(!meta.is_dir);
        assert_eq!(meta.len, 5);

        let names = fs.read_dir(Path::new("/scan")).await.unwrap();
        assert_eq!(names, vec!["mem".to_string()]);
    }

    #[tokio::test]
    async fn test_listing_is_sorted() {
        let fs = MemFs::new();
        fs.add_file("/r/z.txt", b"z".to_vec());
        fs.add_file("/r/a.txt", b"a".to_vec());
        fs.add_dir("/r/m");

        let names = fs.read_dir(Path::new("/r")).await.unwrap();
        assert_eq!(names, vec!["a.txt", "m", "z.txt"]);
    }

    #[tokio::test]
    async fn test_missing_paths_error() {
        let fs = MemFs::new();
        assert!(fs.stat(Path::new("/nope")).await.is_err());
        assert!(fs.read_dir(Path::new("/nope")).await.is_err());
        assert!(fs.open_read_stream(Path::new("/nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_stream_contents() {
        use tokio::io::AsyncReadExt;

        let fs = MemFs::new();
        fs.add_file("/f", b"data".to_vec());
        let mut stream = fs.open_read_stream(Path::new("/f")).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"data");
    }
}
