use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use futures::future::{self, BoxFuture, FutureExt};

/// Read-only access to license metadata files.
///
/// Implementations must be shareable across reader workers.
pub trait MetadataSource: Send + Sync + 'static {
    fn read(&self, name: &str) -> BoxFuture<'static, io::Result<String>>;
}

/// Reads metadata files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FsSource {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl MetadataSource for FsSource {
    fn read(&self, name: &str) -> BoxFuture<'static, io::Result<String>> {
        let path = self.root.join(name);
        async move { tokio::fs::read_to_string(path).await }.boxed()
    }
}

/// Serves metadata files from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }
}

impl MetadataSource for MemorySource {
    fn read(&self, name: &str) -> BoxFuture<'static, io::Result<String>> {
        let result = self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{name}: no such file"))
        });
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_source_reads_relative_to_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        let mut f = std::fs::File::create(dir.path().join("out/bin.meta_lic")).unwrap();
        write!(f, "package_name = \"bin\"").unwrap();

        let source = FsSource::new(dir.path());
        let content = source.read("out/bin.meta_lic").await.unwrap();
        assert_eq!(content, "package_name = \"bin\"");

        let err = source.read("out/missing.meta_lic").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new().with_file("a.meta_lic", "");
        assert_eq!(source.read("a.meta_lic").await.unwrap(), "");
        assert_eq!(
            source.read("b.meta_lic").await.unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
