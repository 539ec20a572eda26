use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("image source is empty")]
    EmptySource,
    #[error("remote image source is not supported: {url}")]
    RemoteSource { url: String },
    #[error("failed to read image {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },
    #[error("image loader stopped before reporting {url}")]
    WorkerLost { url: String },
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Resolves an image source to its natural `(width, height)`.
///
/// Called from worker threads while the readiness gate waits.
pub trait ImageLoader: Send + Sync {
    fn load(&self, source: &str) -> LoadResult<(u32, u32)>;
}

impl<F> ImageLoader for F
where
    F: Fn(&str) -> LoadResult<(u32, u32)> + Send + Sync,
{
    fn load(&self, source: &str) -> LoadResult<(u32, u32)> {
        self(source)
    }
}

/// Reads image headers from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    base_dir: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve_path(&self, source: &str) -> PathBuf {
        let path = Path::new(source.strip_prefix("file://").unwrap_or(source));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, source: &str) -> LoadResult<(u32, u32)> {
        let source = source.trim();
        if source.is_empty() {
            return Err(LoadError::EmptySource);
        }
        if is_remote(source) {
            return Err(LoadError::RemoteSource {
                url: source.to_string(),
            });
        }
        let path = self.resolve_path(source);
        image::image_dimensions(&path).map_err(|err| LoadError::ReadFailed {
            path,
            message: err.to_string(),
        })
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    ["http://", "https://", "data:", "blob:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_loader_reads_natural_dimensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sample.png");
        image::RgbImage::new(6, 4)
            .save(&path)
            .expect("write sample png");

        let loader = FileImageLoader::new();
        let dimensions = loader
            .load(path.to_str().expect("utf-8 path"))
            .expect("png should load");
        assert_eq!(dimensions, (6, 4));
    }

    #[test]
    fn file_loader_resolves_relative_sources_against_base_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        image::RgbImage::new(2, 3)
            .save(dir.path().join("relative.png"))
            .expect("write sample png");

        let loader = FileImageLoader::with_base_dir(dir.path());
        assert_eq!(loader.load("relative.png"), Ok((2, 3)));
        assert_eq!(loader.load("file://relative.png"), Ok((2, 3)));
    }

    #[test]
    fn file_loader_rejects_remote_and_missing_sources() {
        let loader = FileImageLoader::new();
        assert!(matches!(
            loader.load("https://example.com/a.png"),
            Err(LoadError::RemoteSource { .. })
        ));
        assert_eq!(loader.load("   "), Err(LoadError::EmptySource));
        assert!(matches!(
            loader.load("/definitely/not/here.png"),
            Err(LoadError::ReadFailed { .. })
        ));
    }

    #[test]
    fn closures_act_as_loaders() {
        let loader = |source: &str| -> LoadResult<(u32, u32)> {
            if source == "ok" {
                Ok((10, 20))
            } else {
                Err(LoadError::EmptySource)
            }
        };
        assert_eq!(loader.load("ok"), Ok((10, 20)));
        assert!(loader.load("nope").is_err());
    }
}
