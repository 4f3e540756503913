use crate::error::LessError;
use crate::result::LessResult;
use std::collections::HashMap;
use std::path::PathBuf;

/// Resource access for built-ins that inline external files (`data-uri`).
///
/// The engine never touches the file system itself; whatever loader the
/// compile pass was configured with hands back the raw bytes.
pub trait ResourceLoader {
    /// Load `url`, resolved against `base` when one is known
    fn load(&self, base: Option<&str>, url: &str) -> LessResult<Vec<u8>>;
}

/// Resolve `url` against `base` the way relative stylesheet references are
/// resolved: drop everything after the last `/` of the base.
pub fn resolve_relative(base: Option<&str>, url: &str) -> String {
    if url.starts_with('/') || url.contains("://") {
        return url.to_string();
    }
    match base.and_then(|base| base.rfind('/').map(|idx| &base[..=idx])) {
        Some(dir) => format!("{}{}", dir, url),
        None => url.to_string(),
    }
}

/// Real file system implementation, rooted at a directory
pub struct RealResourceLoader {
    root: PathBuf,
}

impl RealResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for RealResourceLoader {
    fn load(&self, base: Option<&str>, url: &str) -> LessResult<Vec<u8>> {
        let relative = resolve_relative(base, url);
        let path = self.root.join(relative.trim_start_matches('/'));
        std::fs::read(&path).map_err(|e| LessError::resource(path.display().to_string(), e.to_string()))
    }
}

/// In-memory loader for testing
#[derive(Default)]
pub struct MockResourceLoader {
    pub files: HashMap<String, Vec<u8>>,
}

impl MockResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ResourceLoader for MockResourceLoader {
    fn load(&self, base: Option<&str>, url: &str) -> LessResult<Vec<u8>> {
        let path = resolve_relative(base, url);
        self.files
            .get(&path)
            .cloned()
            .ok_or_else(|| LessError::resource(path, "not found"))
    }
}
