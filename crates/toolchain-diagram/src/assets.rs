//! Icon asset retrieval
//!
//! Downloads each remote icon to a local file before the diagram is built.
//! Fetches run one after another; the first failure aborts the whole step,
//! so a diagram is never rendered with an icon silently missing. Files are
//! always re-fetched and replaced atomically through a staged temp file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, span, Level};

use crate::core::DiagramError;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("toolchain-diagram/", env!("CARGO_PKG_VERSION"));

/// Largest icon accepted, in bytes
pub const MAX_ICON_BYTES: u64 = 10 * 1024 * 1024;

/// Permissions of fetched icons (unix)
pub const ICON_MODE: u32 = 0o644;

/// A remote icon and the local file it is saved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconAsset {
    /// Lookup key used by the topology
    pub key: &'static str,
    pub url: &'static str,
    /// Destination, relative to the asset root
    pub filename: &'static str,
}

impl IconAsset {
    pub const fn new(key: &'static str, url: &'static str, filename: &'static str) -> Self {
        Self { key, url, filename }
    }
}

/// Blocking HTTP GET
///
/// Implementations return the response body, or an error for unreachable
/// hosts and non-success statuses.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Transport`] backed by a `ureq` agent
pub struct HttpTransport {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpTransport {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(true)
            .build()
            .into();
        Self {
            agent,
            max_bytes: MAX_ICON_BYTES,
        }
    }

    /// Reject bodies larger than `max_bytes`
    pub fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .with_context(|| format!("HTTP request failed for {}", url))?;

        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(body)
    }
}

/// An icon written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalAsset {
    pub key: String,
    /// Path relative to the asset root, as referenced by the diagram
    pub path: PathBuf,
    /// Size written, 0 when the asset was planned but not fetched
    pub bytes: u64,
}

/// Local paths of the fetched icon assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPaths {
    root: PathBuf,
    assets: Vec<LocalAsset>,
}

impl AssetPaths {
    /// Paths the assets would have, without fetching anything
    pub fn planned(root: impl Into<PathBuf>, assets: &[IconAsset]) -> Self {
        Self {
            root: root.into(),
            assets: assets
                .iter()
                .map(|a| LocalAsset {
                    key: a.key.to_string(),
                    path: PathBuf::from(a.filename),
                    bytes: 0,
                })
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LocalAsset> {
        self.assets.iter().find(|a| a.key == key)
    }

    /// Relative path of the asset registered under `key`
    pub fn path(&self, key: &str) -> Result<&Path> {
        self.get(key).map(|a| a.path.as_path()).ok_or_else(|| {
            DiagramError::topology_error(format!("no icon asset registered for '{}'", key)).into()
        })
    }

    /// Path of the asset joined onto the asset root
    pub fn absolute(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(self.path(key)?))
    }

    /// The same assets with every path absolute
    ///
    /// A diagram built from these references its icons independently of the
    /// directory the renderer runs in.
    pub fn resolved(&self) -> Result<AssetPaths> {
        let root = fs::canonicalize(&self.root).map_err(|e| {
            DiagramError::topology_error(format!(
                "asset root {} is not usable: {}",
                self.root.display(),
                e
            ))
        })?;
        let assets = self
            .assets
            .iter()
            .map(|a| LocalAsset {
                path: root.join(&a.path),
                ..a.clone()
            })
            .collect();
        Ok(AssetPaths { root, assets })
    }
}

/// Write `body` to `destination` through a temp file in the same directory
fn write_atomic(destination: &Path, body: &[u8]) -> std::io::Result<()> {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new().prefix(".icon-").tempfile_in(dir)?;
    staged.write_all(body)?;
    staged.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(ICON_MODE))?;
    }

    staged.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

fn check_asset(asset: &IconAsset) -> Result<(), DiagramError> {
    if !(asset.url.starts_with("https://") || asset.url.starts_with("http://")) {
        return Err(DiagramError::retrieval_error(
            asset.url,
            "only http:// and https:// URLs are supported",
        ));
    }
    if Path::new(asset.filename).is_absolute() || asset.filename.is_empty() {
        return Err(DiagramError::retrieval_error(
            asset.url,
            format!("destination '{}' must be a relative file name", asset.filename),
        ));
    }
    Ok(())
}

/// Fetch every asset into `root`, in order, stopping at the first failure
///
/// Any failure (bad URL, unreachable host, error status, empty body, write
/// error) is a [`DiagramError::RetrievalError`] naming the URL.
pub fn fetch_assets(
    transport: &impl Transport,
    assets: &[IconAsset],
    root: impl AsRef<Path>,
) -> Result<AssetPaths> {
    let root = root.as_ref();
    let fetch_span = span!(Level::INFO, "fetch_assets", count = assets.len(), root = %root.display());
    let _enter = fetch_span.enter();

    let mut fetched = Vec::with_capacity(assets.len());
    for asset in assets {
        check_asset(asset)?;

        debug!(key = asset.key, url = asset.url, "Fetching icon");
        let body = transport
            .get(asset.url)
            .map_err(|e| DiagramError::retrieval_error(asset.url, format!("{:#}", e)))?;
        if body.is_empty() {
            return Err(DiagramError::retrieval_error(asset.url, "empty response body").into());
        }

        let destination = root.join(asset.filename);
        write_atomic(&destination, &body).map_err(|e| {
            DiagramError::retrieval_error(
                asset.url,
                format!("cannot write {}: {}", destination.display(), e),
            )
        })?;

        info!(
            key = asset.key,
            bytes = body.len(),
            path = %destination.display(),
            "Fetched icon"
        );
        fetched.push(LocalAsset {
            key: asset.key.to_string(),
            path: PathBuf::from(asset.filename),
            bytes: body.len() as u64,
        });
    }

    Ok(AssetPaths {
        root: root.to_path_buf(),
        assets: fetched,
    })
}
