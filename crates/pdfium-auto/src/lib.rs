//! # pdfium-auto
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading and caching it on first use so a
//! plain `pdf2jpg` run needs no manual setup.
//!
//! ## Resolution order
//!
//! 1. `PDFIUM_LIB_PATH`, when it points at an existing file.
//! 2. The per-version cache directory (see [`pdfium_cache_dir`]).
//! 3. A fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    unpacked into the cache directory.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind_pdfium().expect("PDFium unavailable");
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH` — path to an existing pdfium library; skips download.
//! - `PDFIUM_AUTO_CACHE_DIR` — override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Where a resolved library came from. Logged when binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibrarySource {
    /// `PDFIUM_LIB_PATH` pointed at an existing file.
    EnvOverride,
    /// Found in the cache directory from an earlier run.
    Cache,
    /// Downloaded during this call.
    Download,
}

/// A PDFium library present on disk.
#[derive(Debug, Clone)]
pub struct ResolvedLibrary {
    pub path: PathBuf,
    pub source: LibrarySource,
}

/// Release asset layout for one OS/arch pair.
#[derive(Debug, PartialEq, Eq)]
struct Platform {
    archive: &'static str,
    member: &'static str,
    file_name: &'static str,
}

const SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

const fn platform(archive: &'static str, lib: (&'static str, &'static str)) -> Platform {
    Platform {
        archive,
        member: lib.0,
        file_name: lib.1,
    }
}

static PLATFORMS: &[(&str, &str, Platform)] = &[
    ("linux", "x86_64", platform("pdfium-linux-x64.tgz", SO)),
    ("linux", "aarch64", platform("pdfium-linux-arm64.tgz", SO)),
    ("macos", "x86_64", platform("pdfium-mac-x64.tgz", DYLIB)),
    ("macos", "aarch64", platform("pdfium-mac-arm64.tgz", DYLIB)),
    ("windows", "x86_64", platform("pdfium-win-x64.tgz", DLL)),
    ("windows", "aarch64", platform("pdfium-win-arm64.tgz", DLL)),
    ("windows", "x86", platform("pdfium-win-x86.tgz", DLL)),
];

fn platform_for(os: &str, arch: &str) -> Option<&'static Platform> {
    PLATFORMS
        .iter()
        .find(|(o, a, _)| *o == os && *a == arch)
        .map(|(_, _, p)| p)
}

fn current_platform() -> Result<&'static Platform, PdfiumAutoError> {
    let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
    platform_for(os, arch).ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    })
}

/// Per-version cache directory for the PDFium library.
///
/// Defaults to `{cache_dir}/pdf2jpg/pdfium-{VERSION}`; `PDFIUM_AUTO_CACHE_DIR`
/// replaces the `{cache_dir}/pdf2jpg` part.
pub fn pdfium_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(root) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(root).join(versioned);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdf2jpg")
        .join(versioned)
}

fn env_override() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("PDFIUM_LIB_PATH")?);
    if path.is_file() {
        Some(path)
    } else {
        warn!(
            "PDFIUM_LIB_PATH '{}' does not exist; falling back to the cache",
            path.display()
        );
        None
    }
}

static RESOLVED: OnceLock<ResolvedLibrary> = OnceLock::new();

/// Make sure a PDFium library is on disk and return where it is.
///
/// The result is memoised for the life of the process, so only the first
/// call can touch the network.
pub fn ensure_pdfium_library() -> Result<ResolvedLibrary, PdfiumAutoError> {
    if let Some(resolved) = RESOLVED.get() {
        return Ok(resolved.clone());
    }

    let resolved = resolve()?;
    let _ = RESOLVED.set(resolved.clone());
    Ok(resolved)
}

fn resolve() -> Result<ResolvedLibrary, PdfiumAutoError> {
    if let Some(path) = env_override() {
        return Ok(ResolvedLibrary {
            path,
            source: LibrarySource::EnvOverride,
        });
    }

    let platform = current_platform()?;
    let cache_dir = pdfium_cache_dir();
    let lib_path = cache_dir.join(platform.file_name);

    if lib_path.is_file() {
        debug!("Using cached PDFium at {}", lib_path.display());
        return Ok(ResolvedLibrary {
            path: lib_path,
            source: LibrarySource::Cache,
        });
    }

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let url = format!(
        "{RELEASE_BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}",
        platform.archive
    );
    info!("Downloading PDFium {} from {}", PDFIUM_VERSION, url);
    let archive = download(&url)?;
    unpack_member(&archive, platform.member, &lib_path)?;
    info!("PDFium cached at {}", lib_path.display());

    Ok(ResolvedLibrary {
        path: lib_path,
        source: LibrarySource::Download,
    })
}

/// Locate (downloading if needed) and bind PDFium.
pub fn bind_pdfium() -> Result<Pdfium, PdfiumAutoError> {
    let resolved = ensure_pdfium_library()?;
    info!(
        source = ?resolved.source,
        "Binding PDFium from {}",
        resolved.path.display()
    );
    bind_pdfium_from_path(&resolved.path)
}

/// Bind to the PDFium library at `path` without touching the cache.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download(url: &str) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let mut buf = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
    response
        .read_to_end(&mut buf)
        .map_err(|e| PdfiumAutoError::Download(format!("Read error: {e}")))?;
    Ok(buf)
}

/// Unpack the archive entry named `member` from a `.tgz` into `dest`.
///
/// The entry lands in a `.part` sibling first so an interrupted extraction
/// never leaves a truncated library behind under the real name.
fn unpack_member(archive_bytes: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut archive = Archive::new(GzDecoder::new(archive_bytes));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let is_member = entry.path().map_err(extract_err)?.as_os_str() == member;
        if !is_member {
            continue;
        }

        let partial = dest.with_extension("part");
        entry.unpack(&partial).map_err(extract_err)?;
        std::fs::rename(&partial, dest).map_err(extract_err)?;
        return Ok(());
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tgz_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn known_platforms_resolve() {
        let linux = platform_for("linux", "x86_64").unwrap();
        assert_eq!(linux.archive, "pdfium-linux-x64.tgz");
        assert_eq!(linux.file_name, "libpdfium.so");

        let win = platform_for("windows", "x86").unwrap();
        assert_eq!(win.member, "bin/pdfium.dll");

        assert!(platform_for("haiku", "x86_64").is_none());
    }

    #[test]
    fn cache_dir_is_versioned_and_overridable() {
        let default_dir = pdfium_cache_dir();
        assert!(default_dir.to_string_lossy().contains(PDFIUM_VERSION));

        std::env::set_var("PDFIUM_AUTO_CACHE_DIR", "/tmp/pdf2jpg_cache_override");
        let overridden = pdfium_cache_dir();
        std::env::remove_var("PDFIUM_AUTO_CACHE_DIR");
        assert!(overridden.starts_with("/tmp/pdf2jpg_cache_override"));
        assert!(overridden.ends_with(format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn env_override_wins_when_the_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("libpdfium.so");
        std::fs::write(&lib, b"not really a library").unwrap();

        std::env::set_var("PDFIUM_LIB_PATH", &lib);
        let resolved = resolve();
        std::env::set_var("PDFIUM_LIB_PATH", dir.path().join("missing.so"));
        let missing = env_override();
        std::env::remove_var("PDFIUM_LIB_PATH");

        let resolved = resolved.unwrap();
        assert_eq!(resolved.source, LibrarySource::EnvOverride);
        assert_eq!(resolved.path, lib);
        assert_eq!(missing, None);
    }

    #[test]
    fn unpack_member_extracts_only_the_named_entry() {
        let archive = tgz_with(&[
            ("include/fpdfview.h", b"header"),
            ("lib/libpdfium.so", b"\x7fELF fake"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");

        unpack_member(&archive, "lib/libpdfium.so", &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"\x7fELF fake");
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn unpack_member_reports_missing_entry() {
        let archive = tgz_with(&[("lib/other.so", b"x")]);
        let dir = tempfile::tempdir().unwrap();
        let err = unpack_member(&archive, "lib/libpdfium.so", &dir.path().join("out"))
            .unwrap_err();
        assert!(err.to_string().contains("lib/libpdfium.so"), "got: {err}");
    }
}
