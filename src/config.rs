//! Settings file loading.
//!
//! Every run is driven by a small key/value file (TOML syntax) holding the
//! four knobs the converter needs:
//!
//! ```toml
//! input_dir  = "/srv/scans/incoming"
//! output_dir = "/srv/scans/jpg"
//! dpi        = 300
//! quality    = 95
//! ```
//!
//! When the file does not exist a commented template is written in its place
//! and [`load_or_create`] returns [`SettingsOutcome::Created`]; the caller is
//! expected to stop so the operator can fill it in. A present file must carry
//! every required key with a usable value, otherwise loading fails with a
//! [`ConfigError`] naming the offending key. Values are never clamped or
//! defaulted: what the operator wrote is what the batch uses.

use crate::error::ConfigError;
use serde::Serialize;
use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, info, warn};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

/// Valid JPEG quality values, as understood by the `image` crate's encoder.
pub const QUALITY_RANGE: RangeInclusive<u8> = 1..=100;

const KNOWN_KEYS: [&str; 5] = ["input_dir", "output_dir", "dpi", "quality", "recursive"];

/// Written when the settings file is missing.
pub const TEMPLATE: &str = r#"# pdf2jpg settings
#
# Every PDF in `input_dir` is rendered at `dpi` and each page is saved as
# `<name>_page<N>.jpg` in `output_dir`. Converted PDFs are renamed to
# `<name>_processed.pdf` so the next run skips them.

input_dir = "/path/to/pdfs"
output_dir = "/path/to/jpgs"

# Rasterisation resolution in dots per inch (> 0). Pages larger than
# 100 million pixels are refused, e.g. Letter above ~1000 dpi.
dpi = 300

# JPEG quality, 1 (smallest) to 100 (best).
quality = 95

# Also convert PDFs in subdirectories of `input_dir`, mirroring the
# directory layout under `output_dir`.
# recursive = false
"#;

/// Validated run settings.
///
/// Created once at startup and passed by reference into the batch; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Directory scanned for `*.pdf` files.
    pub input_dir: PathBuf,
    /// Directory receiving `*.jpg` page images. Created if absent.
    pub output_dir: PathBuf,
    /// Rendering resolution; pages are scaled by `dpi / 72`.
    pub dpi: u32,
    /// JPEG quality in [`QUALITY_RANGE`].
    pub quality: u8,
    /// Walk subdirectories of `input_dir` too. Default: false.
    pub recursive: bool,
}

/// Result of [`load_or_create`].
#[derive(Debug)]
pub enum SettingsOutcome {
    /// The file existed and every key was valid.
    Loaded(Settings),
    /// The file was missing; a template was written at this path and no
    /// conversion should happen on this invocation.
    Created(PathBuf),
}

/// Load the settings file at `path`, or write a template there if it is missing.
pub fn load_or_create(path: &Path) -> Result<SettingsOutcome, ConfigError> {
    debug!("Checking for settings file at {}", path.display());

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            write_template(path)?;
            warn!(
                "Settings file not found; wrote a template to {}",
                path.display()
            );
            return Ok(SettingsOutcome::Created(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings = Settings::parse(&text, path)?;
    info!(
        input_dir = %settings.input_dir.display(),
        output_dir = %settings.output_dir.display(),
        dpi = settings.dpi,
        quality = settings.quality,
        recursive = settings.recursive,
        "Settings loaded from {}",
        path.display()
    );
    Ok(SettingsOutcome::Loaded(settings))
}

fn write_template(path: &Path) -> Result<(), ConfigError> {
    let template_err = |source| ConfigError::TemplateWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(template_err)?;
    }
    std::fs::write(path, TEMPLATE).map_err(template_err)
}

impl Settings {
    /// Parse and validate settings text. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let table: Table = text.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            detail: e.message().to_string(),
        })?;

        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("Ignoring unknown settings key '{}' in {}", key, path.display());
            }
        }

        let fields = Fields { table: &table, path };
        Ok(Settings {
            input_dir: fields.dir("input_dir")?,
            output_dir: fields.dir("output_dir")?,
            dpi: fields.int("dpi", 1..=i64::from(u32::MAX))? as u32,
            quality: fields.int(
                "quality",
                i64::from(*QUALITY_RANGE.start())..=i64::from(*QUALITY_RANGE.end()),
            )? as u8,
            recursive: fields.flag("recursive")?.unwrap_or(false),
        })
    }

    /// Check the directories before any file is touched.
    ///
    /// `input_dir` must already exist; `output_dir` is created if needed.
    pub fn prepare_dirs(&self) -> Result<(), ConfigError> {
        if !self.input_dir.is_dir() {
            return Err(ConfigError::InputDirMissing {
                path: self.input_dir.clone(),
            });
        }

        if !self.output_dir.is_dir() {
            std::fs::create_dir_all(&self.output_dir).map_err(|source| {
                ConfigError::OutputDir {
                    path: self.output_dir.clone(),
                    source,
                }
            })?;
            info!("Output directory created: {}", self.output_dir.display());
        }
        Ok(())
    }
}

/// Typed accessors over the parsed table that report errors by key.
struct Fields<'a> {
    table: &'a Table,
    path: &'a Path,
}

impl Fields<'_> {
    fn invalid(&self, key: &'static str, detail: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            path: self.path.to_path_buf(),
            key,
            detail: detail.into(),
        }
    }

    fn required(&self, key: &'static str) -> Result<&Value, ConfigError> {
        self.table.get(key).ok_or_else(|| ConfigError::MissingKey {
            path: self.path.to_path_buf(),
            key,
        })
    }

    fn dir(&self, key: &'static str) -> Result<PathBuf, ConfigError> {
        match self.required(key)? {
            Value::String(s) if !s.trim().is_empty() => Ok(PathBuf::from(s)),
            Value::String(_) => Err(self.invalid(key, "path must not be blank")),
            other => Err(self.invalid(
                key,
                format!("expected a path string, got {}", other.type_str()),
            )),
        }
    }

    fn int(&self, key: &'static str, range: RangeInclusive<i64>) -> Result<i64, ConfigError> {
        match self.required(key)? {
            Value::Integer(n) if range.contains(n) => Ok(*n),
            Value::Integer(n) => Err(self.invalid(
                key,
                format!("{n} is outside {}..={}", range.start(), range.end()),
            )),
            other => Err(self.invalid(
                key,
                format!("expected an integer, got {}", other.type_str()),
            )),
        }
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        match self.table.get(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(
                key,
                format!("expected true or false, got {}", other.type_str()),
            )),
        }
    }
}
