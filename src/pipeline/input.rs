//! Candidate discovery and the processed marker.
//!
//! A file is a candidate when its extension is `pdf` (any ASCII case) and its
//! stem does not already end in [`PROCESSED_SUFFIX`]. Once every page of a
//! candidate has been written, the source is renamed in place from
//! `name.pdf` to `name_processed.pdf`; that rename is the only record that a
//! file is done, so the next run's scan skips it.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Appended to the file stem of a converted PDF.
pub const PROCESSED_SUFFIX: &str = "_processed";

/// One candidate PDF found by [`list_candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Full path of the source PDF.
    pub path: PathBuf,
    /// Directory of the PDF relative to the scanned root (empty at the top level).
    pub relative_dir: PathBuf,
}

impl Job {
    /// File stem used for output names, e.g. `report` for `report.pdf`.
    pub fn stem(&self) -> &OsStr {
        self.path.file_stem().unwrap_or_default()
    }

    /// Directory under `output_root` that receives this job's pages.
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.relative_dir)
    }

    /// `<output_dir>/<stem>`, the prefix shared by every page this job writes.
    ///
    /// Two jobs with the same output stem would write the same files.
    pub fn output_stem(&self, output_root: &Path) -> PathBuf {
        self.output_dir(output_root).join(self.stem())
    }

    /// Output path for 1-based `page`: `<output_dir>/<stem>_page<page>.jpg`.
    pub fn page_output(&self, output_root: &Path, page: usize) -> PathBuf {
        let mut name = self.stem().to_os_string();
        name.push(format!("_page{page}.jpg"));
        self.output_dir(output_root).join(name)
    }
}

/// `true` when `path` has a `.pdf` extension, ignoring ASCII case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// `true` when the file stem already carries the processed marker.
pub fn is_marked(path: &Path) -> bool {
    path.file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with(PROCESSED_SUFFIX))
}

/// `true` for PDFs that still need converting.
pub fn is_candidate(path: &Path) -> bool {
    is_pdf(path) && !is_marked(path)
}

/// The name a source file gets once converted: `a.pdf` → `a_processed.pdf`.
///
/// The extension keeps its original case.
pub fn marked_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.file_stem().unwrap_or_default());
    name.push(PROCESSED_SUFFIX);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// A marked file left by an earlier conversion of the same stem, if any.
///
/// `a.pdf` and `a.PDF` write the same page names, so `a_processed.pdf` and
/// `a_processed.PDF` both count for either source.
pub fn existing_mark(path: &Path) -> Option<PathBuf> {
    let marked = marked_path(path);
    [
        marked.with_extension("pdf"),
        marked.with_extension("PDF"),
        marked,
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Rename `path` to its [`marked_path`] and return the new path.
///
/// Refuses to overwrite an existing marked file so an earlier conversion of a
/// same-named PDF is never clobbered.
pub fn mark_processed(path: &Path) -> io::Result<PathBuf> {
    let target = marked_path(path);
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("'{}' already exists", target.display()),
        ));
    }
    std::fs::rename(path, &target)?;
    debug!("Renamed {} to {}", path.display(), target.display());
    Ok(target)
}

/// List candidate PDFs under `input_dir` in filesystem order.
///
/// Only the top level is scanned unless `recursive` is set. An unreadable
/// `input_dir` is an error; unreadable subdirectories are logged and skipped.
pub fn list_candidates(input_dir: &Path, recursive: bool) -> io::Result<Vec<Job>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut jobs = Vec::new();

    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", input_dir.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_candidate(path) {
            continue;
        }

        let relative_dir = path
            .parent()
            .and_then(|parent| parent.strip_prefix(input_dir).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        jobs.push(Job {
            path: path.to_path_buf(),
            relative_dir,
        });
    }

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn candidate_rules() {
        assert!(is_candidate(Path::new("a.pdf")));
        assert!(is_candidate(Path::new("dir/Report.PDF")));
        assert!(!is_candidate(Path::new("a_processed.pdf")));
        assert!(!is_candidate(Path::new("a_processed.PDF")));
        assert!(!is_candidate(Path::new("notes.txt")));
        assert!(!is_candidate(Path::new("pdf")));
        assert!(!is_candidate(Path::new("archive.pdf.zip")));
    }

    #[test]
    fn marked_path_only_touches_the_stem() {
        assert_eq!(marked_path(Path::new("in/a.pdf")), PathBuf::from("in/a_processed.pdf"));
        assert_eq!(marked_path(Path::new("B.PDF")), PathBuf::from("B_processed.PDF"));
        // A ".pdf" inside the stem stays put.
        assert_eq!(
            marked_path(Path::new("x.pdf.backup.pdf")),
            PathBuf::from("x.pdf.backup_processed.pdf")
        );
    }

    #[test]
    fn existing_mark_ignores_extension_case() {
        let dir = tempfile::tempdir().unwrap();
        let lower = dir.path().join("a.pdf");
        let upper = dir.path().join("a.PDF");
        assert_eq!(existing_mark(&lower), None);

        fs::write(dir.path().join("a_processed.pdf"), b"done").unwrap();
        assert_eq!(existing_mark(&lower), Some(dir.path().join("a_processed.pdf")));
        assert!(existing_mark(&upper).is_some());
        assert_eq!(existing_mark(&dir.path().join("b.pdf")), None);
    }

    #[test]
    fn extension_case_does_not_change_output_names() {
        let lower = Job {
            path: PathBuf::from("/in/a.pdf"),
            relative_dir: PathBuf::new(),
        };
        let upper = Job {
            path: PathBuf::from("/in/a.PDF"),
            relative_dir: PathBuf::new(),
        };
        let out = Path::new("/out");
        assert_eq!(lower.output_stem(out), upper.output_stem(out));
        assert_eq!(lower.page_output(out, 1), upper.page_output(out, 1));
    }

    #[test]
    fn page_output_naming() {
        let job = Job {
            path: PathBuf::from("/in/sub/scan.pdf"),
            relative_dir: PathBuf::from("sub"),
        };
        assert_eq!(
            job.page_output(Path::new("/out"), 1),
            PathBuf::from("/out/sub/scan_page1.jpg")
        );
        assert_eq!(
            job.page_output(Path::new("/out"), 12),
            PathBuf::from("/out/sub/scan_page12.jpg")
        );
    }

    #[test]
    fn mark_processed_renames_and_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        fs::write(&a, b"first").unwrap();

        let marked = mark_processed(&a).unwrap();
        assert_eq!(marked, dir.path().join("a_processed.pdf"));
        assert!(!a.exists());

        fs::write(&a, b"second").unwrap();
        let err = mark_processed(&a).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&marked).unwrap(), b"first");
        assert!(a.exists());
    }

    #[test]
    fn listing_is_flat_unless_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        for name in ["a.pdf", "b_processed.pdf", "c.txt", "sub/d.pdf", "sub/deeper/e.PDF"] {
            fs::write(root.join(name), b"%PDF").unwrap();
        }
        // A directory named like a PDF is not a candidate.
        fs::create_dir(root.join("folder.pdf")).unwrap();

        let flat = list_candidates(root, false).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].path, root.join("a.pdf"));
        assert_eq!(flat[0].relative_dir, PathBuf::new());

        let mut deep = list_candidates(root, true).unwrap();
        deep.sort_by(|x, y| x.path.cmp(&y.path));
        let rel: Vec<_> = deep.iter().map(|j| j.relative_dir.clone()).collect();
        assert_eq!(
            rel,
            vec![PathBuf::new(), PathBuf::from("sub"), PathBuf::from("sub/deeper")]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_candidates(&dir.path().join("absent"), false).is_err());
    }
}
