//! What a batch run did.

use crate::error::JobError;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of converting one candidate file.
pub type JobOutcome = Result<FileConversion, JobError>;

/// A PDF whose pages were all written and whose source was renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConversion {
    /// Path the PDF had when the run found it.
    pub source: PathBuf,
    /// Path after the processed marker was applied.
    pub marked_as: PathBuf,
    /// Written page images, in page order.
    pub outputs: Vec<PathBuf>,
}

/// A PDF that was skipped this run.
#[derive(Debug)]
pub struct FailedJob {
    pub source: PathBuf,
    pub error: JobError,
}

/// Summary returned by [`crate::convert::Converter::convert_directory`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Candidate files found by the scan.
    pub candidates: usize,
    pub converted: Vec<FileConversion>,
    pub failed: Vec<FailedJob>,
    pub duration: Duration,
}

impl BatchReport {
    /// Total JPEG files written across all converted PDFs.
    pub fn pages_written(&self) -> usize {
        self.converted.iter().map(|c| c.outputs.len()).sum()
    }

    /// `true` when every candidate was converted and marked.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record(&mut self, source: PathBuf, outcome: JobOutcome) {
        match outcome {
            Ok(done) => self.converted.push(done),
            Err(error) => self.failed.push(FailedJob { source, error }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    #[test]
    fn record_sorts_outcomes_and_counts_pages() {
        let mut report = BatchReport {
            candidates: 2,
            ..Default::default()
        };
        report.record(
            PathBuf::from("a.pdf"),
            Ok(FileConversion {
                source: PathBuf::from("a.pdf"),
                marked_as: PathBuf::from("a_processed.pdf"),
                outputs: vec![PathBuf::from("a_page1.jpg"), PathBuf::from("a_page2.jpg")],
            }),
        );
        report.record(PathBuf::from("b.pdf"), Err(RenderError::NoPages.into()));

        assert_eq!(report.pages_written(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, PathBuf::from("b.pdf"));
        assert!(!report.is_clean());
    }
}
