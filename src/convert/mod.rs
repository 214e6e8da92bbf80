//! File-level and batch conversion.
//!
//! A conversion reads one source document, detects its kind, runs the
//! pipeline and writes `output.json` plus the attached images into an output
//! directory:
//!
//! ```text
//! <output>/
//!   output.json
//!   images/p1_i1.jpeg
//!   images/p3_i1.png
//! ```
//!
//! # Example
//!
//! ```no_run
//! use qbank::convert::{convert_file, default_output_dir};
//! use qbank::ExtractOptions;
//! use std::path::Path;
//!
//! fn main() -> qbank::Result<()> {
//!     let input = Path::new("11900.json");
//!     let result = convert_file(input, default_output_dir(input), &ExtractOptions::default())?;
//!     println!("{} records written to {}", result.record_count, result.json_path.display());
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::detect::detect_kind;
use crate::error::{Diagnostic, Error, Result};
use crate::model::Section;
use crate::options::ExtractOptions;
use crate::pipeline::{DirectoryImageStore, Extraction, ImageSink, NullImageSink, Pipeline};
use crate::render::{record_count, ExtractionStats};
use crate::source::{read_source, MarkupSource, PaginatedSource, SourceKind};

/// Name of the JSON file written into the output directory.
pub const OUTPUT_FILE: &str = "output.json";

/// Result of converting one document.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Source path
    pub source: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Path of the written JSON file
    pub json_path: PathBuf,

    /// Detected or forced source kind
    pub kind: SourceKind,

    /// Extracted sections
    pub sections: Vec<Section>,

    /// Extraction statistics
    pub stats: ExtractionStats,

    /// Recoverable conditions found during extraction
    pub diagnostics: Vec<Diagnostic>,

    /// Number of top-level records in the JSON file
    pub record_count: usize,

    /// Number of image files written
    pub images_written: usize,
}

impl ConvertResult {
    /// Total number of questions.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(Section::question_count).sum()
    }
}

/// Default output directory for a source: `<stem>_output` next to it.
pub fn default_output_dir<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "qbank".to_string());
    input.with_file_name(format!("{}_output", stem))
}

/// Run the pipeline over decoded source text.
pub fn extract_with(
    text: &str,
    kind: SourceKind,
    options: &ExtractOptions,
    sink: &mut dyn ImageSink,
) -> Result<Extraction> {
    let mut pipeline = Pipeline::from_options(options, sink);
    match kind {
        SourceKind::Paginated => pipeline.run(PaginatedSource::from_json(text)?),
        SourceKind::Markup => pipeline.run(MarkupSource::parse(text)),
    }
}

/// Read a source file and determine its kind.
pub fn load_source<P: AsRef<Path>>(input: P, options: &ExtractOptions) -> Result<(String, SourceKind)> {
    let input = input.as_ref();
    let text = read_source(input)?;
    let kind = match options.source_kind {
        Some(kind) => kind,
        None => detect_kind(input, &text)?,
    };
    log::debug!("{}: {} source", input.display(), kind);
    Ok((text, kind))
}

/// Convert one document into `output_dir`.
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    options: &ExtractOptions,
) -> Result<ConvertResult> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let (text, kind) = load_source(input, options)?;
    fs::create_dir_all(output_dir)?;

    let (extraction, images_written) = if options.extract_images && kind.has_images() {
        let mut store = DirectoryImageStore::new(output_dir);
        let extraction = extract_with(&text, kind, options, &mut store)?;
        (extraction, store.written())
    } else {
        (extract_with(&text, kind, options, &mut NullImageSink)?, 0)
    };

    let json = extraction.to_json(options.json_format, options.layout)?;
    let json_path = output_dir.join(OUTPUT_FILE);
    fs::write(&json_path, json)?;

    let records = record_count(&extraction.sections, options.layout);
    log::info!(
        "{}: {} records, {} questions, {} images -> {}",
        input.display(),
        records,
        extraction.question_count(),
        images_written,
        json_path.display()
    );

    Ok(ConvertResult {
        source: input.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        json_path,
        kind,
        sections: extraction.sections,
        stats: extraction.stats,
        diagnostics: extraction.diagnostics,
        record_count: records,
        images_written,
    })
}

/// One output sub-directory per input, named by file stem.
///
/// A name already handed out gets the lowest free `_2`, `_3`, ... suffix, so
/// no two inputs share a directory.
pub fn batch_output_dirs<P: AsRef<Path>>(inputs: &[P], output_root: &Path) -> Vec<PathBuf> {
    let mut used: HashSet<String> = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());

            let mut name = stem.clone();
            let mut suffix = 1;
            while !used.insert(name.clone()) {
                suffix += 1;
                name = format!("{}_{}", stem, suffix);
            }
            output_root.join(name)
        })
        .collect()
}

/// Convert many documents, one pipeline each.
///
/// Results are returned in input order. A failed document never aborts the
/// others.
pub fn convert_batch<P: AsRef<Path> + Sync>(
    inputs: &[P],
    output_root: &Path,
    options: &ExtractOptions,
) -> Vec<Result<ConvertResult>> {
    convert_batch_with(inputs, output_root, options, |_| {})
}

/// Like [`convert_batch`], calling `on_done` after each document finishes.
pub fn convert_batch_with<P, F>(
    inputs: &[P],
    output_root: &Path,
    options: &ExtractOptions,
    on_done: F,
) -> Vec<Result<ConvertResult>>
where
    P: AsRef<Path> + Sync,
    F: Fn(&Result<ConvertResult>) + Sync,
{
    let dirs = batch_output_dirs(inputs, output_root);
    let convert_one = |(input, dir): (&P, &PathBuf)| {
        let result = convert_file(input, dir, options);
        if let Err(ref e) = result {
            log::warn!("{}: {}", input.as_ref().display(), e);
        }
        on_done(&result);
        result
    };

    if options.parallel {
        inputs.par_iter().zip(dirs.par_iter()).map(convert_one).collect()
    } else {
        inputs.iter().zip(dirs.iter()).map(convert_one).collect()
    }
}

/// Merge the statistics of the successful results of a batch.
pub fn batch_stats(results: &[Result<ConvertResult>]) -> ExtractionStats {
    let mut stats = ExtractionStats::new();
    for result in results.iter().flatten() {
        stats.merge(&result.stats);
    }
    stats
}

/// Whether a batch failure was caused by a missing source path.
pub fn is_missing_source(result: &Result<ConvertResult>) -> bool {
    matches!(result, Err(Error::SourceNotFound(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir("data/11900.json"),
            PathBuf::from("data/11900_output")
        );
        assert_eq!(default_output_dir("exam.asp"), PathBuf::from("exam_output"));
    }

    #[test]
    fn test_batch_output_dirs_deduplicate_stems() {
        let inputs = ["a/bank.json", "b/bank.html", "c/other.json"];
        let dirs = batch_output_dirs(&inputs, Path::new("out"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("out/bank"),
                PathBuf::from("out/bank_2"),
                PathBuf::from("out/other"),
            ]
        );
    }

    #[test]
    fn test_batch_output_dirs_skip_names_taken_by_other_stems() {
        let inputs = ["a.json", "x/a.json", "a_2.json", "y/a.json"];
        let dirs = batch_output_dirs(&inputs, Path::new("out"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("out/a"),
                PathBuf::from("out/a_2"),
                PathBuf::from("out/a_2_2"),
                PathBuf::from("out/a_3"),
            ]
        );

        let unique: HashSet<&PathBuf> = dirs.iter().collect();
        assert_eq!(unique.len(), dirs.len());
    }

    #[test]
    fn test_extract_with_markup() {
        let html = r#"<table><tr><td align="center">1</td>
            <td>題目<input type="radio" value="1">(1) 是</td>
            <td><input id="ans1_correct" value="1"></td></tr></table>"#;
        let extraction = extract_with(
            html,
            SourceKind::Markup,
            &ExtractOptions::default(),
            &mut NullImageSink,
        )
        .unwrap();
        assert_eq!(extraction.question_count(), 1);
        assert_eq!(extraction.sections[0].questions[0].answer, "(1)");
    }

    #[test]
    fn test_missing_source() {
        let result = convert_file(
            "definitely/missing.json",
            "unused",
            &ExtractOptions::default(),
        );
        assert!(is_missing_source(&result));
    }
}
