//! CSV ingestion for the job and course tables.
//!
//! Source exports come from spreadsheet tools in a mix of encodings, so each
//! file is decoded by trying a list of candidate encodings in order and
//! keeping the first one that decodes without malformed sequences.

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::{EUC_KR, Encoding, UTF_8};
use tracing::{debug, info, warn};

use crate::course::{Corpus, Course, JobTable};
use crate::error::{CatalogError, Result};

/// Candidate encodings, in the order they are tried.
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8-sig", "utf-8", "cp949", "euc-kr"];

/// Column holding the course category.
const CATEGORY_COLUMN: usize = 1;
/// Column holding the course name (the embedded text).
const NAME_COLUMN: usize = 2;
/// Column holding the course duration.
const DURATION_COLUMN: usize = 3;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode `bytes` with the first encoding that accepts them.
///
/// Returns the text and the label that worked. `utf-8-sig` strips a leading
/// byte order mark; `cp949` and `euc-kr` both use the EUC-KR decoder, which
/// covers the CP949 extensions.
pub fn decode_with_fallback<S: AsRef<str>>(
    bytes: &[u8],
    encodings: &[S],
) -> Result<Option<(String, String)>> {
    for label in encodings {
        let label = label.as_ref();
        match decode_as(bytes, label)? {
            Some(text) => return Ok(Some((text.into_owned(), label.to_string()))),
            None => debug!("Input is not valid {label}, trying next encoding"),
        }
    }
    Ok(None)
}

fn decode_as<'a>(bytes: &'a [u8], label: &str) -> Result<Option<Cow<'a, str>>> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
    let (encoding, input): (&'static Encoding, &[u8]) = match normalized.as_str() {
        "utf-8-sig" | "utf8-sig" => (UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
        "cp949" | "ms949" | "uhc" => (EUC_KR, bytes),
        other => (
            Encoding::for_label(other.as_bytes())
                .ok_or_else(|| CatalogError::UnknownEncoding(label.to_string()))?,
            bytes,
        ),
    };
    Ok(encoding.decode_without_bom_handling_and_without_replacement(input))
}

/// Read a file and decode it with the first working encoding.
fn read_decoded<S: AsRef<str>>(path: &Path, encodings: &[S]) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match decode_with_fallback(&bytes, encodings)? {
        Some((text, label)) => {
            debug!("Decoded {} as {label}", path.display());
            Ok(text)
        }
        None => {
            let tried = encodings
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", ");
            warn!("Could not decode {} with any of: {tried}", path.display());
            Err(CatalogError::Decode {
                path: path.to_path_buf(),
                tried,
            })
        }
    }
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Load the course table.
///
/// Category, name and duration are read from columns 1, 2 and 3. Missing
/// cells become empty strings; rows are never dropped, so corpus indices
/// match row order.
pub fn load_course_table<S: AsRef<str>>(
    path: impl AsRef<Path>,
    encodings: &[S],
) -> Result<Corpus> {
    let path = path.as_ref();
    let text = read_decoded(path, encodings)?;
    let mut reader = csv_reader(&text);

    let mut courses = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let cell = |column: usize| record.get(column).unwrap_or_default().to_string();
        courses.push(Course::new(
            cell(CATEGORY_COLUMN),
            cell(NAME_COLUMN),
            cell(DURATION_COLUMN),
        ));
    }

    if courses.is_empty() {
        return Err(CatalogError::Empty(path.to_path_buf()));
    }

    let blank = courses.iter().filter(|c| c.name.trim().is_empty()).count();
    if blank > 0 {
        warn!("{blank} courses in {} have no name", path.display());
    }

    info!("Loaded {} courses from {}", courses.len(), path.display());
    Ok(Corpus::new(courses))
}

/// Load the job table. Only its headers and row count are kept.
pub fn load_job_table<S: AsRef<str>>(
    path: impl AsRef<Path>,
    encodings: &[S],
) -> Result<JobTable> {
    let path = path.as_ref();
    let text = read_decoded(path, encodings)?;
    let mut reader = csv_reader(&text);
    let csv_error = |source| CatalogError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = 0;
    for record in reader.records() {
        record.map_err(csv_error)?;
        rows += 1;
    }

    info!("Loaded {rows} jobs from {}", path.display());
    Ok(JobTable { headers, rows })
}
