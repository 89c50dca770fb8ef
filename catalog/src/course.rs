//! Course records and the corpus built from them.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Result;
use crate::loader::{load_course_table, load_job_table};

/// One row of the course table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Position in the corpus.
    pub index: usize,

    /// Course category.
    pub category: String,

    /// Course name; this is the text that gets embedded.
    pub name: String,

    /// Course length as written in the source table.
    pub duration: String,
}

impl Course {
    /// Create a course. The index is assigned when it joins a [`Corpus`].
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            index: 0,
            category: category.into(),
            name: name.into(),
            duration: duration.into(),
        }
    }
}

/// Content fingerprint of a corpus.
///
/// Equal for two corpora exactly when their ordered course names are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpusVersion(String);

impl CorpusVersion {
    /// Fingerprint an ordered list of texts.
    pub fn of<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut hasher = Sha256::new();
        for text in texts {
            let bytes = text.as_ref().as_bytes();
            // Length prefix keeps ["ab", "c"] and ["a", "bc"] apart.
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorpusVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

/// Ordered, immutable set of courses.
#[derive(Debug, Clone)]
pub struct Corpus {
    courses: Vec<Course>,
    texts: Vec<String>,
    version: CorpusVersion,
}

impl Corpus {
    /// Build a corpus, reindexing courses by position.
    pub fn new(courses: impl IntoIterator<Item = Course>) -> Self {
        let courses: Vec<Course> = courses
            .into_iter()
            .enumerate()
            .map(|(index, course)| Course { index, ..course })
            .collect();
        let texts: Vec<String> = courses.iter().map(|c| c.name.clone()).collect();
        let version = CorpusVersion::of(&texts);

        Self {
            courses,
            texts,
            version,
        }
    }

    /// Content fingerprint.
    pub fn version(&self) -> &CorpusVersion {
        &self.version
    }

    /// Embedded text of every course, in corpus order. Blank names stay in
    /// place as empty strings.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Get a course by index.
    pub fn get(&self, index: usize) -> Option<&Course> {
        self.courses.get(index)
    }

    /// Iterate over courses in order.
    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter()
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Check if the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Summary of the job table. Only used for catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTable {
    /// Column headers.
    pub headers: Vec<String>,

    /// Number of data rows.
    pub rows: usize,
}

/// Both source tables, loaded together.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Job table summary.
    pub jobs: JobTable,

    /// Course corpus.
    pub corpus: Corpus,
}

impl Catalog {
    /// Load the job and course tables, trying `encodings` in order for each.
    pub fn load(
        job_table: impl AsRef<Path>,
        course_table: impl AsRef<Path>,
        encodings: &[String],
    ) -> Result<Self> {
        let jobs = load_job_table(job_table, encodings)?;
        let corpus = load_course_table(course_table, encodings)?;

        info!(
            "Loaded catalog: {} jobs, {} courses (corpus {})",
            jobs.rows,
            corpus.len(),
            corpus.version()
        );
        Ok(Self { jobs, corpus })
    }

    /// Get catalog statistics.
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            jobs: self.jobs.rows,
            courses: self.corpus.len(),
        }
    }
}

/// Row counts of the loaded tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Number of job rows.
    pub jobs: usize,

    /// Number of courses.
    pub courses: usize,
}
