//! Font resolution from a fixed candidate list on the local filesystem
//!
//! A [`FontRegistry`] is built once per process and shared by every render
//! call. It keeps two caches, both filled idempotently: the bytes of each
//! font file read so far, and the outcome of the first successful
//! [`FontRegistry::resolve`]. Concurrent first callers may each load the same
//! file; the last insert wins and every copy is identical.

use crate::font::{FontData, FontFamilyBuilder};
use crate::{PdfError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

/// One candidate font: a regular face and an optional bold companion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontCandidate {
    /// Family label used in logs and as the font resource name
    pub family: &'static str,
    /// File name of the regular face inside the font directory
    pub regular: &'static str,
    /// File name of the bold face, if the family ships one
    pub bold: Option<&'static str>,
}

/// Probe order for CJK-capable fonts
pub const DEFAULT_CANDIDATES: &[FontCandidate] = &[
    FontCandidate {
        family: "NotoSansJP",
        regular: "NotoSansJP-Regular.ttf",
        bold: Some("NotoSansJP-Bold.ttf"),
    },
    FontCandidate {
        family: "NotoSansCJKjp",
        regular: "NotoSansCJKjp-Regular.otf",
        bold: Some("NotoSansCJKjp-Bold.otf"),
    },
    FontCandidate {
        family: "NotoSansCJK",
        regular: "NotoSansCJK-Regular.ttc",
        bold: Some("NotoSansCJK-Bold.ttc"),
    },
    FontCandidate {
        family: "SourceHanSansJP",
        regular: "SourceHanSansJP-Regular.otf",
        bold: Some("SourceHanSansJP-Bold.otf"),
    },
    FontCandidate {
        family: "IPAexGothic",
        regular: "ipaexg.ttf",
        bold: None,
    },
    FontCandidate {
        family: "IPAGothic",
        regular: "ipag.ttf",
        bold: None,
    },
];

/// Text a candidate must fully cover to be accepted
pub const DEFAULT_COVERAGE: &str = "あア山田学歴職";

/// Font bytes returned by [`FontRegistry::resolve`]
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub family: String,
    pub regular: Arc<[u8]>,
    pub bold: Option<Arc<[u8]>>,
}

impl ResolvedFont {
    /// A builder ready to register with a [`PdfDocument`](crate::PdfDocument)
    pub fn family_builder(&self) -> FontFamilyBuilder {
        let builder = FontFamilyBuilder::new().regular(self.regular.clone(), 0);
        match &self.bold {
            Some(bold) => builder.bold(bold.clone(), 0),
            None => builder,
        }
    }
}

/// Process-wide font lookup with byte caching
#[derive(Debug)]
pub struct FontRegistry {
    font_dir: PathBuf,
    candidates: Vec<FontCandidate>,
    coverage: String,
    bytes: RwLock<HashMap<String, Arc<[u8]>>>,
    resolved: OnceLock<ResolvedFont>,
}

impl FontRegistry {
    /// Registry over `font_dir` with the default candidate list
    pub fn new<P: AsRef<Path>>(font_dir: P) -> Self {
        Self::with_candidates(font_dir, DEFAULT_CANDIDATES.to_vec())
    }

    pub fn with_candidates<P: AsRef<Path>>(font_dir: P, candidates: Vec<FontCandidate>) -> Self {
        Self {
            font_dir: font_dir.as_ref().to_path_buf(),
            candidates,
            coverage: DEFAULT_COVERAGE.to_string(),
            bytes: RwLock::new(HashMap::new()),
            resolved: OnceLock::new(),
        }
    }

    /// Replace the text every accepted face must have glyphs for
    pub fn with_coverage(mut self, coverage: impl Into<String>) -> Self {
        self.coverage = coverage.into();
        self
    }

    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    /// Locate the first candidate that exists, parses and covers the
    /// required text
    ///
    /// Missing, unreadable or non-CJK files are skipped; exhausting the list returns
    /// [`PdfError::FontNotFound`]. Callers decide whether to fall back to a
    /// builtin font or report the error.
    pub fn resolve(&self) -> Result<ResolvedFont> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved.clone());
        }

        for candidate in &self.candidates {
            let regular = match self.load(candidate.regular) {
                Ok(data) => data,
                Err(e) => {
                    log::debug!("font candidate {} skipped: {e}", candidate.regular);
                    continue;
                }
            };

            // bold is optional: a broken bold file degrades to regular-only
            let bold = candidate.bold.and_then(|name| match self.load(name) {
                Ok(data) => Some(data),
                Err(e) => {
                    log::warn!("bold face {name} unusable: {e}");
                    None
                }
            });

            let resolved = ResolvedFont {
                family: candidate.family.to_string(),
                regular,
                bold,
            };
            log::info!(
                "resolved CJK font {} from {}",
                resolved.family,
                self.font_dir.display()
            );
            let _ = self.resolved.set(resolved.clone());
            return Ok(resolved);
        }

        Err(PdfError::FontNotFound(format!(
            "no CJK-capable font among {} candidates in {}",
            self.candidates.len(),
            self.font_dir.display()
        )))
    }

    /// Read and validate one font file, going through the byte cache
    ///
    /// A face without glyphs for the coverage text is rejected and not cached.
    fn load(&self, file_name: &str) -> Result<Arc<[u8]>> {
        if let Some(data) = self.cached(file_name) {
            return Ok(data);
        }

        let path = self.font_dir.join(file_name);
        let data: Arc<[u8]> = Arc::from(std::fs::read(&path)?);
        let font = FontData::from_bytes(file_name, data.clone(), 0)?;
        if !font.covers(&self.coverage) {
            return Err(PdfError::FontNotFound(format!(
                "{file_name} has no glyphs for {:?}",
                self.coverage
            )));
        }

        if let Ok(mut cache) = self.bytes.write() {
            cache.insert(file_name.to_string(), data.clone());
        }
        Ok(data)
    }

    fn cached(&self, file_name: &str) -> Option<Arc<[u8]>> {
        self.bytes
            .read()
            .ok()
            .and_then(|cache| cache.get(file_name).cloned())
    }

    /// Number of font files currently held in the byte cache
    pub fn cached_files(&self) -> usize {
        self.bytes.read().map(|cache| cache.len()).unwrap_or(0)
    }
}
