//! Diagram-type detection from the text header.

use crate::{Error, Result};
use regex::Regex;

#[derive(Debug, thiserror::Error)]
#[error("No diagram type detected for text: {text}")]
pub struct DetectTypeError {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Detector {
    pub id: &'static str,
    pattern: Regex,
}

impl Detector {
    pub fn new(id: &'static str, pattern: &str) -> Result<Self> {
        Ok(Self {
            id,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Ordered detectors; the first match wins.
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
    frontmatter_re: Regex,
    any_comment_re: Regex,
}

/// Header patterns in registration order. More specific headers come first.
const BUILTIN: &[(&str, &str)] = &[
    ("classDiagram", r"^\s*classDiagram"),
    ("er", r"^\s*erDiagram"),
    ("gantt", r"^\s*gantt"),
    ("pie", r"^\s*pie"),
    ("sequence", r"^\s*sequenceDiagram"),
    ("flowchart", r"^\s*(?:flowchart|graph)"),
    ("timeline", r"^\s*timeline"),
    ("gitGraph", r"^\s*gitGraph"),
    ("stateDiagram", r"^\s*stateDiagram"),
    ("journey", r"^\s*journey"),
    ("mindmap", r"^\s*mindmap"),
];

impl DetectorRegistry {
    pub fn new() -> Result<Self> {
        Ok(Self {
            detectors: Vec::new(),
            frontmatter_re: Regex::new(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+")?,
            any_comment_re: Regex::new(r"(?m)\s*%%.*\n")?,
        })
    }

    pub fn builtin() -> Result<Self> {
        let mut reg = Self::new()?;
        for &(id, pattern) in BUILTIN {
            reg.add(Detector::new(id, pattern)?);
        }
        Ok(reg)
    }

    pub fn add(&mut self, detector: Detector) {
        self.detectors.push(detector);
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.detectors.iter().map(|d| d.id)
    }

    /// Strips front matter, `%%{...}%%` directives and `%%` comments, then returns the id of
    /// the first matching detector.
    pub fn detect_type(&self, text: &str) -> Result<&'static str> {
        let no_frontmatter = self.frontmatter_re.replace(text, "");
        let no_directives = remove_directives(&no_frontmatter);
        let cleaned = self.any_comment_re.replace_all(&no_directives, "\n");

        self.detectors
            .iter()
            .find(|det| det.matches(&cleaned))
            .map(|det| det.id)
            .ok_or_else(|| {
                Error::from(DetectTypeError {
                    text: cleaned.into_owned(),
                })
            })
    }
}

fn remove_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("%%{") {
        out.push_str(&rest[..start]);
        match rest[start + 3..].find("}%%") {
            Some(end) => rest = &rest[start + 3 + end + 3..],
            // Unterminated directive swallows the remainder.
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
