//! Shared font database for SVG parsing.

use crate::{RasterError, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_FONT_FAMILY: &str = "Arial";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontConfig {
    /// Extra directories scanned after the system fonts. Each one must exist.
    pub dirs: Vec<PathBuf>,
    /// Fallback family for text whose family is not installed.
    pub family: String,
    pub load_system_fonts: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            family: DEFAULT_FONT_FAMILY.to_string(),
            load_system_fonts: true,
        }
    }
}

/// Font faces loaded once and shared by every render.
///
/// Loading system fonts is the expensive part of building `usvg::Options`; cloning a backend only
/// bumps a reference count.
#[derive(Clone)]
pub struct FontBackend {
    fontdb: Arc<usvg::fontdb::Database>,
    family: String,
}

impl std::fmt::Debug for FontBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBackend")
            .field("faces", &self.fontdb.len())
            .field("family", &self.family)
            .finish()
    }
}

impl FontBackend {
    pub fn new(config: &FontConfig) -> Result<Self> {
        let mut db = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.dirs {
            if !dir.is_dir() {
                return Err(RasterError::FontDirMissing(dir.clone()));
            }
            db.load_fonts_dir(dir);
        }
        tracing::debug!(
            faces = db.len(),
            dirs = config.dirs.len(),
            family = %config.family,
            "font database loaded"
        );
        Ok(Self {
            fontdb: Arc::new(db),
            family: config.family.clone(),
        })
    }

    /// A backend without any faces. Text is dropped by `usvg`, shapes still render.
    pub fn empty() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
            family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn usvg_options(&self) -> usvg::Options<'static> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        opt.font_family = self.family.clone();
        opt
    }
}
