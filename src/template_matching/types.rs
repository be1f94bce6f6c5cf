/// Template matching data types
use crate::error::{BotError, BotResult};
use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A reference image, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Template {
    /// Label derived from the file stem (e.g. "home", "silver_chest")
    pub name: String,
    /// Where the template was loaded from (empty for in-memory templates)
    pub path: PathBuf,
    pixels: GrayImage,
    sum: u64,
    sum_sq: u64,
}

/// A candidate center location for a template
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    /// Template label
    pub label: String,
    /// Center X in capture-region coordinates
    pub x: u32,
    /// Center Y in capture-region coordinates
    pub y: u32,
    /// Correlation score in [-1, 1]
    pub score: f32,
}

/// All `*.png` templates of one directory in file name order.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<Arc<Template>>,
}

impl Template {
    /// Load a template from disk, converting it to single-channel intensity
    pub fn load(path: impl AsRef<Path>) -> BotResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| BotError::TemplateLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let mut template = Self::from_dynamic(label_for(path), &image);
        template.path = path.to_path_buf();
        Ok(template)
    }

    pub fn from_dynamic(name: impl Into<String>, image: &DynamicImage) -> Self {
        Self::from_gray(name, image.to_luma8())
    }

    pub fn from_gray(name: impl Into<String>, pixels: GrayImage) -> Self {
        let (sum, sum_sq) = pixels.as_raw().iter().fold((0u64, 0u64), |(s, sq), &p| {
            let p = p as u64;
            (s + p, sq + p * p)
        });
        Self {
            name: name.into(),
            path: PathBuf::new(),
            pixels,
            sum,
            sum_sq,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Sum and sum of squares of all pixel intensities
    pub fn sums(&self) -> (u64, u64) {
        (self.sum, self.sum_sq)
    }

    /// Offset from a top-left match position to the template midpoint
    pub fn center_offset(&self) -> (u32, u32) {
        (self.width() / 2, self.height() / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl Match {
    pub fn new(label: impl Into<String>, x: u32, y: u32, score: f32) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            score,
        }
    }

    /// Score as a whole percentage, for log lines
    pub fn percent(&self) -> i32 {
        (self.score * 100.0) as i32
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at ({},{}) - {}%", self.label, self.x, self.y, self.percent())
    }
}

impl TemplateSet {
    /// Scan `dir` for PNG files and load each one.
    ///
    /// Files that fail to decode are logged and skipped; they behave like a
    /// template that never matches.
    pub fn load_dir(dir: impl AsRef<Path>) -> BotResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(BotError::TemplateDirMissing {
                path: dir.to_path_buf(),
            });
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        // Enumeration order is the classifier's tie-break, keep it stable
        paths.sort();

        let mut templates = Vec::with_capacity(paths.len());
        for path in paths {
            match Template::load(&path) {
                Ok(t) if !t.is_empty() => templates.push(Arc::new(t)),
                Ok(_) => log::warn!("⚠️ Empty template skipped: {}", path.display()),
                Err(e) => log::warn!("⚠️ {e}"),
            }
        }

        log::debug!("📂 Loaded {} templates from {}", templates.len(), dir.display());
        Ok(Self { templates })
    }

    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self {
            templates: templates.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn templates(&self) -> &[Arc<Template>] {
        &self.templates
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn label_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
