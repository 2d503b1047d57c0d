//! Screenshot sources and transport encoding.
//!
//! An [`ImageSource`] says where screenshots come from; resolving it once
//! yields an [`ImageSet`] keyed by identifier (the file stem). Images are
//! decoded lazily by [`encode_image`] so that an unreadable file only
//! affects its own pair.

use crate::error::{JudgeError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions accepted as screenshots (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Where a set of screenshots comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Every screenshot directly inside a directory.
    Directory(PathBuf),
    /// An explicit list of screenshot files.
    Files(Vec<PathBuf>),
    /// Identifier to file, for when file stems do not line up.
    Mapping(BTreeMap<String, PathBuf>),
}

impl ImageSource {
    /// Pick the source kind from command-line paths.
    ///
    /// A single directory is scanned, a single `.json` file is read as an
    /// identifier-to-path mapping, anything else is a list of files. It is
    /// an error when none of the paths exist.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self> {
        if !paths.iter().any(|p| p.exists()) {
            return Err(JudgeError::InvalidImageSource(
                paths.first().cloned().unwrap_or_default(),
            ));
        }

        if let [single] = paths.as_slice() {
            if single.is_dir() {
                return Ok(Self::Directory(single.clone()));
            }
            if has_extension(single, &["json"]) {
                let content =
                    fs::read_to_string(single).map_err(|e| JudgeError::io(single, e))?;
                let mapping: BTreeMap<String, PathBuf> = serde_json::from_str(&content)
                    .map_err(|e| {
                        JudgeError::Serialization(format!(
                            "Invalid image mapping '{}': {}",
                            single.display(),
                            e
                        ))
                    })?;
                return Ok(Self::Mapping(mapping));
            }
        }
        Ok(Self::Files(paths))
    }

    /// Resolve the source into an identifier-keyed set.
    ///
    /// A missing directory is an error; individual files that are missing or
    /// are not screenshots are skipped.
    pub fn resolve(&self) -> Result<ImageSet> {
        let mut images = BTreeMap::new();

        match self {
            ImageSource::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(JudgeError::InvalidImageSource(dir.clone()));
                }
                for entry in WalkDir::new(dir)
                    .min_depth(1)
                    .max_depth(1)
                    .sort_by_file_name()
                {
                    let entry = entry.map_err(|e| {
                        let path = e.path().unwrap_or(dir).to_path_buf();
                        match e.into_io_error() {
                            Some(source) => JudgeError::io(path, source),
                            None => JudgeError::InvalidImageSource(path),
                        }
                    })?;
                    if entry.file_type().is_file() {
                        insert_image(&mut images, None, entry.path());
                    }
                }
            }
            ImageSource::Files(files) => {
                for file in files {
                    if file.is_file() {
                        insert_image(&mut images, None, file);
                    } else {
                        warn!(path = %file.display(), "screenshot file not found, skipping");
                    }
                }
            }
            ImageSource::Mapping(mapping) => {
                for (id, file) in mapping {
                    if file.is_file() {
                        insert_image(&mut images, Some(id), file);
                    } else {
                        warn!(image_id = %id, path = %file.display(), "screenshot file not found, skipping");
                    }
                }
            }
        }

        Ok(ImageSet { images })
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

fn insert_image(images: &mut BTreeMap<String, PathBuf>, id: Option<&String>, path: &Path) {
    if !has_extension(path, &IMAGE_EXTENSIONS) {
        debug!(path = %path.display(), "not a screenshot, skipping");
        return;
    }

    let id = match id {
        Some(id) => id.clone(),
        None => match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                warn!(path = %path.display(), "screenshot name is not valid UTF-8, skipping");
                return;
            }
        },
    };

    if let Some(previous) = images.insert(id.clone(), path.to_path_buf()) {
        warn!(
            image_id = %id,
            kept = %path.display(),
            replaced = %previous.display(),
            "duplicate screenshot identifier"
        );
    }
}

/// Screenshots keyed by identifier, iterated in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    images: BTreeMap<String, PathBuf>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, path: impl Into<PathBuf>) {
        self.images.insert(id.into(), path.into());
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.images.get(id).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.images.iter().map(|(id, p)| (id.as_str(), p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// A screenshot re-encoded as base64 JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_base64(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    /// The image as a `data:` URI suitable for an `image_url` content part.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.0)
    }
}

/// Decode a screenshot, flatten it to RGB and re-encode it as base64 JPEG.
pub fn encode_image(path: &Path) -> Result<EncodedImage> {
    let encoding_error = |message: String| JudgeError::Encoding {
        path: path.to_path_buf(),
        message,
    };

    let decoded = image::open(path).map_err(|e| encoding_error(e.to_string()))?;

    // JPEG has no alpha channel or palette.
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut jpeg = Cursor::new(Vec::new());
    rgb.write_to(&mut jpeg, ImageFormat::Jpeg)
        .map_err(|e| encoding_error(e.to_string()))?;

    Ok(EncodedImage(STANDARD.encode(jpeg.into_inner())))
}
