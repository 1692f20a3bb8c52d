//! Image lists and ground-truth labels for validation runs.

use anyhow::Context;
use preprocess::is_raw_input;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// File name fragment that marks an entry as an encoded image.
const IMAGE_MARKER: &str = ".JPEG";

/// Image file names in `dir`, sorted lexicographically.
///
/// Only names containing `.JPEG` or `.bin` are kept.
pub fn read_directory(dir: &Path) -> anyhow::Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to open image directory {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            tracing::warn!(name = ?entry.file_name(), "Skipping non UTF-8 file name");
            continue;
        };
        if name.contains(IMAGE_MARKER) || is_raw_input(name) {
            names.push(name.to_string());
        }
    }

    names.sort();
    tracing::debug!(dir = %dir.display(), count = names.len(), "Read image directory");
    Ok(names)
}

/// Image file names listed one per line in `path`, in file order.
pub fn read_manifest(path: &Path) -> anyhow::Result<Vec<String>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open image list {}", path.display()))?;

    let mut names = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let name = line.trim_end_matches('\r');
        if name.trim().is_empty() {
            continue;
        }
        names.push(name.to_string());
    }

    tracing::debug!(list = %path.display(), count = names.len(), "Read image list");
    Ok(names)
}

/// Numeric image id embedded in a validation file name.
///
/// The id is the leading digits of the third `_`-separated token, so
/// `ILSVRC2012_val_00000042.JPEG` yields 42.
pub fn file_id(name: &str) -> Option<u32> {
    let token = name.split('_').nth(2)?;
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    token[..digits_end].parse().ok()
}

/// Ground-truth class per image id.
///
/// Line `i` of the label file describes image id `i + 1`; its second
/// whitespace-separated field is the class.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: Vec<Option<u32>>,
}

impl LabelTable {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open label file {}", path.display()))?;
        let table = Self::parse(file)
            .with_context(|| format!("Failed to read label file {}", path.display()))?;
        tracing::debug!(labels = table.len(), "Loaded label table");
        Ok(table)
    }

    pub fn parse<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut labels = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let label = line
                .split_whitespace()
                .nth(1)
                .and_then(|field| field.parse().ok());
            labels.push(label);
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Class of image `file_id`, `None` when the id is out of range or the
    /// line carried no label.
    pub fn label_for(&self, file_id: u32) -> Option<u32> {
        let index = (file_id as usize).checked_sub(1)?;
        self.labels.get(index).copied().flatten()
    }
}
