use anyhow::Context;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Embedding length written per image unless `EMBEDDING_DIM` says otherwise.
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

/// Appends one embedding per line as tab-terminated `%.8f` values.
pub struct FeatureWriter<W: Write> {
    out: W,
    dims: usize,
    rows: usize,
}

impl FeatureWriter<BufWriter<File>> {
    /// Create (truncate) `path`, making its parent directories first.
    pub fn create(path: &Path, dims: usize) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create result file {}", path.display()))?;
        tracing::info!(path = %path.display(), dims, "Writing embeddings");
        Ok(Self::new(BufWriter::new(file), dims))
    }
}

impl<W: Write> FeatureWriter<W> {
    pub fn new(out: W, dims: usize) -> Self {
        Self { out, dims, rows: 0 }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Lines written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Write the first `dims` values of `values` as one line.
    pub fn write_embedding(&mut self, values: &[f32]) -> anyhow::Result<()> {
        if values.len() < self.dims {
            anyhow::bail!(
                "Output has {} values, expected at least {}",
                values.len(),
                self.dims
            );
        }
        for value in &values[..self.dims] {
            write!(self.out, "{value:.8}\t")?;
        }
        writeln!(self.out)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered lines and hand back the sink.
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.out.flush().context("Failed to flush result file")?;
        tracing::debug!(rows = self.rows, "Embeddings flushed");
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_line_format() {
        let mut writer = FeatureWriter::new(Vec::new(), 3);
        writer.write_embedding(&[0.5, -1.25, 0.123456789, 9.0]).unwrap();
        writer.write_embedding(&[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(writer.rows(), 2);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "0.50000000\t-1.25000000\t0.12345679\t\n0.00000000\t1.00000000\t2.00000000\t\n"
        );
    }

    #[test]
    fn test_short_output_is_rejected() {
        let mut writer = FeatureWriter::new(Vec::new(), 4);
        let err = writer.write_embedding(&[1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("expected at least 4"));
        assert_eq!(writer.rows(), 0);
        assert!(writer.finish().unwrap().is_empty(), "Nothing written on error");
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("result").join("nested").join("result.txt");

        let mut writer = FeatureWriter::create(&path, 2).unwrap();
        writer.write_embedding(&[0.25, 0.75]).unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "0.25000000\t0.75000000\t\n");
    }
}
