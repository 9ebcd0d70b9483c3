//! Class label vocabulary.
//!
//! Loaded once at startup from a newline-delimited text source (the
//! detector's names file). Class ids used throughout the pipeline are
//! indices into this ordered list.

use std::io::BufRead;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Ordered, index-addressable class names.
#[derive(Clone, Debug)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Load from a newline-delimited file. Lines are trimmed, blank
    /// lines skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open labels file {}", path.display()))?;
        Self::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("failed to read labels file {}", path.display()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut names = Vec::new();
        for line in reader.lines() {
            let line = line.context("failed to read labels line")?;
            let name = line.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            return Err(anyhow!("labels source contains no class names"));
        }
        Ok(Self { names })
    }

    /// Build from in-memory names. Used by tests and stub runs.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if names.is_empty() {
            return Err(anyhow!("labels source contains no class names"));
        }
        Ok(Self { names })
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    /// Resolve a class name to its id.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_skips_blank_lines() {
        let text = "person\n\n  bicycle  \ncar\n";
        let labels = Labels::from_reader(text.as_bytes()).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("person"));
        assert_eq!(labels.get(1), Some("bicycle"));
        assert_eq!(labels.index_of("car"), Some(2));
        assert_eq!(labels.index_of("truck"), None);
    }

    #[test]
    fn rejects_empty_source() {
        assert!(Labels::from_reader("\n  \n".as_bytes()).is_err());
    }
}
