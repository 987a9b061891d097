//! Snapshot of environment variables used to build configuration.

use std::collections::HashMap;
use std::path::Path;

/// An immutable set of environment variables.
///
/// Built once at process start from the real environment and an optional
/// `.env` file, then handed to config loaders. Nothing downstream calls
/// `std::env::var` directly.
///
/// Loading usually happens before logging is set up, so problems with the
/// `.env` file are kept and reported later through [`Self::log_issues`].
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
    issues: Vec<String>,
}

impl EnvSource {
    /// Reads `dotenv_path` (if it exists) and layers the process environment
    /// on top. Variables already set in the process win over the file, which
    /// matches `dotenv` semantics without mutating the process environment.
    pub fn load(dotenv_path: impl AsRef<Path>) -> Self {
        let path = dotenv_path.as_ref();
        let mut vars = HashMap::new();
        let mut issues = Vec::new();

        match dotenvy::from_filename_iter(path) {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((key, value)) => {
                            vars.insert(key, value);
                        }
                        Err(e) => {
                            issues.push(format!(
                                "skipped malformed line in {}: {}",
                                path.display(),
                                e
                            ));
                        }
                    }
                }
            }
            Err(e) if e.not_found() => {}
            Err(e) => {
                issues.push(format!("failed to read {}: {}", path.display(), e));
            }
        }

        vars.extend(std::env::vars());
        Self { vars, issues }
    }

    /// Problems met while reading the `.env` file.
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Emits every recorded `.env` problem as a warning.
    pub fn log_issues(&self) {
        for issue in &self.issues {
            tracing::warn!("{}", issue);
        }
    }

    /// Builds a source from explicit pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            issues: Vec::new(),
        }
    }

    /// Returns the value of `key`, treating blank values as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn blank_values_are_unset() {
        let env = EnvSource::from_pairs([("A", "1"), ("B", "  ")]);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), None);
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn load_reads_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "PARLOR_TEST_ONLY_DOTENV_KEY=from-file").expect("write");

        let env = EnvSource::load(file.path());
        assert_eq!(env.get("PARLOR_TEST_ONLY_DOTENV_KEY"), Some("from-file"));
        assert!(env.issues().is_empty());
    }

    #[test]
    fn load_records_malformed_lines() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "PARLOR_TEST_ONLY_GOOD_KEY=ok").expect("write");
        writeln!(file, "NOT A VALID LINE=value").expect("write");

        let env = EnvSource::load(file.path());
        assert_eq!(env.get("PARLOR_TEST_ONLY_GOOD_KEY"), Some("ok"));
        assert_eq!(env.issues().len(), 1);
        assert!(env.issues()[0].contains("malformed"));
    }

    #[test]
    fn load_tolerates_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = EnvSource::load(dir.path().join("absent.env"));
        assert_eq!(env.get("PARLOR_TEST_ONLY_NEVER_SET"), None);
        assert!(env.issues().is_empty());
    }
}
