use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Logical identity of an artifact, stable across its versions.
///
/// Paths are relative, `/`-separated, and never empty. A single leading
/// `./` is dropped so `./index.html` and `index.html` name the same artifact.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Validate and wrap a logical path.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let path = raw.strip_prefix("./").unwrap_or(&raw);

        if path.trim().is_empty() {
            return Err(ValidationError::EmptyPath);
        }
        if path.starts_with('/') {
            return Err(ValidationError::AbsolutePath(path.to_string()));
        }
        if path.contains('\0') {
            return Err(ValidationError::InvalidSegment(path.replace('\0', "\\0")));
        }
        if let Some(bad) = path.split('/').find(|s| s.is_empty() || *s == "..") {
            let shown = if bad.is_empty() { "//" } else { bad };
            return Err(ValidationError::InvalidSegment(shown.to_string()));
        }

        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment (the display filename).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Text after the last `.` of the file name, if there is one.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.').map(|i| &name[i + 1..])
    }
}

impl TryFrom<String> for ArtifactPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactPath> for String {
    fn from(path: ArtifactPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactPath({:?})", self.0)
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_paths() {
        let p = ArtifactPath::new("public/styles.css").unwrap();
        assert_eq!(p.as_str(), "public/styles.css");
        assert_eq!(p.file_name(), "styles.css");
        assert_eq!(p.extension(), Some("css"));
    }

    #[test]
    fn strips_leading_dot_slash() {
        let p = ArtifactPath::new("./index.html").unwrap();
        assert_eq!(p.as_str(), "index.html");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(ArtifactPath::new(""), Err(ValidationError::EmptyPath));
        assert_eq!(ArtifactPath::new("   "), Err(ValidationError::EmptyPath));
        assert_eq!(ArtifactPath::new("./"), Err(ValidationError::EmptyPath));
    }

    #[test]
    fn rejects_absolute() {
        assert!(matches!(
            ArtifactPath::new("/etc/passwd"),
            Err(ValidationError::AbsolutePath(_))
        ));
    }

    #[test]
    fn rejects_parent_and_empty_segments() {
        assert!(matches!(
            ArtifactPath::new("a/../b"),
            Err(ValidationError::InvalidSegment(s)) if s == ".."
        ));
        assert!(matches!(
            ArtifactPath::new("a//b"),
            Err(ValidationError::InvalidSegment(_))
        ));
        assert!(matches!(
            ArtifactPath::new("dir/"),
            Err(ValidationError::InvalidSegment(_))
        ));
    }

    #[test]
    fn extension_edge_cases() {
        assert_eq!(ArtifactPath::new("Makefile").unwrap().extension(), None);
        assert_eq!(ArtifactPath::new("a.tar.gz").unwrap().extension(), Some("gz"));
        assert_eq!(ArtifactPath::new("v1.2/readme").unwrap().extension(), None);
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: ArtifactPath = serde_json::from_str("\"index.html\"").unwrap();
        assert_eq!(ok.as_str(), "index.html");
        assert!(serde_json::from_str::<ArtifactPath>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"index.html\"");
    }
}
