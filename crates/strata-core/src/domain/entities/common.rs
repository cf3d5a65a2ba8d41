use std::path::Path;

use glob::Pattern;

use super::DomainError;

/// Bytes inspected when sniffing for binary content.
pub const BINARY_SNIFF_LEN: usize = 8000;

/// Normalise a template-relative path to forward slashes.
///
/// Leading `./` segments and empty segments are dropped.
///
/// # Errors
///
/// [`DomainError::AbsolutePathNotAllowed`] for absolute paths or paths that
/// climb out of the root with `..`.
pub fn normalize_path(path: &str) -> Result<String, DomainError> {
    let unified = path.replace('\\', "/");
    if unified.starts_with('/') || Path::new(path).is_absolute() {
        return Err(DomainError::AbsolutePathNotAllowed {
            path: path.to_string(),
        });
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(DomainError::AbsolutePathNotAllowed {
                    path: path.to_string(),
                });
            }
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

/// Content sniffing: a NUL byte in the leading window, or invalid UTF-8,
/// marks the content as binary.
pub fn is_binary(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    window.contains(&0) || std::str::from_utf8(bytes).is_err()
}

/// A compiled list of glob patterns.
///
/// `*` also matches `/`, so `*.json` matches `config/app.json`.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile every pattern.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidPattern`] for the first pattern that fails to parse.
    pub fn compile<I, S>(patterns: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| DomainError::InvalidPattern {
                    pattern: p.to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_dot_segments_and_backslashes() {
        assert_eq!(normalize_path("./src\\main.rs").unwrap(), "src/main.rs");
        assert_eq!(normalize_path("a//b/").unwrap(), "a/b");
    }

    #[test]
    fn normalize_rejects_escapes() {
        assert!(normalize_path("/etc/passwd").is_err());
        assert!(normalize_path("../outside").is_err());
        assert!(normalize_path("a/../../b").is_err());
    }

    #[test]
    fn binary_sniffing() {
        assert!(!is_binary(b"plain text\n"));
        assert!(!is_binary(b""));
        assert!(is_binary(&[0x89, b'P', b'N', b'G', 0, 0]));
        assert!(is_binary(&[0xff, 0xfe, 0xfd]));
    }

    #[test]
    fn pattern_set_matches_nested_paths() {
        let set = PatternSet::compile(["*.json", "docs/**"]).unwrap();
        assert!(set.matches("package.json"));
        assert!(set.matches("config/app.json"));
        assert!(set.matches("docs/guide/intro.md"));
        assert!(!set.matches("README.md"));
    }

    #[test]
    fn pattern_set_reports_bad_glob() {
        let err = PatternSet::compile(["[unclosed"]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPattern { .. }));
    }
}
