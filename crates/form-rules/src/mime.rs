use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

/// Allowed upload types: MIME patterns (`image/*`, `application/pdf`) and bare
/// extensions (`pdf`, `.png`).
#[derive(Debug, Clone)]
pub struct MimeMatcher {
    globs: GlobSet,
    extensions: Vec<String>,
    empty: bool,
}

impl MimeMatcher {
    pub fn new(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut extensions = Vec::new();
        let mut usable = 0usize;

        for pattern in patterns {
            let pattern = pattern.trim().to_ascii_lowercase();
            if pattern.is_empty() {
                continue;
            }
            let pattern = if pattern == "*" { "*/*".to_string() } else { pattern };
            if !pattern.contains('/') {
                extensions.push(pattern.trim_start_matches('.').to_string());
                usable += 1;
                continue;
            }
            match GlobBuilder::new(&pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
            {
                Ok(glob) => {
                    builder.add(glob);
                    usable += 1;
                }
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "skipping invalid MIME pattern")
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|err| {
            warn!(error = %err, "failed to compile MIME patterns");
            GlobSet::empty()
        });

        Self {
            globs,
            extensions,
            empty: usable == 0,
        }
    }

    /// True when no usable pattern was configured; every type is then accepted.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn matches(&self, mime: &str, file_name: Option<&str>) -> bool {
        if self.empty {
            return true;
        }
        let mime = essence(mime);
        if !mime.is_empty() && self.globs.is_match(mime.as_str()) {
            return true;
        }
        let subtype = mime.split_once('/').map(|(_, subtype)| subtype);
        let file_extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension.to_ascii_lowercase());
        self.extensions.iter().any(|extension| {
            let extension = Some(extension.as_str());
            subtype == extension || file_extension.as_deref() == extension
        })
    }
}

/// `type/subtype` without parameters, lowercased.
fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Matches a single pattern such as `image/*` against a concrete type.
pub fn mime_matches(pattern: &str, mime: &str) -> bool {
    MimeMatcher::new(&[pattern.to_string()]).matches(mime, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_category() {
        assert!(mime_matches("image/*", "image/png"));
        assert!(mime_matches("IMAGE/*", "image/PNG"));
        assert!(!mime_matches("image/*", "application/pdf"));
        assert!(mime_matches("*/*", "video/mp4"));
    }

    #[test]
    fn exact_types_ignore_parameters() {
        assert!(mime_matches("text/plain", "text/plain; charset=utf-8"));
        assert!(!mime_matches("text/plain", "text/html"));
    }

    #[test]
    fn extensions_match_subtype_or_file_name() {
        let matcher = MimeMatcher::new(&["pdf".into(), ".jpg".into()]);
        assert!(matcher.matches("application/pdf", None));
        assert!(matcher.matches("image/jpeg", Some("holiday.JPG")));
        assert!(!matcher.matches("image/png", Some("diagram.png")));
    }

    #[test]
    fn empty_matcher_accepts_everything() {
        let matcher = MimeMatcher::new(&[]);
        assert!(matcher.is_empty());
        assert!(matcher.matches("application/zip", None));
    }
}
