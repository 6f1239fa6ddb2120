//! Filename resolution for fenced blocks.
//!
//! Assistant prose has no fixed convention for naming the file a block belongs
//! to, so resolution is a best-effort cascade: fence metadata first, then the
//! nearest preceding prose line that matches one of [`FilenamePattern::CASCADE`],
//! then a default keyed by the fence language.

use regex::Regex;
use std::sync::LazyLock;

/// Number of prose lines before a fence that are searched for a filename.
pub const CONTEXT_LINES: usize = 5;

static ACTION_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:create|edit|update|new)\s+(?:the\s+)?(?:file\s+)?[`']?([^`'\n]+?\.\w+)[`']?")
        .expect("action verb pattern should compile")
});
static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[`']([^`'\n]+?\.\w+)[`']").expect("quoted pattern should compile")
});
static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^)\n]+?\.\w+)\)").expect("parenthesized pattern should compile")
});
static FILE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)file:\s*(\S+)").expect("file label pattern should compile")
});
static PATH_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:file:|path:)").expect("path prefix pattern should compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenamePattern {
    /// `Create the file app.js`, `Update index.html`, ...
    ActionVerb,
    /// `` `app.js` `` or `'app.js'`
    Quoted,
    /// `(app.js)`
    Parenthesized,
    /// `file: app.js`
    FileLabel,
}

impl FilenamePattern {
    /// Evaluation order, most specific first.
    pub const CASCADE: [FilenamePattern; 4] = [
        Self::ActionVerb,
        Self::Quoted,
        Self::Parenthesized,
        Self::FileLabel,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            Self::ActionVerb => &ACTION_VERB,
            Self::Quoted => &QUOTED,
            Self::Parenthesized => &PARENTHESIZED,
            Self::FileLabel => &FILE_LABEL,
        }
    }

    pub fn capture(self, line: &str) -> Option<&str> {
        self.regex()
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str())
    }

    /// First pattern of the cascade that matches `line`.
    pub fn first_match(line: &str) -> Option<(Self, &str)> {
        Self::CASCADE
            .iter()
            .find_map(|pattern| pattern.capture(line).map(|token| (*pattern, token)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    FenceMetadata,
    Prose {
        pattern: FilenamePattern,
        /// 1 for the line directly above the fence.
        distance: usize,
    },
    LanguageDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub filename: String,
    pub language: String,
    pub source: ResolutionSource,
}

/// Resolves the target filename of a fenced block.
///
/// `preceding` holds the prose lines before the fence in source order; only
/// the last [`CONTEXT_LINES`] are considered, nearest first.
pub fn resolve(language_tag: &str, metadata: Option<&str>, preceding: &[&str]) -> Resolution {
    let language = language_tag.trim().to_ascii_lowercase();

    if let Some(filename) = metadata
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| clean_filename(raw, &language))
    {
        return Resolution {
            filename,
            language,
            source: ResolutionSource::FenceMetadata,
        };
    }

    for (index, line) in preceding.iter().rev().take(CONTEXT_LINES).enumerate() {
        let Some((pattern, token)) = FilenamePattern::first_match(line.trim()) else {
            continue;
        };
        if let Some(filename) = clean_filename(token, &language) {
            return Resolution {
                filename,
                language,
                source: ResolutionSource::Prose {
                    pattern,
                    distance: index + 1,
                },
            };
        }
    }

    Resolution {
        filename: default_filename(&language),
        language,
        source: ResolutionSource::LanguageDefault,
    }
}

/// Normalizes a raw filename token. Returns `None` when nothing is left.
pub fn clean_filename(raw: &str, language: &str) -> Option<String> {
    let mut token = raw.trim();
    token = token
        .strip_prefix(['\'', '"', '`'])
        .unwrap_or(token);
    token = token
        .strip_suffix(['\'', '"', '`'])
        .unwrap_or(token);
    token = match PATH_PREFIX.find(token) {
        Some(prefix) => &token[prefix.end()..],
        None => token,
    };
    if let Some(inner) = token
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        token = inner;
    }
    token = token.trim();

    if let Some((_, embedded)) = FilenamePattern::first_match(token) {
        token = embedded.trim();
    }

    if token.is_empty() {
        return None;
    }

    if token.contains('.') {
        Some(token.to_string())
    } else {
        Some(format!("{token}{}", default_extension(language)))
    }
}

pub fn default_filename(language: &str) -> String {
    match language {
        "php" => "index.php".to_string(),
        "html" => "index.html".to_string(),
        "css" => "styles.css".to_string(),
        "javascript" | "js" => "script.js".to_string(),
        "python" => "main.py".to_string(),
        other => format!("file.{other}"),
    }
}

pub fn default_extension(language: &str) -> &'static str {
    match language {
        "php" => ".php",
        "css" => ".css",
        "javascript" | "js" => ".js",
        "html" => ".html",
        "python" => ".py",
        _ => ".txt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_metadata_wins_over_prose() {
        let resolution = resolve(
            "javascript",
            Some("(`src/app.js`)"),
            &["Create the file `other.js`:"],
        );
        assert_eq!(resolution.filename, "src/app.js");
        assert_eq!(resolution.source, ResolutionSource::FenceMetadata);
    }

    #[test]
    fn fence_metadata_strips_prefixes_and_quotes() {
        assert_eq!(resolve("js", Some("file: app.js"), &[]).filename, "app.js");
        assert_eq!(resolve("js", Some("\"path:lib/util.js\""), &[]).filename, "lib/util.js");
    }

    #[test]
    fn fence_metadata_without_extension_gets_language_extension() {
        assert_eq!(resolve("python", Some("main"), &[]).filename, "main.py");
        assert_eq!(resolve("toml", Some("Cargo"), &[]).filename, "Cargo.txt");
    }

    #[test]
    fn each_pattern_matches_on_its_own() {
        assert_eq!(
            FilenamePattern::ActionVerb.capture("Update the file index.html now"),
            Some("index.html")
        );
        assert_eq!(
            FilenamePattern::Quoted.capture("Put this in 'style.css' please"),
            Some("style.css")
        );
        assert_eq!(
            FilenamePattern::Parenthesized.capture("The server (server.py) handles it"),
            Some("server.py")
        );
        assert_eq!(
            FilenamePattern::FileLabel.capture("File: config.json"),
            Some("config.json")
        );
    }

    #[test]
    fn cascade_prefers_more_specific_pattern_on_same_line() {
        let (pattern, token) =
            FilenamePattern::first_match("Create `app.js` next to (old.js)").expect("match");
        assert_eq!(pattern, FilenamePattern::ActionVerb);
        assert_eq!(token, "app.js");
    }

    #[test]
    fn nearest_matching_line_wins() {
        let preceding = ["Create `far.js` first.", "Some filler.", "Then edit `near.js`:"];
        let resolution = resolve("js", None, &preceding);
        assert_eq!(resolution.filename, "near.js");
        assert_eq!(
            resolution.source,
            ResolutionSource::Prose {
                pattern: FilenamePattern::ActionVerb,
                distance: 1,
            }
        );
    }

    #[test]
    fn prose_beyond_context_window_is_ignored() {
        let preceding = ["Create `far.js`:", "a", "b", "c", "d", "e"];
        let resolution = resolve("css", None, &preceding);
        assert_eq!(resolution.filename, "styles.css");
        assert_eq!(resolution.source, ResolutionSource::LanguageDefault);
    }

    #[test]
    fn language_defaults_apply_without_hints() {
        assert_eq!(resolve("HTML", None, &[]).filename, "index.html");
        assert_eq!(resolve("php", None, &[]).filename, "index.php");
        assert_eq!(resolve("js", None, &[]).filename, "script.js");
        assert_eq!(resolve("python", None, &["no hints here"]).filename, "main.py");
        assert_eq!(resolve("rust", None, &[]).filename, "file.rust");
        assert_eq!(resolve("HTML", None, &[]).language, "html");
    }

    #[test]
    fn clean_rejects_empty_tokens() {
        assert_eq!(clean_filename("()", "js"), None);
        assert_eq!(clean_filename("  ", "js"), None);
    }
}
