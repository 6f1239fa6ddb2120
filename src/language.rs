/// Display language for a filename, keyed by its extension.
pub fn language_for_filename(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return "plaintext";
    };
    match extension.to_ascii_lowercase().as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "html" => "html",
        "css" => "css",
        "php" => "php",
        "json" => "json",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "cs" => "csharp",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "swift" => "swift",
        "kt" => "kotlin",
        "md" => "markdown",
        _ => "plaintext",
    }
}

/// Material icon name shown next to a block or file of `language`.
pub fn language_icon(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "javascript" | "js" => "javascript",
        "html" => "html",
        "css" => "css",
        "json" => "data_object",
        "python" | "php" | "typescript" | "java" | "c" | "cpp" | "csharp" | "ruby" | "go"
        | "rust" | "swift" | "kotlin" => "code",
        _ => "description",
    }
}

#[cfg(test)]
mod tests {
    use super::{language_for_filename, language_icon};

    #[test]
    fn maps_known_extensions() {
        assert_eq!(language_for_filename("src/app.JS"), "javascript");
        assert_eq!(language_for_filename("lib.rs"), "rust");
        assert_eq!(language_for_filename("notes.txt"), "plaintext");
        assert_eq!(language_for_filename("Makefile"), "plaintext");
    }

    #[test]
    fn icons_fall_back_to_description() {
        assert_eq!(language_icon("JS"), "javascript");
        assert_eq!(language_icon("rust"), "code");
        assert_eq!(language_icon("yaml"), "description");
    }
}
