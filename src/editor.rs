#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    CSharp,
    Cpp,
    Go,
    Ruby,
    Rust,
    Php,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::Php => "php",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "javascript" => Some(Language::JavaScript),
            "typescript" => Some(Language::TypeScript),
            "python" => Some(Language::Python),
            "java" => Some(Language::Java),
            "csharp" => Some(Language::CSharp),
            "cpp" => Some(Language::Cpp),
            "go" => Some(Language::Go),
            "ruby" => Some(Language::Ruby),
            "rust" => Some(Language::Rust),
            "php" => Some(Language::Php),
            _ => None,
        }
    }

    /// Guess the language from a file extension (used when loading a file
    /// without an explicit --language flag).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "cs" => Some(Language::CSharp),
            "cpp" | "cc" | "cxx" | "hpp" | "h" => Some(Language::Cpp),
            "go" => Some(Language::Go),
            "rb" => Some(Language::Ruby),
            "rs" => Some(Language::Rust),
            "php" => Some(Language::Php),
            _ => None,
        }
    }

    pub fn all() -> Vec<Language> {
        vec![
            Language::JavaScript,
            Language::TypeScript,
            Language::Python,
            Language::Java,
            Language::CSharp,
            Language::Cpp,
            Language::Go,
            Language::Ruby,
            Language::Rust,
            Language::Php,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::CSharp => "C#",
            Language::Cpp => "C++",
            Language::Go => "Go",
            Language::Ruby => "Ruby",
            Language::Rust => "Rust",
            Language::Php => "PHP",
        }
    }
}

/// Snapshot of the editor taken when a trigger is accepted, so edits made
/// while a request is in flight do not leak into it.
#[derive(Debug, Clone)]
pub struct EditorSnapshot {
    pub code: String,
    pub language: Language,
}

/// Current source text and selected language. Pure state holder; language
/// membership is enforced by the enum itself.
#[derive(Debug)]
pub struct EditorState {
    code: String,
    language: Language,
}

impl EditorState {
    pub fn new(code: String, language: Language) -> Self {
        Self { code, language }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_code(&mut self, code: String) {
        self.code = code;
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            code: self.code.clone(),
            language: self.language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_round_trip() {
        for lang in Language::all() {
            assert_eq!(Language::from_str(lang.as_str()), Some(lang));
        }
    }

    #[test]
    fn test_language_from_str_rejects_unknown() {
        assert_eq!(Language::from_str("cobol"), None);
        assert_eq!(Language::from_str(""), None);
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_edits() {
        let mut editor = EditorState::new("x = 1".to_string(), Language::Python);
        let snap = editor.snapshot();
        editor.set_code("x = 2".to_string());
        editor.set_language(Language::Ruby);
        assert_eq!(snap.code, "x = 1");
        assert_eq!(snap.language, Language::Python);
    }
}
