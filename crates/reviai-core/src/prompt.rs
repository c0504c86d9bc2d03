//! Prompt template library: a directory of `*.txt` files, one template each.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const EXTENSION: &str = "txt";

pub const DEFAULT_PROMPT_NAME: &str = "標準テンプレート";
pub const DEFAULT_PROMPT: &str = "# AI評審プロンプト\n\nこのファイルにプロンプトを記入してください。";

/// Prompt templates stored as `<dir>/<name>.txt`.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    /// Open (and create if needed) a prompt directory.
    ///
    /// An empty directory is seeded with the default template so that there
    /// is always at least one prompt to choose from.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let library = Self { dir: dir.into() };
        fs::create_dir_all(&library.dir)?;

        if library.list()?.is_empty() {
            let path = library.path_for(DEFAULT_PROMPT_NAME);
            fs::write(&path, DEFAULT_PROMPT)?;
            tracing::info!("Created default prompt: {}", path.display());
        }

        Ok(library)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template names (file stems), sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// The template selected when none is named: first in sorted order.
    pub fn default_name(&self) -> Result<String> {
        self.list()?
            .into_iter()
            .next()
            .ok_or_else(|| Error::PromptNotFound(DEFAULT_PROMPT_NAME.to_string()))
    }

    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        self.existing(name)
    }

    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.existing(name)?;
        Ok(fs::read_to_string(path)?)
    }

    pub fn create(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.vacant(name)?;
        fs::write(&path, normalize_line_breaks(content))?;
        tracing::info!("Created prompt: {}", path.display());
        Ok(path)
    }

    pub fn update(&self, name: &str, content: &str) -> Result<()> {
        let path = self.existing(name)?;
        fs::write(&path, normalize_line_breaks(content))?;
        tracing::info!("Updated prompt: {}", path.display());
        Ok(())
    }

    pub fn rename(&self, name: &str, new_name: &str) -> Result<PathBuf> {
        let from = self.existing(name)?;
        let to = self.vacant(new_name)?;
        fs::rename(&from, &to)?;
        tracing::info!("Renamed prompt '{name}' to '{new_name}'");
        Ok(to)
    }

    pub fn copy(&self, name: &str, new_name: &str) -> Result<PathBuf> {
        let from = self.existing(name)?;
        let to = self.vacant(new_name)?;
        fs::copy(&from, &to)?;
        tracing::info!("Copied prompt '{name}' to '{new_name}'");
        Ok(to)
    }

    /// Delete a template. The last remaining template cannot be deleted.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.existing(name)?;
        if self.list()?.len() <= 1 {
            return Err(Error::LastPrompt(name.to_string()));
        }
        fs::remove_file(&path)?;
        tracing::info!("Deleted prompt: {}", path.display());
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    fn existing(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::PromptNotFound(name.to_string()));
        }
        Ok(path)
    }

    fn vacant(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.path_for(name);
        if path.exists() {
            return Err(Error::PromptExists(name.to_string()));
        }
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.contains(['/', '\\'])
        || name.contains("..")
    {
        return Err(Error::InvalidPromptName(name.to_string()));
    }
    Ok(())
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn library() -> (tempfile::TempDir, PromptLibrary) {
        let dir = tempfile::tempdir().unwrap();
        let library = PromptLibrary::open(dir.path().join("prompts")).unwrap();
        (dir, library)
    }

    #[test]
    fn test_open_seeds_default() {
        let (_dir, library) = library();
        assert_eq!(library.list().unwrap(), vec![DEFAULT_PROMPT_NAME.to_string()]);
        assert_eq!(library.read(DEFAULT_PROMPT_NAME).unwrap(), DEFAULT_PROMPT);
        assert_eq!(library.default_name().unwrap(), DEFAULT_PROMPT_NAME);
    }

    #[test]
    fn test_open_keeps_existing_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("design.txt"), "review the design").unwrap();
        fs::write(dir.path().join("notes.md"), "not a template").unwrap();

        let library = PromptLibrary::open(dir.path()).unwrap();
        assert_eq!(library.list().unwrap(), vec!["design".to_string()]);
    }

    #[test]
    fn test_create_normalizes_line_breaks() {
        let (_dir, library) = library();
        library.create("api", "line1\r\nline2\rline3").unwrap();
        assert_eq!(library.read("api").unwrap(), "line1\nline2\nline3");
        assert_eq!(
            library.list().unwrap(),
            vec!["api".to_string(), DEFAULT_PROMPT_NAME.to_string()]
        );
    }

    #[test]
    fn test_create_existing_fails() {
        let (_dir, library) = library();
        let err = library.create(DEFAULT_PROMPT_NAME, "x").unwrap_err();
        assert!(matches!(err, Error::PromptExists(_)));
    }

    #[test]
    fn test_invalid_names() {
        let (_dir, library) = library();
        for name in ["", "  ", "../escape", "a/b", "a\\b", " padded"] {
            let err = library.create(name, "x").unwrap_err();
            assert!(matches!(err, Error::InvalidPromptName(_)), "{name:?}");
        }
    }

    #[test]
    fn test_update_rename_copy() {
        let (_dir, library) = library();
        library.create("first", "one").unwrap();
        library.update("first", "uno").unwrap();
        assert_eq!(library.read("first").unwrap(), "uno");

        library.rename("first", "second").unwrap();
        assert!(matches!(library.read("first"), Err(Error::PromptNotFound(_))));
        assert_eq!(library.read("second").unwrap(), "uno");

        library.copy("second", "third").unwrap();
        assert_eq!(library.read("third").unwrap(), "uno");
        assert!(matches!(
            library.copy("second", "third"),
            Err(Error::PromptExists(_))
        ));
    }

    #[test]
    fn test_delete_refuses_last_template() {
        let (_dir, library) = library();
        library.create("extra", "x").unwrap();
        library.delete(DEFAULT_PROMPT_NAME).unwrap();
        assert_eq!(library.list().unwrap(), vec!["extra".to_string()]);

        let err = library.delete("extra").unwrap_err();
        assert!(matches!(err, Error::LastPrompt(_)));
        assert!(matches!(
            library.delete("missing"),
            Err(Error::PromptNotFound(_))
        ));
    }
}
