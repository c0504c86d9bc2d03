//! `reviai prompts ...`

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use reviai_core::{Config, PromptLibrary};

#[derive(Subcommand, Debug)]
pub enum PromptCommand {
    /// List prompt templates
    List,

    /// Print a template
    Show { name: String },

    /// Create a template from a file or stdin
    New {
        name: String,
        /// Read the content from this file instead of stdin
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Replace a template's content from a file or stdin
    Edit {
        name: String,
        /// Read the content from this file instead of stdin
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Rename a template
    Rename { name: String, new_name: String },

    /// Copy a template under a new name
    Copy { name: String, new_name: String },

    /// Delete a template (the last one cannot be deleted)
    Delete { name: String },
}

pub fn run(config: &Config, command: &PromptCommand) -> Result<()> {
    let library = PromptLibrary::open(&config.paths.prompts_dir).with_context(|| {
        format!(
            "Failed to open prompt directory '{}'",
            config.paths.prompts_dir.display()
        )
    })?;
    execute(&library, command, &mut std::io::stdin())
}

fn execute(library: &PromptLibrary, command: &PromptCommand, stdin: &mut dyn Read) -> Result<()> {
    match command {
        PromptCommand::List => {
            let default = library.default_name()?;
            for name in library.list()? {
                let marker = if name == default { " (default)" } else { "" };
                println!("{name}{marker}");
            }
        }
        PromptCommand::Show { name } => {
            let content = library.read(name)?;
            println!("{content}");
            eprintln!("{} characters", content.chars().count());
        }
        PromptCommand::New { name, from_file } => {
            let content = read_content(from_file.as_deref(), stdin)?;
            library.create(name, &content)?;
        }
        PromptCommand::Edit { name, from_file } => {
            let content = read_content(from_file.as_deref(), stdin)?;
            library.update(name, &content)?;
        }
        PromptCommand::Rename { name, new_name } => {
            library.rename(name, new_name)?;
        }
        PromptCommand::Copy { name, new_name } => {
            library.copy(name, new_name)?;
        }
        PromptCommand::Delete { name } => {
            library.delete(name)?;
        }
    }
    Ok(())
}

fn read_content(from_file: Option<&Path>, stdin: &mut dyn Read) -> Result<String> {
    match from_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        None => {
            let mut content = String::new();
            stdin
                .read_to_string(&mut content)
                .context("Failed to read prompt from stdin")?;
            Ok(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_from_stdin_then_copy_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let library = PromptLibrary::open(dir.path()).unwrap();
        let mut stdin = "# 詳細\r\n手順".as_bytes();

        let new = PromptCommand::New {
            name: "詳細".into(),
            from_file: None,
        };
        execute(&library, &new, &mut stdin).unwrap();
        assert_eq!(library.read("詳細").unwrap(), "# 詳細\n手順");

        let copy = PromptCommand::Copy {
            name: "詳細".into(),
            new_name: "詳細2".into(),
        };
        execute(&library, &copy, &mut std::io::empty()).unwrap();

        let delete = PromptCommand::Delete { name: "詳細".into() };
        execute(&library, &delete, &mut std::io::empty()).unwrap();
        assert_eq!(
            library.list().unwrap(),
            vec!["標準テンプレート".to_string(), "詳細2".to_string()]
        );
    }

    #[test]
    fn test_edit_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let library = PromptLibrary::open(dir.path().join("prompts")).unwrap();
        let source = dir.path().join("new.txt");
        std::fs::write(&source, "更新後").unwrap();

        let edit = PromptCommand::Edit {
            name: "標準テンプレート".into(),
            from_file: Some(source),
        };
        execute(&library, &edit, &mut std::io::empty()).unwrap();
        assert_eq!(library.read("標準テンプレート").unwrap(), "更新後");
    }

    #[test]
    fn test_last_template_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let library = PromptLibrary::open(dir.path()).unwrap();
        let delete = PromptCommand::Delete {
            name: "標準テンプレート".into(),
        };
        assert!(execute(&library, &delete, &mut std::io::empty()).is_err());
        assert_eq!(library.list().unwrap().len(), 1);
    }
}
