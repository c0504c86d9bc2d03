//! The three review steps and the command that chains them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use reviai_core::{Config, KnownModel, PromptLibrary, ReviewTable};
use reviai_excel::{generate_pdfs, list_sheets, PdfRequest, SheetExporter};
use reviai_review::{read_template_file, Reviewer};

/// Prompt template selection shared by `review` and `run`.
#[derive(Args, Debug, Default)]
pub struct PromptArgs {
    /// Prompt template name from the prompts directory (default: first template)
    #[arg(short, long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Read the prompt template from a file instead
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
}

pub struct RunRequest<'a> {
    pub workbook: &'a Path,
    pub sheets: &'a [String],
    pub version: u32,
    pub round: u32,
    pub prompt: &'a PromptArgs,
    pub extra: &'a [PathBuf],
}

pub fn sheets(exporter: &mut dyn SheetExporter, workbook: &Path) -> Result<()> {
    let names = list_sheets(workbook, exporter)
        .with_context(|| format!("Failed to read sheets from '{}'", workbook.display()))?;
    for (i, name) in names.iter().enumerate() {
        println!("{}\t{}", i, name);
    }
    Ok(())
}

pub fn export(
    exporter: &mut dyn SheetExporter,
    workbook: &Path,
    sheets: &[String],
    version: u32,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let request = PdfRequest::new(workbook, sheets, version, output_dir);
    let pdfs = generate_pdfs(exporter, &request)
        .with_context(|| format!("PDF generation failed for '{}'", workbook.display()))?;
    for pdf in &pdfs {
        println!("{}", pdf.display());
    }
    Ok(pdfs)
}

/// Override the configured model, warning about names not in the model list.
pub fn apply_model(config: &mut Config, model: Option<&str>) {
    let Some(model) = model else { return };
    if KnownModel::find(model).is_none() {
        tracing::warn!("Unknown model '{}', using it anyway", model);
    }
    config.api.gemini_model = model.to_string();
}

/// Template text selected by the prompt arguments.
pub fn load_template(config: &Config, args: &PromptArgs) -> Result<String> {
    if let Some(path) = &args.prompt_file {
        return read_template_file(path)
            .with_context(|| format!("Failed to read prompt file '{}'", path.display()));
    }

    let library = PromptLibrary::open(&config.paths.prompts_dir)
        .context("Failed to open prompt directory")?;
    let name = match &args.prompt {
        Some(name) => name.clone(),
        None => library.default_name()?,
    };
    tracing::info!("Using prompt template: {}", name);
    Ok(library.read(&name)?)
}

pub fn review(
    config: &Config,
    files: &[PathBuf],
    prompt: &PromptArgs,
    output: Option<&Path>,
) -> Result<ReviewTable> {
    let template = load_template(config, prompt)?;
    let reviewer = Reviewer::from_config(config).context("Failed to create Gemini client")?;
    let table = reviewer
        .review_with_retry(files, &template)
        .context("AI review failed")?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_review_path(config),
    };
    table
        .to_json_file(&output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    tracing::info!("Review saved to {}", output.display());
    println!("{}", output.display());
    println!("{} rows: {}", table.len(), table.summary());
    Ok(table)
}

fn default_review_path(config: &Config) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    config.paths.output_dir.join(format!("review_{ts}.json"))
}

pub fn save(review: &Path, round: u32, output_dir: &Path) -> Result<PathBuf> {
    let table = ReviewTable::from_json_file(review)
        .with_context(|| format!("Failed to read review '{}'", review.display()))?;
    write_results(&table, round, output_dir)
}

fn write_results(table: &ReviewTable, round: u32, output_dir: &Path) -> Result<PathBuf> {
    let path = reviai_report::save_review_workbook(table, round, output_dir)
        .context("Failed to save results")?;
    println!("{}", path.display());
    Ok(path)
}

pub fn run_all(
    config: &Config,
    exporter: &mut dyn SheetExporter,
    request: &RunRequest<'_>,
) -> Result<()> {
    tracing::info!("Step 1/3: exporting {} sheet(s) to PDF", request.sheets.len());
    let mut files = export(
        exporter,
        request.workbook,
        request.sheets,
        request.version,
        &config.pdf_dir(),
    )?;
    files.extend(request.extra.iter().cloned());
    if files.is_empty() {
        bail!("No documents to review");
    }

    tracing::info!("Step 2/3: reviewing {} document(s)", files.len());
    let table = review(config, &files, request.prompt, None)?;

    tracing::info!("Step 3/3: saving results");
    write_results(&table, request.round, &config.results_dir())?;
    Ok(())
}
