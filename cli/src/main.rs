//! unzotero CLI - Zotero library export tool
//!
//! A command-line tool for exporting a Zotero library (notes, attachments,
//! collections) into one DOCX, Markdown or JSON document.

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use unzotero::render::{self, OutputFormat, RenderOptions, SaveOutcome};
use unzotero::{ExportConfig, JsonSource, LibrarySource, LocalApiSource, Unzotero};

/// Zotero library export to DOCX, Markdown and JSON
#[derive(Parser)]
#[command(
    name = "unzotero",
    author = "iyulab",
    version,
    about = "Export a Zotero library into a single document",
    long_about = "unzotero - Zotero library exporter.\n\n\
                  Reads items, notes, attachments and collections from the Zotero\n\
                  local API (or a JSON snapshot) and writes one document with a\n\
                  table of contents and a section per collection.\n\n\
                  Usage:\n  \
                  unzotero                         Export with the configured defaults\n  \
                  unzotero export -o library.md    Export to Markdown\n  \
                  unzotero render note.html        Render a single note"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (default: <config dir>/unzotero/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the library (default command)
    Export(ExportArgs),

    /// Render a single HTML note file
    Render {
        /// Input HTML file
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "markdown")]
        format: NoteFormat,

        #[command(flatten)]
        markdown: MarkdownArgs,
    },

    /// Print the collection tree with item counts
    Tree {
        #[command(flatten)]
        source: SourceArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct SourceArgs {
    /// Read the library from a JSON snapshot instead of the local API
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Attachment storage directory
    #[arg(long, value_name = "DIR")]
    storage: Option<PathBuf>,

    /// Library id (0 = local user library)
    #[arg(long)]
    library_id: Option<String>,

    /// Treat the library id as a group library
    #[arg(long)]
    group: bool,
}

#[derive(Args, Default)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output document path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output extension)
    #[arg(short, long)]
    format: Option<FormatArg>,

    /// Media cache directory
    #[arg(long, value_name = "DIR")]
    cache: Option<PathBuf>,

    /// Skip all images
    #[arg(long)]
    no_images: bool,

    /// Skip HTML snapshot screenshots
    #[arg(long)]
    no_webpages: bool,

    /// Skip the metadata line under item titles
    #[arg(long)]
    no_metadata: bool,

    /// Download remote images referenced in notes
    #[arg(long)]
    download_note_images: bool,
}

#[derive(Args, Default)]
struct MarkdownArgs {
    /// Prepend YAML frontmatter
    #[arg(long)]
    frontmatter: bool,

    /// Escape Markdown control characters in text
    #[arg(long)]
    escape: bool,

    /// No blank lines between blocks
    #[arg(long)]
    compact: bool,
}

impl MarkdownArgs {
    fn options(&self) -> RenderOptions {
        let mut options = RenderOptions::default();
        if self.frontmatter {
            options = options.with_frontmatter();
        }
        if self.escape {
            options = options.with_escaping();
        }
        if self.compact {
            options = options.without_paragraph_spacing();
        }
        options
    }
}

/// Document output format
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Word document
    Docx,
    /// Markdown with an assets directory
    Markdown,
    /// Document structure as JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Docx => OutputFormat::Docx,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Single-note output format
#[derive(Clone, Copy, ValueEnum)]
enum NoteFormat {
    /// Markdown
    Markdown,
    /// Document blocks as JSON
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ExportConfig::resolve(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Export(ExportArgs::default())) {
        Commands::Export(args) => run_export(config, args),

        Commands::Render {
            input,
            output,
            format,
            markdown,
        } => {
            let html = fs::read_to_string(&input)?;
            let (doc, warnings) = unzotero::render_note_html(&html, &config);
            for warning in &warnings {
                eprintln!("{} {}", "warning:".yellow(), warning);
            }

            let content = match format {
                NoteFormat::Markdown => render::render_markdown(&doc, &markdown.options())?,
                NoteFormat::Json => render::render_json(&doc)?,
            };
            write_output(output.as_ref(), &content)
        }

        Commands::Tree { source, json } => {
            let config = apply_source_args(config, &source);
            config.validate()?;
            let library = open_source(&source, &config)?;
            let tree = unzotero::tree::build_library(library.as_ref(), &config)?;

            if json {
                let entries: Vec<_> = tree
                    .sorted_paths()
                    .into_iter()
                    .map(|path| {
                        serde_json::json!({
                            "path": path.to_string(),
                            "items": tree.items(path).map(|items| items.len()).unwrap_or(0),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for path in tree.sorted_paths() {
                    let count = tree.items(path).map(|items| items.len()).unwrap_or(0);
                    let indent = "  ".repeat(path.depth().saturating_sub(1));
                    let name = path.segments().last().cloned().unwrap_or_default();
                    println!("{}{} ({})", indent, name.bold(), count);
                }
            }
            Ok(())
        }

        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn run_export(config: ExportConfig, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = apply_source_args(config, &args.source);
    if let Some(output) = args.output {
        config = config.with_output(output);
    }
    if let Some(cache) = args.cache {
        config = config.with_cache_dir(cache);
    }
    if args.no_images {
        config = config.with_images(false);
    }
    if args.no_webpages {
        config = config.with_webpages(false);
    }
    if args.no_metadata {
        config = config.without_metadata();
    }
    if args.download_note_images {
        config = config.with_note_image_downloads(true);
    }

    let format = match args.format {
        Some(format) => OutputFormat::from(format),
        None => OutputFormat::from_path(&config.output)?,
    };

    config.validate()?;
    let pb = create_spinner("Reading library...");
    let source = open_source(&args.source, &config)?;

    pb.set_message("Assembling document...");
    let output = config.output.clone();
    let styling = config.styling.clone();
    let export = Unzotero::with_config(config).export(source.as_ref())?;

    pb.set_message("Writing document...");
    let outcome = render::save_with_fallback(export.document(), &output, format, &styling);
    pb.finish_and_clear();

    for warning in export.warnings() {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }

    match outcome? {
        SaveOutcome::Saved(path) => {
            println!(
                "{} Exported {} collections to {}",
                "✓".green().bold(),
                export.tree().len(),
                path.display()
            );
            Ok(())
        }
        SaveOutcome::Fallback { path, error } => {
            eprintln!(
                "{} could not write {}: {}",
                "!".yellow().bold(),
                output.display(),
                error
            );
            eprintln!("  document saved to {}", path.display());
            Err(format!("export saved to fallback path {}", path.display()).into())
        }
    }
}

fn apply_source_args(mut config: ExportConfig, args: &SourceArgs) -> ExportConfig {
    if let Some(ref storage) = args.storage {
        config = config.with_storage_dir(storage);
    }
    if let Some(ref id) = args.library_id {
        config.library_id = id.clone();
    }
    if args.group {
        config.library_type = "group".to_string();
    }
    config
}

fn open_source(
    args: &SourceArgs,
    config: &ExportConfig,
) -> Result<Box<dyn LibrarySource>, Box<dyn std::error::Error>> {
    match args.snapshot {
        Some(ref path) => Ok(Box::new(JsonSource::open(path)?)),
        None => Ok(Box::new(LocalApiSource::connect(config)?)),
    }
}

fn print_version() {
    println!("{} {}", "unzotero".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Zotero library export to DOCX, Markdown and JSON");
    println!();
    println!("Sources: Zotero local API, JSON snapshot");
    println!("Repository: https://github.com/iyulab/unzotero");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            if let Some(parent) = Path::new(p).parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
