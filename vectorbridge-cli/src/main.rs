//! Vectorbridge CLI
//!
//! Command-line interface for exporting scenes to level documents and
//! importing them back.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use vectorbridge_core::import::split_list;
use vectorbridge_core::{
    compile, export, import, xml, ExportMode, ImportOptions, ImportServices, NoTemplates,
    NumericLayers, ProjectConfig, Scene, VisualManifest, CONFIG_FILE,
};

#[derive(Parser)]
#[command(name = "vectorbridge")]
#[command(about = "Level document export and import for 2D platformer scenes")]
#[command(version)]
struct Cli {
    /// Project configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default vectorbridge.toml
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Export a scene to a level document
    Export {
        /// Scene JSON file
        #[arg(short, long)]
        scene: PathBuf,

        /// level, objects or buildings (default: from config)
        #[arg(short, long)]
        mode: Option<ExportMode>,

        /// Output document (default: output_dir/file_name from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the batch compiler afterwards
        #[arg(long)]
        compile: bool,

        /// Use the fast compile script
        #[arg(long)]
        fast: bool,
    },

    /// Import a level document into a scene
    Import {
        /// Directory holding the document and its referenced sets
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Document file name
        #[arg(short, long)]
        file: Option<String>,

        /// Comma-separated object names to import from a template set
        #[arg(long)]
        select: Option<String>,

        /// Comma-separated element names to skip
        #[arg(long)]
        ignore_tags: Option<String>,

        /// Don't create In/Out marker nodes for buildings
        #[arg(long)]
        no_markers: bool,

        /// Visual manifest JSON (sprite name to native size)
        #[arg(long)]
        visuals: Option<PathBuf>,

        /// Write the document header back into the configuration
        #[arg(long)]
        apply_config: bool,

        /// Output scene JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Re-indent an XML document
    Format {
        /// Input document
        input: PathBuf,

        /// Output path (default: overwrite input)
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vectorbridge=info".parse()?)
                .add_directive("vectorbridge_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => {
            cmd_init(path)?;
        }
        Commands::Export {
            scene,
            mode,
            output,
            compile,
            fast,
        } => {
            cmd_export(&cli.config, &scene, mode, output, compile, fast)?;
        }
        Commands::Import {
            dir,
            file,
            select,
            ignore_tags,
            no_markers,
            visuals,
            apply_config,
            output,
        } => {
            let args = ImportArgs {
                dir,
                file,
                select,
                ignore_tags,
                no_markers,
                visuals,
                apply_config,
                output,
            };
            cmd_import(&cli.config, args)?;
        }
        Commands::Format { input, output } => {
            cmd_format(&input, output)?;
        }
    }

    Ok(())
}

/// Write a default configuration
fn cmd_init(path: Option<PathBuf>) -> Result<()> {
    let project_dir = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    std::fs::create_dir_all(&project_dir).context("Failed to create project directory")?;

    tracing::info!("Initializing vectorbridge project in {}", project_dir.display());

    let config_path = project_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    ProjectConfig::default()
        .save(&config_path)
        .context(format!("Failed to write {}", CONFIG_FILE))?;

    println!("Initialized vectorbridge project at {}", project_dir.display());
    println!("\nNext steps:");
    println!("  1. Edit {} (sets, music, models)", CONFIG_FILE);
    println!("  2. Run: vectorbridge export --scene level.json");

    Ok(())
}

/// Export a scene file
fn cmd_export(
    config_path: &Path,
    scene_path: &Path,
    mode: Option<ExportMode>,
    output: Option<PathBuf>,
    run_compiler: bool,
    fast: bool,
) -> Result<()> {
    let mut config =
        ProjectConfig::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(mode) = mode {
        config.export.mode = mode;
    }

    let scene = Scene::load(scene_path)
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;
    let output = output
        .unwrap_or_else(|| config.export.output_dir.join(config.export.document_name()));

    let report = export(
        &scene,
        config.export.mode,
        &config.level_settings(),
        &NumericLayers,
        &output,
    )
    .context("Export failed")?;

    println!(
        "Exported {} document to {} ({} layers, {} elements)",
        report.mode,
        report.path.display(),
        report.layers,
        report.elements
    );

    if run_compiler || config.export.compile {
        let compiled = compile(
            &config.export.tools_dir,
            fast || config.export.fast_build,
            config.export.deploy_dir.as_deref(),
        )
        .context("Failed to run compiler")?;

        println!(
            "Compilation {} in {:.2}s",
            if compiled.success { "finished" } else { "failed" },
            compiled.elapsed.as_secs_f32()
        );
        if let Some(deployed) = compiled.deployed {
            println!("Archive copied to {}", deployed.display());
        }
    }

    Ok(())
}

struct ImportArgs {
    dir: Option<PathBuf>,
    file: Option<String>,
    select: Option<String>,
    ignore_tags: Option<String>,
    no_markers: bool,
    visuals: Option<PathBuf>,
    apply_config: bool,
    output: PathBuf,
}

/// Import a document into a scene file
fn cmd_import(config_path: &Path, args: ImportArgs) -> Result<()> {
    let mut config =
        ProjectConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let defaults = &config.import;

    let directory = args.dir.unwrap_or_else(|| defaults.directory.clone());
    let file_name = args.file.unwrap_or_else(|| defaults.file_name.clone());
    if file_name.trim().is_empty() {
        bail!("No document given; pass --file or set import.file_name");
    }

    let options = ImportOptions {
        selected: split_list(args.select.as_deref().unwrap_or(&defaults.selected)),
        ignored_tags: split_list(args.ignore_tags.as_deref().unwrap_or(&defaults.ignored_tags)),
        building_markers: defaults.building_markers && !args.no_markers,
        base_settings: config.level_settings(),
    };

    let visuals = match args.visuals.or_else(|| defaults.visuals.clone()) {
        Some(path) => VisualManifest::load(&path)
            .with_context(|| format!("Failed to load visual manifest {}", path.display()))?,
        None => VisualManifest::default(),
    };
    let services = ImportServices {
        visuals: &visuals,
        templates: &NoTemplates,
        layers: &NumericLayers,
    };

    let outcome = import(&directory, &file_name, &options, services)
        .with_context(|| format!("Failed to import {}", file_name))?;

    outcome
        .scene
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Imported {:?} document {} ({} nodes) to {}",
        outcome.kind,
        file_name,
        outcome.scene.len(),
        args.output.display()
    );

    if args.apply_config {
        config.apply_settings(outcome.settings);
        config
            .save(config_path)
            .context("Failed to update configuration")?;
        println!("Updated {} from the document header", config_path.display());
    }

    Ok(())
}

/// Re-indent a document
fn cmd_format(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let document = xml::parse_document(&source).context("Failed to parse document")?;
    let formatted = xml::to_pretty_string(&document)?;

    let output = output.unwrap_or_else(|| input.to_path_buf());
    std::fs::write(&output, formatted)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Formatted {}", output.display());
    Ok(())
}
