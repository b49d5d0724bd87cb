mod catalog;
mod commit;
mod config;
mod error;
mod identity;
mod ranking;
mod reconcile;
mod report;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogSummary;
use crate::catalog::file::{self, CatalogFile};
use crate::commit::Pending;
use crate::config::{AppendPosition, MergeOptions, MergeOverrides};
use crate::identity::IdentityStrategy;
use crate::report::{BatchStep, MergeReportContext, Side};

const DEFAULT_COMPARE_OUTPUT: &str = "output/comparison-report.txt";
const DEFAULT_MERGE_OUTPUT: &str = "output/merged-result.json";

#[derive(Parser)]
#[command(version, author, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compares two catalogs and writes a difference report grouped by album
    Compare {
        file1: PathBuf,

        file2: PathBuf,

        /// Where to write the report
        #[arg(default_value = DEFAULT_COMPARE_OUTPUT)]
        output: PathBuf,

        /// Only write the report file, do not print it
        #[arg(long)]
        no_console: bool,

        /// How tracks are matched between catalogs
        #[arg(long, value_enum, default_value_t)]
        identity_strategy: IdentityStrategy,
    },

    /// Adds the tracks of a secondary catalog that the main catalog lacks
    Merge {
        /// The catalog that is kept and extended
        main: PathBuf,

        /// The catalog new tracks are taken from
        secondary: PathBuf,

        /// Where to write the merged catalog (defaults to `output/merged-result.json`,
        /// or the main file itself with `--interactive`)
        output: Option<PathBuf>,

        /// Ask for confirmation after the preview
        #[arg(long)]
        interactive: bool,

        #[command(flatten)]
        strategy: StrategyArgs,
    },

    /// Merges several secondary catalogs into the main catalog, one after another
    BatchMerge {
        main: PathBuf,

        #[arg(required = true)]
        secondaries: Vec<PathBuf>,

        /// Where to write the merged catalog (defaults to the main file itself)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        strategy: StrategyArgs,
    },

    /// Combines two lists by `id` and ranks the result by `count`
    Combine {
        primary: PathBuf,

        secondary: PathBuf,

        output: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate the completions for
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

#[derive(Args)]
struct StrategyArgs {
    /// How tracks are matched between catalogs [default: name+album]
    #[arg(long, value_enum)]
    identity_strategy: Option<IdentityStrategy>,

    /// Where new tracks are placed [default: end]
    #[arg(long, value_enum)]
    append_position: Option<AppendPosition>,

    /// Keep new tracks in secondary catalog order instead of sorting by album
    #[arg(long)]
    no_sort: bool,

    /// Do not back up the main file before writing
    #[arg(long)]
    no_backup: bool,

    /// Backup location (defaults to `<main>.backup.<timestamp>.json`)
    #[arg(long)]
    backup_path: Option<PathBuf>,

    /// Do not print the merge preview
    #[arg(short, long)]
    quiet: bool,

    /// JSON file with merge settings; command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

impl StrategyArgs {
    fn overrides(&self) -> MergeOverrides {
        MergeOverrides {
            identity_strategy: self.identity_strategy,
            append_position: self.append_position,
            sort_new_by_album: self.no_sort.then_some(false),
            create_backup: self.no_backup.then_some(false),
            show_preview: self.quiet.then_some(false),
            backup_path: self.backup_path.clone(),
        }
    }

    fn resolve(&self) -> Result<MergeOptions> {
        let mut options = MergeOptions::default();
        if let Some(path) = &self.config {
            options = options.with_overrides(&MergeOverrides::load(path)?);
            debug!("Loaded merge settings from {}", path.display());
        }
        Ok(options.with_overrides(&self.overrides()))
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "catalog_reconcile=debug"
    } else {
        "catalog_reconcile=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn load(path: &Path) -> Result<CatalogFile> {
    let catalog = CatalogFile::load(path)?;
    info!(
        "Loaded {} ({} tracks)",
        path.display(),
        catalog.tracks().len(),
    );
    Ok(catalog)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn compare(
    file1: &Path,
    file2: &Path,
    output: &Path,
    strategy: IdentityStrategy,
    print: bool,
) -> Result<()> {
    let first_catalog = load(file1)?;
    let second_catalog = load(file2)?;

    let first = CatalogSummary::analyze(first_catalog.tracks());
    let second = CatalogSummary::analyze(second_catalog.tracks());
    debug!(
        "{} albums in {}, {} albums in {}",
        first.total_albums(),
        file1.display(),
        second.total_albums(),
        file2.display(),
    );

    let difference = reconcile::diff(&first, &second, strategy);
    let first_label = file_label(file1);
    let second_label = file_label(file2);
    let text = report::diff_report(
        &Side {
            label: &first_label,
            summary: &first,
        },
        &Side {
            label: &second_label,
            summary: &second,
        },
        &difference,
    );

    if print {
        println!("{text}");
    }
    file::write_text(output, &text)?;
    info!("Report written to {}", output.display());
    Ok(())
}

fn merge(
    main_path: &Path,
    secondary_path: &Path,
    output: &Path,
    options: &MergeOptions,
    interactive: bool,
) -> Result<()> {
    let main_catalog = load(main_path)?;
    let secondary_catalog = load(secondary_path)?;

    let plan = reconcile::plan_merge(
        main_catalog.tracks(),
        secondary_catalog.tracks(),
        options.identity_strategy,
    );
    if options.show_preview || interactive {
        println!("{}", report::merge_preview(&plan));
    }
    for duplicate in &plan.duplicates {
        debug!(
            "Skipping {:?}, key {} already taken by {:?}",
            duplicate.candidate.name(),
            duplicate.key,
            duplicate.existing.name(),
        );
    }

    if plan.new_tracks.is_empty() {
        info!("No new tracks in {}", secondary_path.display());
        return Ok(());
    }

    if interactive && !confirm("Continue with the merge? (y/n): ")? {
        info!("Merge cancelled");
        return Ok(());
    }

    let merged = reconcile::apply_merge(main_catalog.tracks(), &plan.new_tracks, options);
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let text = report::merge_report(
        &plan,
        &MergeReportContext {
            main_file: &main_path.display().to_string(),
            secondary_file: &secondary_path.display().to_string(),
            output_file: &output.display().to_string(),
            options,
            generated_at: &generated_at,
        },
    );
    let pending = Pending {
        catalog: main_catalog.with_tracks(merged),
        added: plan.new_tracks.len(),
        report: Some(text),
    };
    commit::commit(main_path, output, &pending, options, Utc::now())?;
    Ok(())
}

fn batch_merge(
    main_path: &Path,
    secondaries: &[PathBuf],
    output: &Path,
    options: &MergeOptions,
) -> Result<()> {
    let main_catalog = load(main_path)?;

    let (merged, steps) = secondaries.iter().enumerate().try_fold(
        (main_catalog.tracks().to_vec(), Vec::new()),
        |(current, mut steps), (i, path)| -> Result<_> {
            info!("[{}/{}] {}", i + 1, secondaries.len(), path.display());
            let secondary = load(path)?;
            let (next, counts) = reconcile::merge_step(current, secondary.tracks(), options);
            info!("{} new, {} duplicate", counts.new, counts.duplicates);
            steps.push(BatchStep {
                file: path.display().to_string(),
                counts,
            });
            Ok((next, steps))
        },
    )?;

    if options.show_preview {
        println!("{}", report::batch_summary(&steps, merged.len()));
    }

    let pending = Pending {
        catalog: main_catalog.with_tracks(merged),
        added: steps.iter().map(|step| step.counts.new).sum(),
        report: None,
    };
    if commit::commit(main_path, output, &pending, options, Utc::now())?.is_none() {
        info!("No new tracks in any secondary catalog");
    }
    Ok(())
}

fn combine(primary: &Path, secondary: &Path, output: &Path) -> Result<()> {
    let primary_catalog = load(primary)?;
    let secondary_catalog = load(secondary)?;
    let combined = ranking::combine_by_id(primary_catalog.tracks(), secondary_catalog.tracks());
    if combined.is_empty() {
        warn!(
            "No entries with an `id` in {} or {}",
            primary.display(),
            secondary.display(),
        );
    }

    let json = CatalogFile::Bare(combined)
        .to_json_string()
        .context("failed to serialize combined list")?;
    file::write_text(output, &format!("{json}\n"))?;
    info!("Combined list written to {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compare {
            file1,
            file2,
            output,
            no_console,
            identity_strategy,
        } => compare(&file1, &file2, &output, identity_strategy, !no_console)?,
        Commands::Merge {
            main,
            secondary,
            output,
            interactive,
            strategy,
        } => {
            let options = strategy.resolve()?;
            let output = output.unwrap_or_else(|| {
                if interactive {
                    main.clone()
                } else {
                    PathBuf::from(DEFAULT_MERGE_OUTPUT)
                }
            });
            merge(&main, &secondary, &output, &options, interactive)?;
        }
        Commands::BatchMerge {
            main,
            secondaries,
            output,
            strategy,
        } => {
            let options = strategy.resolve()?;
            let output = output.unwrap_or_else(|| main.clone());
            batch_merge(&main, &secondaries, &output, &options)?;
        }
        Commands::Combine {
            primary,
            secondary,
            output,
        } => combine(&primary, &secondary, &output)?,
        Commands::Completions { shell } => {
            shell.generate(&mut Cli::command(), &mut std::io::stdout());
        }
    }
    Ok(())
}
