//! # CLI Module
//!
//! Command-line interface for the music deduplicator.
//!
//! ## Usage
//! ```bash
//! # Move byte-identical copies aside (simulated unless --no-simulate)
//! mud dedup ~/Music --target /var/tmp/dups --no-simulate
//!
//! # Fingerprint workflow on the primary instance
//! mud scan
//! mud build-collection
//! mud print-duplicates --output json
//!
//! # Re-evaluate instance 0's duplicates with instance 1's recognizer
//! mud forward --instance 1
//! mud build-collection --instance 1
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use mud::config::MudConfig;
use mud::core::catalog::{CatalogBackend, CatalogStats, SqliteCatalog};
use mud::core::collection::FingerprintCollectionBuilder;
use mud::core::comparator::{AlbumCandidates, AlbumInferencer, DuplicateGroup, DuplicateGrouper};
use mud::core::exact::ExactDuplicateScanner;
use mud::core::pipeline::{
    CandidateForwarder, fill_candidates, producer_command, source_instance_for,
};
use mud::core::relocate::{RelocateReport, Relocator};
use mud::core::scanner::{MediaFilter, ScanConfig, TreeWalker, list_extensions};
use mud::error::Result;
use mud::events::{
    Event, EventChannel, EventReceiver, FingerprintEvent, ForwardEvent, HashEvent, RelocateEvent,
    ScanEvent,
};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// mud - find duplicate music, by content and by sound
#[derive(Parser, Debug)]
#[command(name = "mud")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/mud/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging; for dedup, also list every identical group
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move byte-identical duplicates out of a tree
    Dedup {
        /// Tree to deduplicate
        root: PathBuf,

        /// Where duplicates go (default: duplicates_target from config)
        #[arg(long)]
        target: Option<PathBuf>,

        /// Actually move files; without this nothing is changed
        #[arg(long)]
        no_simulate: bool,
    },

    /// Register new media files in the primary catalog
    Scan {
        #[arg(short, long, default_value_t = 0)]
        instance: usize,
    },

    /// Fingerprint every unresolved file
    BuildCollection {
        #[arg(short, long, default_value_t = 0)]
        instance: usize,
    },

    /// Forget catalog entries whose file no longer exists
    CheckFiles {
        #[arg(short, long, default_value_t = 0)]
        instance: usize,
    },

    /// List files that share a fingerprint identity
    PrintDuplicates {
        #[arg(short, long, default_value_t = 0)]
        instance: usize,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// List directories that look like duplicate albums
    PrintDuplicateAlbums {
        #[arg(short, long, default_value_t = 0)]
        instance: usize,

        /// Shared duplicate tracks needed before a directory is reported
        #[arg(short, long, default_value_t = mud::core::comparator::DEFAULT_ALBUM_THRESHOLD)]
        threshold: usize,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show catalog counts
    PrintStats {
        #[arg(short, long, default_value_t = 0)]
        instance: usize,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Copy the previous instance's duplicate candidates into this instance
    Forward {
        /// Target instance (1 or higher)
        #[arg(short, long)]
        instance: usize,
    },

    /// List the distinct file endings below a directory
    ListExtensions {
        root: PathBuf,
    },

    /// Move every file with the given endings into another tree
    RelocateByExtension {
        root: PathBuf,

        target: PathBuf,

        /// File ending to move (repeatable, case-insensitive)
        #[arg(long = "ext", required = true)]
        extensions: Vec<String>,

        /// Report what would move without moving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Write an instance's duplicate groups to stdout (used by `forward`)
    #[command(hide = true)]
    FillCandidates {
        #[arg(long)]
        instance: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    mud::init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Dedup {
            root,
            target,
            no_simulate,
        } => {
            let target = match target {
                Some(target) => target,
                None => load_config(config_path)?.duplicates_target,
            };
            run_dedup(&root, &target, !no_simulate, cli.verbose)
        }
        Commands::Scan { instance } => run_scan(&load_config(config_path)?, instance),
        Commands::BuildCollection { instance } => {
            run_build_collection(&load_config(config_path)?, instance)
        }
        Commands::CheckFiles { instance } => run_check_files(&load_config(config_path)?, instance),
        Commands::PrintDuplicates { instance, output } => {
            run_print_duplicates(&load_config(config_path)?, instance, output)
        }
        Commands::PrintDuplicateAlbums {
            instance,
            threshold,
            output,
        } => run_print_albums(&load_config(config_path)?, instance, threshold, output),
        Commands::PrintStats { instance, output } => {
            run_print_stats(&load_config(config_path)?, instance, output)
        }
        Commands::Forward { instance } => {
            run_forward(&load_config(config_path)?, config_path, instance)
        }
        Commands::ListExtensions { root } => run_list_extensions(&root),
        Commands::RelocateByExtension {
            root,
            target,
            extensions,
            dry_run,
        } => run_relocate_by_extension(&root, &target, &extensions, dry_run),
        Commands::FillCandidates { instance } => {
            run_fill_candidates(&load_config(config_path)?, instance)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MudConfig> {
    Ok(MudConfig::load_or_default(path)?)
}

fn open_catalog(config: &MudConfig, instance: usize) -> Result<SqliteCatalog> {
    let path = config.database_path(instance)?;
    Ok(SqliteCatalog::open(&path)?)
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb
}

/// Drive a progress bar from engine events until the sender is dropped
fn spawn_progress(receiver: EventReceiver, verbose: bool) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let pb = progress_bar();
        for event in receiver.iter() {
            match event {
                Event::Scan(ScanEvent::Started { root }) => {
                    pb.set_message(format!("Walking {}", root.display()));
                }
                Event::Hash(HashEvent::Started { total_files }) => {
                    pb.set_length(total_files as u64);
                    pb.set_position(0);
                    pb.set_message("Hashing");
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(file_name(&p.current_path));
                    }
                }
                Event::Hash(HashEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Fingerprint(FingerprintEvent::Started { total_files }) => {
                    pb.set_length(total_files as u64);
                    pb.set_position(0);
                    pb.set_message("Fingerprinting");
                }
                Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(file_name(&p.current_path));
                    }
                }
                Event::Fingerprint(FingerprintEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Forward(ForwardEvent::ProducerStarted { source_instance }) => {
                    pb.set_message(format!("Receiving candidates from instance {}", source_instance));
                }
                Event::Forward(ForwardEvent::GroupReceived { .. }) => pb.inc(1),
                Event::Forward(ForwardEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Relocate(RelocateEvent::Failed { path, message }) => {
                    pb.println(format!("{} {}: {}", style("!").red(), path.display(), message));
                }
                _ => {}
            }
        }
        pb.finish_and_clear();
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn run_dedup(root: &Path, target: &Path, dry_run: bool, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    let (sender, receiver) = EventChannel::new();
    let progress = spawn_progress(receiver, verbose);

    let scanner = ExactDuplicateScanner::default().report_groups(verbose);
    let scan = scanner.scan_with_events(root, &sender);
    let scan = match scan {
        Ok(scan) => scan,
        Err(e) => {
            drop(sender);
            progress.join().ok();
            return Err(e.into());
        }
    };

    let relocator = Relocator::new(root, target).dry_run(dry_run);
    let report = relocator.relocate_with_events(&scan.duplicates, &sender);
    let removed = relocator.remove_empty_dirs_with_events(&scan.directories, &sender);

    drop(sender);
    progress.join().ok();

    print_relocate_report(&report, dry_run);

    term.write_line(&format!(
        "{} {} files hashed, {} duplicates, {} unreadable, {} empty directories removed",
        style("✓").green().bold(),
        style(scan.files_hashed).cyan(),
        style(scan.duplicates.len()).cyan(),
        style(scan.unreadable.len()).yellow(),
        removed
    ))
    .ok();
    if dry_run && !scan.duplicates.is_empty() {
        term.write_line(&format!(
            "{}",
            style("Simulation only. Re-run with --no-simulate to move files.").dim()
        ))
        .ok();
    }
    Ok(())
}

fn print_relocate_report(report: &RelocateReport, dry_run: bool) {
    let verb = if dry_run { "Would move" } else { "Moved" };
    for (from, to) in &report.moved {
        println!("{} {} to {}", verb, from.display(), to.display());
    }
    for error in &report.errors {
        eprintln!("{} {}", style("Failed:").red(), error);
    }
}

fn run_scan(config: &MudConfig, instance: usize) -> Result<()> {
    let catalog = open_catalog(config, instance)?;
    let builder = FingerprintCollectionBuilder::new(instance, &catalog).filter(config.media_filter());

    let summary = builder.scan(&config.media_root)?;

    for error in &summary.errors {
        eprintln!("{} {}", style("Skipped:").yellow(), error);
    }
    println!(
        "{} media files, {} new",
        summary.media_files, summary.inserted
    );
    Ok(())
}

fn run_build_collection(config: &MudConfig, instance: usize) -> Result<()> {
    let recognizer = config.instance(instance)?.recognizer.recognizer();
    let catalog = open_catalog(config, instance)?;
    let builder = FingerprintCollectionBuilder::new(instance, &catalog).filter(config.media_filter());

    let (sender, receiver) = EventChannel::new();
    let progress = spawn_progress(receiver, false);
    let result = builder.build_collection_with_events(&recognizer, &sender);
    drop(sender);
    progress.join().ok();

    let summary = result?;
    println!(
        "{} identified, {} no match, {} could not decode",
        summary.identified, summary.no_match, summary.could_not_decode
    );
    Ok(())
}

fn run_check_files(config: &MudConfig, instance: usize) -> Result<()> {
    let catalog = open_catalog(config, instance)?;
    let builder = FingerprintCollectionBuilder::new(instance, &catalog);

    for path in builder.check_files_exist()? {
        println!("Deleted {} from catalog", path.display());
    }
    Ok(())
}

fn run_print_duplicates(config: &MudConfig, instance: usize, output: OutputFormat) -> Result<()> {
    let catalog = open_catalog(config, instance)?;
    let groups: Vec<DuplicateGroup> = DuplicateGrouper::new(&catalog).duplicate_groups()?.collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match output {
        OutputFormat::Pretty => write_pretty_groups(&mut out, &groups)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &groups).map_err(io::Error::from)?;
            writeln!(out)?;
        }
        OutputFormat::Minimal => {
            for group in &groups {
                for path in group.paths().skip(1) {
                    writeln!(out, "{}", path.display())?;
                }
            }
        }
    }
    Ok(())
}

fn write_pretty_groups<W: Write>(out: &mut W, groups: &[DuplicateGroup]) -> io::Result<()> {
    if groups.is_empty() {
        return writeln!(out, "No duplicates found");
    }
    for group in groups {
        writeln!(out)?;
        for record in &group.records {
            writeln!(out, "{} - {}", record.title, record.path.display())?;
        }
    }
    Ok(())
}

fn run_print_albums(
    config: &MudConfig,
    instance: usize,
    threshold: usize,
    output: OutputFormat,
) -> Result<()> {
    let catalog = open_catalog(config, instance)?;
    let groups = DuplicateGrouper::new(&catalog).duplicate_groups()?;
    let albums = AlbumInferencer::new(threshold).duplicate_albums(groups);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match output {
        OutputFormat::Pretty => write_pretty_albums(&mut out, &albums)?,
        OutputFormat::Json => {
            // JSON object keys must be text
            let readable: BTreeMap<String, Vec<String>> = albums
                .iter()
                .map(|(anchor, siblings)| {
                    (
                        anchor.to_string_lossy().into_owned(),
                        siblings.iter().map(|s| s.to_string_lossy().into_owned()).collect(),
                    )
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &readable).map_err(io::Error::from)?;
            writeln!(out)?;
        }
        OutputFormat::Minimal => {
            for anchor in albums.keys() {
                writeln!(out, "{}", anchor.display())?;
            }
        }
    }
    Ok(())
}

fn write_pretty_albums<W: Write>(out: &mut W, albums: &AlbumCandidates) -> io::Result<()> {
    if albums.is_empty() {
        return writeln!(out, "No duplicate albums found");
    }
    for (anchor, siblings) in albums {
        writeln!(out)?;
        writeln!(out, "{}", anchor.display())?;
        for sibling in siblings {
            writeln!(out, "  = {}", sibling.display())?;
        }
    }
    Ok(())
}

fn run_print_stats(config: &MudConfig, instance: usize, output: OutputFormat) -> Result<()> {
    let catalog = open_catalog(config, instance)?;
    let stats = catalog.stats()?;

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).map_err(io::Error::from)?
            );
        }
        OutputFormat::Pretty | OutputFormat::Minimal => print_stats(instance, &stats),
    }
    Ok(())
}

fn print_stats(instance: usize, stats: &CatalogStats) {
    println!("{}", style(format!("Instance {}", instance)).bold());
    println!("  {} files", style(stats.total).cyan());
    println!("  {} identified", style(stats.resolved).green());
    println!("  {} unresolved", style(stats.unresolved).yellow());
    println!("    {} could not decode", stats.could_not_decode);
    println!("    {} no match", stats.no_match);
}

fn run_forward(config: &MudConfig, config_path: Option<&Path>, instance: usize) -> Result<()> {
    let source = source_instance_for(instance, config.instances.len())?;
    let catalog = open_catalog(config, instance)?;

    let exe = std::env::current_exe()?;
    let producer = producer_command(&exe, config_path, source);

    let forwarder = CandidateForwarder::new(&catalog, source)
        .queue_capacity(config.pipeline.queue_capacity)
        .receive_timeout(config.pipeline.receive_timeout());

    let (sender, receiver) = EventChannel::new();
    let progress = spawn_progress(receiver, false);
    let result = forwarder.forward_with_events(producer, &sender);
    drop(sender);
    progress.join().ok();

    let report = result?;
    println!(
        "Forwarded {} paths in {} groups from instance {} to instance {} ({} new)",
        report.paths_forwarded, report.groups, source, instance, report.inserted
    );
    Ok(())
}

fn run_fill_candidates(config: &MudConfig, instance: usize) -> Result<()> {
    let catalog = open_catalog(config, instance)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    fill_candidates(&catalog, &mut out)?;
    Ok(())
}

fn run_list_extensions(root: &Path) -> Result<()> {
    let walker = TreeWalker::new(ScanConfig::default());
    for extension in list_extensions(&walker, root)? {
        println!("{}", extension);
    }
    Ok(())
}

fn run_relocate_by_extension(
    root: &Path,
    target: &Path,
    extensions: &[String],
    dry_run: bool,
) -> Result<()> {
    let listing = TreeWalker::new(ScanConfig::default()).walk(root)?;
    let filter = MediaFilter::with_extensions(extensions);
    let matching: Vec<PathBuf> = listing
        .files
        .into_iter()
        .filter(|p| filter.should_include(p))
        .collect();

    let relocator = Relocator::new(root, target).dry_run(dry_run);
    let report = relocator.relocate(&matching);
    let removed = relocator.remove_empty_dirs(&listing.directories);

    print_relocate_report(&report, dry_run);
    eprintln!(
        "{} files matched, {} failed, {} empty directories removed",
        matching.len(),
        report.errors.len(),
        removed
    );
    Ok(())
}
