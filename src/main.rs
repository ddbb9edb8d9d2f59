use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn};

use droidlint::baseline::Baseline;
use droidlint::config::Config;
use droidlint::fix::FixApplier;
use droidlint::lint::{all_issues, find_issue, Incident, LintDriver};
use droidlint::project::Project;
use droidlint::report::{ReportFormat, Reporter};
use droidlint::watch::ProjectWatcher;

/// droidlint - Fast lint checks for Android resources, manifests and sources
#[derive(Parser, Debug)]
#[command(name = "droidlint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to lint
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target directories to lint (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Only check these issue ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    check: Vec<String>,

    /// Never report these issue ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print quick-fix diffs after the report
    #[arg(long)]
    show_fixes: bool,

    /// Apply quick fixes to the project files
    #[arg(long)]
    apply_fixes: bool,

    /// Choose each fix interactively
    #[arg(long, requires = "apply_fixes")]
    interactive: bool,

    /// Show the fixes that would be applied without writing files
    #[arg(long, requires = "apply_fixes")]
    dry_run: bool,

    /// Baseline file; incidents recorded in it are not reported
    #[arg(long, value_name = "FILE")]
    baseline: Option<PathBuf>,

    /// Write a baseline file from the current incidents
    #[arg(long, value_name = "FILE")]
    generate_baseline: Option<PathBuf>,

    /// Only report incidents in this project-relative file
    #[arg(long, value_name = "FILE")]
    incremental: Option<PathBuf>,

    /// Re-run lint whenever project files change
    #[arg(long)]
    watch: bool,

    /// List every issue and exit
    #[arg(long)]
    list_issues: bool,

    /// Exit with status 0 even when errors are reported
    #[arg(long)]
    exit_zero: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
    Sarif,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Sarif => ReportFormat::Sarif,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    info!("droidlint v{}", env!("CARGO_PKG_VERSION"));

    if cli.list_issues {
        list_issues();
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;

    if cli.watch {
        run_watch_mode(&config, &cli)?;
        return Ok(ExitCode::SUCCESS);
    }

    let errors = run_lint(&config, &cli)?;
    if errors > 0 && !cli.exit_zero {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_default_locations(&cli.path)?,
    };

    if !cli.target.is_empty() {
        config.targets = cli.target.clone();
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    if !cli.check.is_empty() {
        config.check = cli.check.clone();
    }
    config.disable.extend(cli.disable.iter().cloned());
    if let Some(format) = cli.format {
        config.report.format = match format {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Sarif => "sarif",
        }
        .to_string();
    }
    config.report.show_fixes |= cli.show_fixes;

    for id in config.check.iter().chain(&config.disable).chain(config.severity.keys()) {
        if find_issue(id).is_none() {
            warn!("Unknown issue id: {}", id);
        }
    }

    Ok(config)
}

fn list_issues() {
    for issue in all_issues() {
        println!(
            "{} {:<8} {:<12} {}",
            format!("{:<28}", issue.id).bold(),
            issue.severity.label(),
            issue.category.as_str(),
            issue.brief
        );
    }
}

/// Lint the project once and return the number of errors reported
fn run_lint(config: &Config, cli: &Cli) -> Result<usize> {
    use indicatif::{ProgressBar, ProgressStyle};

    let start_time = Instant::now();

    let spinner = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .into_diagnostic()?,
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    spinner.set_message("Reading project files...");
    let project = Project::load(&cli.path, config)?;
    if project.files().is_empty() {
        spinner.finish_and_clear();
        if !cli.quiet {
            eprintln!("{}", "No Android project files found.".yellow());
        }
        return Ok(0);
    }

    spinner.set_message(format!("Linting {} files...", project.files().len()));
    let incidents = lint_project(&project, cli)?;
    spinner.finish_and_clear();

    if let Some(path) = &cli.generate_baseline {
        Baseline::from_incidents(&incidents).save(path).into_diagnostic()?;
        eprintln!(
            "{}",
            format!("Baseline with {} incidents written to {}", incidents.len(), path.display()).green()
        );
    }

    let format = ReportFormat::parse(&config.report.format).unwrap_or_default();
    Reporter::new(format, cli.output.clone())
        .with_incremental(cli.incremental.is_some())
        .with_fixes(config.report.show_fixes)
        .report(&project, &incidents)?;

    if cli.apply_fixes {
        let applied = FixApplier::new(cli.interactive, cli.dry_run).apply(&project, &incidents)?;
        if !cli.dry_run {
            eprintln!("{}", format!("Applied {} fixes", applied).green());
        }
    }

    if !cli.quiet {
        eprintln!(
            "{}",
            format!(
                "Linted {} files in {:.2}s",
                project.files().len(),
                start_time.elapsed().as_secs_f64()
            )
            .dimmed()
        );
    }

    Ok(incidents.iter().filter(|i| i.severity.is_error()).count())
}

/// Run the detectors and apply the incremental and baseline filters
fn lint_project(project: &Project, cli: &Cli) -> Result<Vec<Incident>> {
    let mut incidents = LintDriver::new().analyze(project);

    if let Some(file) = &cli.incremental {
        let file = relative_to(&cli.path, file);
        incidents.retain(|i| i.location.file == file);
    }

    if let Some(path) = &cli.baseline {
        let baseline = Baseline::load(path).into_diagnostic()?;
        let stats = baseline.stats(&incidents);
        if !cli.quiet {
            eprintln!("{}", format!("Baseline: {}", stats).cyan());
        }
        incidents = baseline.filter_new(incidents);
    }

    Ok(incidents)
}

/// A path given on the command line, relative to the project root
fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn run_watch_mode(config: &Config, cli: &Cli) -> Result<()> {
    ProjectWatcher::new(config)
        .watch(&cli.path, |_changed| {
            match run_lint(config, cli) {
                Ok(_) => eprintln!("{}", "Waiting for changes...".green()),
                Err(e) => eprintln!("{}: {:?}", "Lint failed".red(), e),
            }
            true
        })
        .into_diagnostic()
}
