mod archive;
mod error_formatter;
mod formatter;
mod loader;
mod server;

use anyhow::{Context, Result};
use archive::ArchiveSink;
use clap::{Args, Parser, Subcommand, ValueEnum};
use formatter::Formatter;
use kennwert::serializers::{results_from_json, results_to_json};
use kennwert::store::{MemoryStore, ProcessingRecord, ReferenceStore, ResultKind, ResultSink};
use kennwert::{
    summarize, BatchPurpose, DensitySource, Engine, EngineConfig, ReferenceSnapshot, RunOutput,
    ServiceLifeMatch, DEFAULT_AMORTIZATION_YEARS,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "kennwert")]
#[command(about = "Life-cycle and cost figures for building elements.")]
#[command(
    long_about = "kennwert matches IFC building elements against versioned reference data and computes\nGWP, PENRE and UBP indicators as well as construction costs.\nThe CLI runs single engines, processes batch directories into result archives, or serves the engines over HTTP."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct RefsArgs {
    /// Directory containing the reference tables
    ///
    /// Expected files: environmental.json, material_mappings.json,
    /// service_life.json and cost.json
    #[arg(long = "refs", env = "KENNWERT_REFS", default_value = "refs")]
    refs: PathBuf,
    /// Environmental reference version to compute against (default: the active one)
    #[arg(long = "env-version", env = "KENNWERT_ENV_VERSION")]
    env_version: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DensityArg {
    /// Density on the element's material record
    Material,
    /// Density of the matched reference row
    Reference,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MatchArg {
    /// Classification codes must match exactly
    Exact,
    /// Longest matching code prefix wins
    Prefix,
}

#[derive(Args, Clone)]
struct ConfigArgs {
    /// Where densities for mass-based indicators come from
    #[arg(long, value_enum, default_value = "material")]
    density: DensityArg,
    /// How classification codes are matched against service-life entries
    #[arg(long = "service-life-match", value_enum, default_value = "prefix")]
    service_life_match: MatchArg,
    /// Amortization period when no service-life entry matches
    #[arg(long = "default-years", default_value_t = DEFAULT_AMORTIZATION_YEARS)]
    default_years: u32,
}

impl ConfigArgs {
    fn engine(&self) -> Engine {
        let density = match self.density {
            DensityArg::Material => DensitySource::MaterialRecord,
            DensityArg::Reference => DensitySource::Reference,
        };
        let service_life_match = match self.service_life_match {
            MatchArg::Exact => ServiceLifeMatch::Exact,
            MatchArg::Prefix => ServiceLifeMatch::LongestPrefix,
        };
        Engine::with_config(
            EngineConfig::new()
                .with_density_source(density)
                .with_service_life_match(service_life_match)
                .with_default_amortization_years(self.default_years),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute LCA indicators for an element batch
    ///
    /// Prints the grouped results as JSON, or writes them to --out and
    /// prints a summary table instead.
    Lca {
        /// Element batch file (JSON with an "elements" array)
        elements: PathBuf,
        #[command(flatten)]
        refs: RefsArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// Write results to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compute construction costs for an element batch
    Cost {
        /// Element batch file (JSON with an "elements" array)
        elements: PathBuf,
        #[command(flatten)]
        refs: RefsArgs,
        /// Write results to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Process a batch file or directory with both engines and archive the results
    ///
    /// Each batch yields LCA, cost and combined archives, an error log,
    /// a processing-history entry and a summary report under the output directory.
    Run {
        /// Batch file, or directory scanned recursively for .json files
        input: PathBuf,
        #[command(flatten)]
        refs: RefsArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// Project the results are filed under
        #[arg(short, long, default_value = "default")]
        project: String,
        /// Output directory for archives and reports
        #[arg(short = 'o', long = "out-dir", env = "KENNWERT_OUT", default_value = "results")]
        out_dir: PathBuf,
    },
    /// Summarize a results file written by lca, cost or run
    Summary {
        /// Results file (JSON array of element results)
        results: PathBuf,
    },
    /// List environmental reference versions
    Versions {
        #[command(flatten)]
        refs: RefsArgs,
    },
    /// Start HTTP REST API server (default: localhost:3000)
    ///
    /// API: GET /versions, PUT /versions/{version}/activate,
    /// POST /lca, /cost and /process with an element batch body
    Server {
        #[command(flatten)]
        refs: RefsArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port number to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kennwert=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Lca {
            elements,
            refs,
            config,
            out,
        } => lca_command(elements, refs, config, out.as_deref()),
        Commands::Cost { elements, refs, out } => cost_command(elements, refs, out.as_deref()),
        Commands::Run {
            input,
            refs,
            config,
            project,
            out_dir,
        } => run_command(input, refs, config, project, out_dir),
        Commands::Summary { results } => summary_command(results),
        Commands::Versions { refs } => versions_command(refs),
        Commands::Server {
            refs,
            config,
            host,
            port,
        } => server_command(refs, config, host, *port),
    };

    if let Err(e) = result {
        if let Some(kennwert_err) = e.downcast_ref::<kennwert::KennwertError>() {
            eprintln!("{}", error_formatter::format_error(kennwert_err));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn load_snapshot(refs: &RefsArgs) -> Result<(MemoryStore, ReferenceSnapshot)> {
    let store = loader::load_store(&refs.refs, refs.env_version.as_deref())?;
    let snapshot = store.snapshot()?;
    Ok((store, snapshot))
}

fn emit(output: &RunOutput, title: &str, out: Option<&Path>) -> Result<()> {
    let formatter = Formatter::default();
    eprint!("{}", formatter.format_warnings(&output.warnings));

    match out {
        Some(path) => {
            let json = results_to_json(&output.results)?;
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            print!("{}", formatter.format_summary(title, &summarize(&output.results)));
            println!("Results written to {}", path.display());
        }
        None => println!("{}", results_to_json(&output.results)?),
    }
    Ok(())
}

fn lca_command(elements: &Path, refs: &RefsArgs, config: &ConfigArgs, out: Option<&Path>) -> Result<()> {
    let (_, snapshot) = load_snapshot(refs)?;
    let engine = config.engine();
    let batch = loader::read_batch(&engine, elements, BatchPurpose::Lca)?;
    let output = engine.run_lca(&batch, &snapshot);
    emit(&output, "LCA", out)
}

fn cost_command(elements: &Path, refs: &RefsArgs, out: Option<&Path>) -> Result<()> {
    let (_, snapshot) = load_snapshot(refs)?;
    let engine = Engine::new();
    let batch = loader::read_batch(&engine, elements, BatchPurpose::Cost)?;
    let output = engine.run_cost(&batch, &snapshot);
    emit(&output, "Cost", out)
}

fn run_command(input: &Path, refs: &RefsArgs, config: &ConfigArgs, project: &str, out_dir: &Path) -> Result<()> {
    let (_, snapshot) = load_snapshot(refs)?;
    let engine = config.engine();
    let formatter = Formatter::default();

    let files = loader::batch_files(input, Some(out_dir))?;
    if files.is_empty() {
        anyhow::bail!("No .json batch files found in {}", input.display());
    }

    println!(
        "Processing {} batch file(s) against environmental version {}",
        files.len(),
        snapshot.environmental_version()
    );

    for path in files {
        let started = Instant::now();
        let batch = loader::read_batch(&engine, &path, BatchPurpose::All)?;
        let output = engine.run_all(&batch, &snapshot)?;
        let combined = output.combined();
        let summary = summarize(&combined);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "batch".to_string());
        let sink = ArchiveSink::new(out_dir, stem);
        sink.store_results(project, ResultKind::Lca, &output.lca.results)?;
        sink.store_results(project, ResultKind::Cost, &output.cost.results)?;
        sink.store_results(project, ResultKind::Combined, &combined)?;
        for entry in &summary.failures {
            sink.log_processing_error(project, entry.clone())?;
        }
        sink.record_processing(ProcessingRecord::from_results(
            project,
            output.lca.environmental_version.clone(),
            &combined,
            started.elapsed().as_millis() as u64,
        ))?;

        let mut report = formatter.format_warnings(&output.lca.warnings);
        report.push_str(&formatter.format_summary(&path.display().to_string(), &summary));
        let report_path = sink.write_report(project, &report)?;

        print!("{}", report);
        println!(
            "Archived {} to {}",
            path.display(),
            sink.results_path(project, ResultKind::Combined).display()
        );
        println!("Report written to {}\n", report_path.display());
    }

    Ok(())
}

fn summary_command(results: &Path) -> Result<()> {
    let text = fs::read_to_string(results).with_context(|| format!("Failed to read {}", results.display()))?;
    let results = results_from_json(&text, &results.to_string_lossy())?;
    print!("{}", Formatter::default().format_summary("Summary", &summarize(&results)));
    Ok(())
}

fn versions_command(refs: &RefsArgs) -> Result<()> {
    let store = loader::load_store(&refs.refs, refs.env_version.as_deref())?;
    let formatter = Formatter::default();
    print!("{}", formatter.format_versions(&store.environmental_versions()?));
    eprint!("{}", formatter.format_warnings(&store.reference_warnings()));
    Ok(())
}

fn server_command(refs: &RefsArgs, config: &ConfigArgs, host: &str, port: u16) -> Result<()> {
    let store = loader::load_store(&refs.refs, refs.env_version.as_deref())?;
    let engine = config.engine();

    #[cfg(feature = "server")]
    {
        use tokio::runtime::Runtime;
        let rt = Runtime::new()?;
        rt.block_on(async {
            println!(
                "Starting HTTP server with {} environmental version(s) loaded",
                store.environmental_versions()?.len()
            );
            server::http::start_server(engine, store, host, port).await
        })?;
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (store, engine, host, port);
        eprintln!("Error: Server feature not enabled");
        eprintln!("Recompile with: cargo build --features server");
        std::process::exit(1);
    }

    Ok(())
}
