use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kconfig_indexer::{IndexerError, Manifest, TreeWalker, Workspace};
use kconfig_protocol::{
    response_schema, serialize_json, serialize_json_pretty, ErrorEnvelope, VerificationResult,
    VerifyResponse, RESULT_SCHEMA_VERSION,
};
use kconfig_search::{EngineConfig, KnowledgeBase, SearchError, Verifier};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod report;

/// Environment fallback for `--workspace`
pub const ROOT_ENV: &str = "KCONFIG_FINDER_ROOT";

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "kconfig-finder")]
#[command(about = "Verify Kconfig symbols against an nRF Connect SDK workspace", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether configuration symbols exist in the workspace
    Verify(VerifyArgs),

    /// List definition files covered by the priority index
    #[command(name = "list-files")]
    ListFiles(ListFilesArgs),

    /// Print the JSON schema of the `verify --json` response
    Schema,
}

#[derive(Args)]
struct EngineArgs {
    /// Workspace root (env: KCONFIG_FINDER_ROOT, default: current directory)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct VerifyArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// West manifest whose project paths widen the documentation fallback
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Extra alternatives table (JSON), merged over the built-in one
    #[arg(long)]
    alternatives: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 1 when any symbol is unavailable
    #[arg(long)]
    strict: bool,

    /// Symbols to verify, with or without the CONFIG_ prefix
    #[arg(required = true, value_name = "SYMBOL")]
    symbols: Vec<String>,
}

#[derive(Args)]
struct ListFilesArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Walk the whole workspace with the exhaustive depth instead
    #[arg(long)]
    exhaustive: bool,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout stays machine-readable in JSON mode
    let json_output = match &cli.command {
        Commands::Verify(args) => args.json,
        Commands::ListFiles(args) => args.json,
        Commands::Schema => true,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Verify(args) => run_verify(args).await,
        Commands::ListFiles(args) => run_list_files(args).await,
        Commands::Schema => print_stdout(&response_schema()?),
    }
}

async fn run_verify(args: VerifyArgs) -> Result<()> {
    let json = args.json;
    let outcome = verify_symbols(&args).await;
    let (root, results) = match outcome {
        Ok(done) => done,
        Err(err) if json => {
            print_stdout(&serialize_json(&error_envelope(&err))?)?;
            std::process::exit(2);
        }
        Err(err) => return Err(err),
    };

    if json {
        let response = VerifyResponse {
            schema_version: RESULT_SCHEMA_VERSION,
            workspace: root.display().to_string(),
            results,
        };
        print_stdout(&serialize_json_pretty(&response)?)?;
        if args.strict && response.results.iter().any(|r| !r.available) {
            std::process::exit(1);
        }
    } else {
        print_stdout(&report::render_results(&results))?;
        if args.strict && results.iter().any(|r| !r.available) {
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn verify_symbols(args: &VerifyArgs) -> Result<(PathBuf, Vec<VerificationResult>)> {
    let root = resolve_root(args.engine.workspace.as_deref())?;
    let mut knowledge = KnowledgeBase::builtin()?;
    if let Some(path) = &args.alternatives {
        knowledge.extend(
            KnowledgeBase::load(path)
                .await
                .with_context(|| format!("Failed to load alternatives {}", path.display()))?,
        );
    }
    let mut verifier = open_verifier(&root, &args.engine, knowledge).await?;

    if let Some(path) = &args.manifest {
        let manifest = Manifest::load(path)
            .await
            .with_context(|| format!("Failed to load manifest {}", path.display()))?;
        log::info!("Manifest lists {} projects", manifest.projects.len());
        verifier = verifier.with_manifest(manifest);
    }

    let verifier = Arc::new(verifier);
    let results = verifier.verify_all(&args.symbols).await?;
    let stats = verifier.stats();
    log::info!(
        "Verified {} symbols ({} fallback tier runs, {} files read)",
        results.len(),
        stats.fallback_invocations(),
        stats.files_read
    );
    Ok((root, results))
}

async fn run_list_files(args: ListFilesArgs) -> Result<()> {
    let root = resolve_root(args.engine.workspace.as_deref())?;
    let verifier = open_verifier(&root, &args.engine, KnowledgeBase::builtin()?).await?;

    let files = if args.exhaustive {
        let walker = TreeWalker::new(verifier.config().exhaustive_walk());
        walker
            .walk_async(verifier.workspace().root().to_path_buf())
            .await
            .files
    } else {
        verifier.definition_index().await.files().to_vec()
    };
    let relative: Vec<String> = files
        .iter()
        .map(|path| verifier.workspace().relative(path))
        .collect();

    if args.json {
        print_stdout(&serialize_json_pretty(&relative)?)?;
    } else {
        for path in &relative {
            print_stdout(path)?;
        }
    }
    Ok(())
}

async fn open_verifier(
    root: &Path,
    engine: &EngineArgs,
    knowledge: KnowledgeBase,
) -> Result<Verifier> {
    let config = match &engine.config {
        Some(path) => EngineConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let workspace = Workspace::open(root)?;
    Ok(Verifier::new(workspace, config, knowledge))
}

/// `--workspace`, then `KCONFIG_FINDER_ROOT`, then the current directory
fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(value) = env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(value));
    }
    env::current_dir().context("Failed to resolve current directory")
}

fn error_envelope(err: &anyhow::Error) -> ErrorEnvelope {
    let indexer = err.downcast_ref::<IndexerError>().or_else(|| {
        match err.downcast_ref::<SearchError>() {
            Some(SearchError::IndexerError(inner)) => Some(inner),
            _ => None,
        }
    });
    let (code, hint) = match (indexer, err.downcast_ref::<SearchError>()) {
        (Some(IndexerError::WorkspaceRootInvalid(_)), _) => (
            "workspace_root_invalid",
            Some(format!("Pass --workspace or set {ROOT_ENV}")),
        ),
        (Some(IndexerError::Manifest(_)), _) => ("manifest_invalid", None),
        (Some(_), _) => ("filesystem", None),
        (None, Some(SearchError::InvalidConfig(_))) => ("config_invalid", None),
        (None, Some(SearchError::KnowledgeBase(_))) => ("knowledge_base_invalid", None),
        _ => ("internal", None),
    };
    ErrorEnvelope {
        code: code.to_string(),
        message: format!("{err:#}"),
        hint,
    }
}
