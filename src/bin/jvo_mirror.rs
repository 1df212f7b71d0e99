use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use jvo_mirror::app::{Mirror, MirrorOptions, Reporter, SilentReporter};
use jvo_mirror::archive::ArchiveHttpClient;
use jvo_mirror::config::{ConfigLoader, ProjectRequest, ResolvedConfig};
use jvo_mirror::domain::ProjectCode;
use jvo_mirror::error::MirrorError;
use jvo_mirror::links::DEFAULT_PAGE_LIMIT;
use jvo_mirror::output::{ConsoleReporter, JsonOutput, print_records, print_summary};
use jvo_mirror::store::MirrorStore;

#[derive(Parser)]
#[command(name = "jvo-mirror")]
#[command(about = "Mirror JVO ALMA FITS Archive project holdings to local storage")]
#[command(version, author)]
struct Cli {
    /// Emit machine-readable JSON instead of per-item console lines.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress per-item status lines.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch thumbnails and data files for a project")]
    Fetch(FetchArgs),
    #[command(about = "List the extracted dataset records without downloading")]
    List(ListArgs),
}

#[derive(Args, Clone)]
struct FetchArgs {
    /// ALMA project code, e.g. 2017.1.01310.S. Omit to read
    /// jvo-mirror.json.
    project: Option<String>,

    #[arg(long)]
    config: Option<String>,

    /// Destination root; defaults to the current directory.
    #[arg(long)]
    dest: Option<Utf8PathBuf>,

    #[arg(long, conflicts_with = "files_only")]
    images_only: bool,

    #[arg(long, conflicts_with = "images_only")]
    files_only: bool,

    /// Listing page size; wins over the config value when both are
    /// given.
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Args)]
struct ListArgs {
    project: String,

    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: u32,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(mirror) = report.downcast_ref::<MirrorError>() {
            return ExitCode::from(map_exit_code(mirror));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MirrorError) -> u8 {
    match error {
        MirrorError::MissingTable(_) | MirrorError::MissingConfig => 2,
        MirrorError::ArchiveHttp(_) | MirrorError::ArchiveStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let quiet = cli.quiet;

    match cli.command {
        Some(Commands::Fetch(args)) => run_fetch(args, json, quiet),
        Some(Commands::List(args)) => run_list(args, json),
        None => run_fetch(
            FetchArgs {
                project: None,
                config: None,
                dest: None,
                images_only: false,
                files_only: false,
                limit: None,
            },
            json,
            quiet,
        ),
    }
}

fn run_fetch(args: FetchArgs, json: bool, quiet: bool) -> miette::Result<()> {
    let images = !args.files_only;
    let files = !args.images_only;

    let (requests, config_dest, config_limit) = match &args.project {
        Some(project) => {
            let code: ProjectCode = project.parse().into_diagnostic()?;
            (vec![ProjectRequest { code, images, files }], None, None)
        }
        None => {
            let resolved: ResolvedConfig =
                ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
            (resolved.projects, resolved.dest, Some(resolved.limit))
        }
    };

    let limit = resolve_limit(args.limit, config_limit);
    let dest = args.dest.or(config_dest);
    let store = MirrorStore::new(dest).into_diagnostic()?;
    let client = ArchiveHttpClient::new().into_diagnostic()?;
    let mirror = Mirror::new(store, client);

    let reporter: Box<dyn Reporter> = if json {
        Box::new(JsonOutput)
    } else if quiet {
        Box::new(SilentReporter)
    } else {
        Box::new(ConsoleReporter)
    };

    for request in requests {
        let options = MirrorOptions {
            images: images && request.images,
            files: files && request.files,
            limit,
        };
        let summary = mirror
            .mirror(&request.code, options, reporter.as_ref())
            .into_diagnostic()?;
        if json {
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        } else if !quiet {
            print_summary(&summary);
        }
    }

    Ok(())
}

/// One resolution rule for the page limit: explicit flag, then config
/// value, then the portal default.
fn resolve_limit(cli: Option<u32>, config: Option<u32>) -> u32 {
    cli.or(config).unwrap_or(DEFAULT_PAGE_LIMIT)
}

fn run_list(args: ListArgs, json: bool) -> miette::Result<()> {
    let code: ProjectCode = args.project.parse().into_diagnostic()?;
    let store = MirrorStore::new(None).into_diagnostic()?;
    let client = ArchiveHttpClient::new().into_diagnostic()?;
    let mirror = Mirror::new(store, client);

    let records = mirror.fetch_records(&code, args.limit).into_diagnostic()?;
    if json {
        JsonOutput::print_records(&records).into_diagnostic()?;
    } else {
        print_records(&records);
    }
    Ok(())
}
