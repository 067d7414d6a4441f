mod config;
mod sink;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rlog_engine::{FilterParams, FilterSpec, QueryMode, Session, SourceError};
use rlog_web::WebState;

use crate::config::Settings;
use crate::sink::{ChunkedSink, SinkSummary};

/// rlog - Filter multi-line application logs by level, thread, time and content
#[derive(Parser, Debug)]
#[command(name = "rlog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log files or directories to search
    #[arg(value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,

    /// Keep records at this numeric level
    #[arg(short, long)]
    level: Option<u32>,

    /// Thread name pattern, may be repeated
    #[arg(short, long = "thread", value_name = "PATTERN")]
    threads: Vec<String>,

    /// Earliest timestamp, `YYYY-MM-DD HH:MM:SS[.f]` or `MM-DD HH:MM:SS[.f]`
    #[arg(short, long, value_name = "TIME")]
    start_time: Option<String>,

    /// Latest timestamp, same formats as --start-time
    #[arg(short, long, value_name = "TIME")]
    end_time: Option<String>,

    /// Content pattern, searched anywhere in the record body
    #[arg(short, long, value_name = "PATTERN")]
    content: Option<String>,

    /// File-name pattern; files whose name does not match are skipped
    #[arg(short, long, value_name = "PATTERN")]
    glob: Option<String>,

    /// Serve the query interface instead of writing results to disk
    #[arg(long)]
    web: bool,

    /// Address for the query interface
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Directory receiving result chunks
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Size in bytes after which a new result chunk is started
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<u64>,

    /// Settings file (defaults to ./rlog.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Abort on a malformed timestamp instead of skipping the file
    #[arg(long)]
    strict: bool,

    /// Do not build the file summary index in web mode
    #[arg(long)]
    no_index: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn filter(&self, settings: &Settings) -> Result<FilterSpec> {
        let params = FilterParams {
            level: self.level.map(|level| level.to_string()),
            threads: self.threads.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            content: self.content.clone(),
            source_name: self.source_name(settings),
        };
        Ok(FilterSpec::from_params(&params)?)
    }

    fn source_name(&self, settings: &Settings) -> Option<String> {
        self.glob.clone().or_else(|| settings.glob.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref())?;

    if args.web {
        serve(args, settings).await
    } else {
        let out_dir = args.out_dir.clone().unwrap_or_else(|| settings.out_dir.clone());
        let summary = tokio::task::spawn_blocking(move || export(&args, &settings))
            .await
            .context("export task failed")??;

        eprintln!(
            "Wrote {} records ({} bytes) to {} file(s) in {}",
            summary.records,
            summary.bytes,
            summary.chunks,
            out_dir.display()
        );
        Ok(())
    }
}

/// Write every matching record to chunked result files
fn export(args: &Args, settings: &Settings) -> Result<SinkSummary> {
    let filter = args.filter(settings)?;
    let out_dir = args.out_dir.as_deref().unwrap_or(&settings.out_dir);
    let chunk_size = args.chunk_size.unwrap_or(settings.chunk_size);

    let session = Session::open(args.inputs.clone());
    tracing::info!("searching {} files", session.sources().len());

    let mut sink = ChunkedSink::create(out_dir, chunk_size)
        .with_context(|| format!("preparing {}", out_dir.display()))?;

    for result in session.run(&filter, QueryMode::Unbounded) {
        match result {
            Ok(record) => sink
                .write(&record)
                .with_context(|| format!("writing to {}", out_dir.display()))?,
            Err(err @ SourceError::MalformedTimestamp { .. }) if args.strict => {
                return Err(err.into());
            }
            Err(err) => tracing::warn!("skipping {}: {}", err.source_id().display(), err),
        }
    }

    Ok(sink.finish()?)
}

async fn serve(args: Args, settings: Settings) -> Result<()> {
    // validate the default pattern before serving anything
    let source_name = args.source_name(&settings);
    if let Some(pattern) = &source_name {
        FilterSpec::builder().source_name(pattern.as_str()).build()?;
    }
    let addr = args.listen.unwrap_or(settings.listen);

    let inputs = args.inputs.clone();
    let index = !args.no_index;
    let session = tokio::task::spawn_blocking(move || {
        if index {
            Session::indexed(inputs)
        } else {
            Session::open(inputs)
        }
    })
    .await
    .context("indexing task failed")?;

    tracing::info!(
        "{} sources, {} indexed",
        session.sources().len(),
        session.index().map_or(0, |index| index.len())
    );

    let state = Arc::new(WebState::new(session).with_source_name(source_name));
    eprintln!("Listening on http://{}", addr);

    rlog_web::serve(state, addr, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("rlog").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_parse() {
        let args = args(&["-l", "3", "-t", "main", "-t", "io-.*", "--strict", "logs/"]);
        assert_eq!(args.level, Some(3));
        assert_eq!(args.threads, vec!["main", "io-.*"]);
        assert!(args.strict);
        assert!(!args.web);
        assert_eq!(args.inputs, vec![PathBuf::from("logs/")]);
    }

    #[test]
    fn test_inputs_required() {
        assert!(Args::try_parse_from(["rlog", "-l", "3"]).is_err());
    }

    #[test]
    fn test_cli_glob_overrides_settings() {
        let settings = Settings {
            glob: Some("from-file".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            args(&["-g", "from-cli", "x"]).source_name(&settings).as_deref(),
            Some("from-cli")
        );
        assert_eq!(
            args(&["x"]).source_name(&settings).as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn test_export_writes_matches() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let out = dir.path().join("out");
        fs::create_dir(&logs).unwrap();
        fs::write(
            logs.join("app.log"),
            "[3 main,05-12 10:00:00.0]: keep\n  detail\n[1 main,05-12 10:00:01.0]: drop\n",
        )
        .unwrap();
        fs::write(logs.join("skip.txt"), "[3 main,05-12 10:00:00.0]: other\n").unwrap();

        let args = args(&[
            "-l",
            "3",
            "-g",
            r"\w+\.log$",
            "-o",
            out.to_str().unwrap(),
            logs.to_str().unwrap(),
        ]);
        let summary = export(&args, &Settings::default()).unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(
            fs::read_to_string(out.join("result_0.log")).unwrap(),
            "[3 main,05-12 10:00:00.0]: keep\n  detail\n"
        );
    }

    #[test]
    fn test_malformed_timestamp_skipped_unless_strict() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let out = dir.path().join("out");
        fs::create_dir(&logs).unwrap();
        fs::write(logs.join("a.log"), "[1 t,13-45 10:00:00.0]: bad\n").unwrap();
        fs::write(logs.join("b.log"), "[1 t,05-12 10:00:00.0]: good\n").unwrap();

        let argv = [
            "-s",
            "05-01 00:00:00",
            "-o",
            out.to_str().unwrap(),
            logs.to_str().unwrap(),
        ];
        let summary = export(&args(&argv), &Settings::default()).unwrap();
        assert_eq!(summary.records, 1);

        let strict: Vec<&str> = std::iter::once("--strict").chain(argv).collect();
        assert!(export(&args(&strict), &Settings::default()).is_err());
    }
}
