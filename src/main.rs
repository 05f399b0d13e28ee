use anyhow::{anyhow, bail, Context, Result};
use liftscope::{
    ingest,
    progression::{progression, ProgressionPoint},
    search::{fuzzy_search_names, MatchResult},
    table::{Lift, Unit},
    LoadOptions,
};
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_SAMPLE: &str = "data/sample.csv";
const DEFAULT_LIMIT: usize = 12;

const USAGE: &str = "\
Usage: liftscope [--path CSV | --url URL] [--config YAML] [--query NAME]
                 [--limit N] [--lifter NAME] [--lifts squat,bench,deadlift,total]
                 [--unit kg|lb] [--nrows N] [--refresh] [--json]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    path: Option<PathBuf>,
    url: Option<String>,
    query: Option<String>,
    limit: Option<usize>,
    lifter: Option<String>,
    lifts: Option<Vec<Lift>>,
    unit: Option<Unit>,
    nrows: Option<usize>,
    refresh: bool,
    json: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut it = args.into_iter();
    while let Some(flag) = it.next() {
        let mut value = || {
            it.next()
                .ok_or_else(|| anyhow!("{} needs a value\n{}", flag, USAGE))
        };
        match flag.as_str() {
            "--config" => out.config = Some(value()?.into()),
            "--path" => out.path = Some(value()?.into()),
            "--url" => out.url = Some(value()?),
            "--query" => out.query = Some(value()?),
            "--lifter" => out.lifter = Some(value()?),
            "--limit" => out.limit = Some(value()?.parse().context("--limit")?),
            "--nrows" => out.nrows = Some(value()?.parse().context("--nrows")?),
            "--unit" => {
                let v = value()?;
                let unit = Unit::parse(&v).ok_or_else(|| anyhow!("unknown unit {:?}", v))?;
                out.unit = Some(unit);
            }
            "--lifts" => {
                let v = value()?;
                let lifts = v
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| Lift::parse(s).ok_or_else(|| anyhow!("unknown lift {:?}", s)))
                    .collect::<Result<Vec<_>>>()?;
                out.lifts = Some(lifts);
            }
            "--refresh" => out.refresh = true,
            "--json" => out.json = true,
            "-h" | "--help" => bail!("{}", USAGE),
            other => bail!("unknown argument {:?}\n{}", other, USAGE),
        }
    }
    Ok(out)
}

impl CliArgs {
    /// Config file (if any), then flags on top, then the bundled sample
    /// when no source is left.
    fn load_options(&self) -> Result<LoadOptions> {
        let mut opts = match &self.config {
            Some(p) => LoadOptions::from_yaml_file(p)?,
            None => LoadOptions::default(),
        };
        if let Some(p) = &self.path {
            opts.csv_path = Some(p.clone());
        }
        if let Some(u) = &self.url {
            opts.csv_url = Some(u.clone());
            if self.path.is_none() {
                opts.csv_path = None;
            }
        }
        if self.nrows.is_some() {
            opts.nrows = self.nrows;
        }
        opts.refresh |= self.refresh;
        if opts.csv_path.is_none() && opts.csv_url.is_none() {
            opts.csv_path = Some(PathBuf::from(DEFAULT_SAMPLE));
        }
        Ok(opts)
    }
}

#[derive(Serialize)]
struct Report {
    rows: usize,
    matches: Vec<MatchResult>,
    lifter: Option<String>,
    unit: Unit,
    progression: Vec<ProgressionPoint>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) args + options ───────────────────────────────────────────
    let args = parse_args(std::env::args().skip(1))?;
    let opts = args.load_options()?;

    // ─── 3) load (cache, fetch, normalize) ───────────────────────────
    let start = Instant::now();
    let client = Client::new();
    let table = ingest::load_dataset(&client, &opts).await?;
    info!(rows = table.len(), elapsed = ?start.elapsed(), "loaded");

    // ─── 4) search + progression ─────────────────────────────────────
    let matches = match &args.query {
        Some(q) => fuzzy_search_names(&table, q, args.limit.unwrap_or(DEFAULT_LIMIT)),
        None => Vec::new(),
    };
    let lifter = args
        .lifter
        .clone()
        .or_else(|| matches.first().map(|m| m.identity.clone()));
    let unit = args.unit.unwrap_or(Unit::Kg);
    let lifts = args
        .lifts
        .clone()
        .unwrap_or_else(|| vec![Lift::Squat, Lift::Bench, Lift::Deadlift]);
    let points = lifter
        .as_deref()
        .map(|name| progression(&table, name, &lifts, unit))
        .unwrap_or_default();

    let report = Report {
        rows: table.len(),
        matches,
        lifter,
        unit,
        progression: points,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("Rows: {}", report.rows);
    if !report.matches.is_empty() {
        println!("Top matches:");
        for m in &report.matches {
            println!("  {:<32} {:>3}", m.identity, m.score);
        }
    }
    match &report.lifter {
        None => println!("No lifter selected; pass --query or --lifter."),
        Some(name) if report.progression.is_empty() => {
            println!("No dated lift values for {}", name)
        }
        Some(name) => {
            println!("{}: progression ({})", name, report.unit.as_str());
            for p in &report.progression {
                println!(
                    "  {}  {:<8} {:>8.2}  {:<8} {}",
                    p.date,
                    p.lift.as_str(),
                    p.weight,
                    p.federation,
                    p.meet.as_deref().unwrap_or("")
                );
            }
        }
    }
}
