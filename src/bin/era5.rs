use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use era5_cds::{Block, Client, DateValue, Era5, Product, Settings, DEFAULT_BLOCK};

/// Download ERA5 reanalysis data from the Copernicus Climate Data Store.
#[derive(Parser, Debug)]
#[command(name = "era5", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    product: ProductCmd,
}

#[derive(Subcommand, Debug)]
enum ProductCmd {
    /// Model levels (137 levels, GRIB parameters z/t/q/u/v/w/lnsp)
    Ml(Opts),
    /// Pressure levels (37 levels, 1-1000 hPa)
    Pl(Opts),
    /// Single levels (surface fields)
    Sfc(Opts),
}

impl ProductCmd {
    fn split(self) -> (Product, Opts) {
        match self {
            ProductCmd::Ml(o) => (Product::Ml, o),
            ProductCmd::Pl(o) => (Product::Pl, o),
            ProductCmd::Sfc(o) => (Product::Sfc, o),
        }
    }
}

#[derive(Args, Debug)]
struct Opts {
    /// Longitude range
    #[arg(short = 'x', long, num_args = 2, value_names = ["LONMIN", "LONMAX"], allow_negative_numbers = true)]
    lon: Option<Vec<f64>>,

    /// Latitude range
    #[arg(short = 'y', long, num_args = 2, value_names = ["LATMIN", "LATMAX"], allow_negative_numbers = true)]
    lat: Option<Vec<f64>>,

    /// Spatial resolution in degrees (0.25, 0.5 or 1.0)
    #[arg(short, long, value_name = "RESOLUTION")]
    res: Option<f64>,

    /// Temporal resolution in hours
    #[arg(short, long)]
    step: Option<u32>,

    /// Date range as YYYYMMDD (or YYYY-MM-DD)
    #[arg(short, long, num_args = 1..=2, value_names = ["START_DATE", "END_DATE"])]
    date: Option<Vec<String>>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Block in the configuration file
    #[arg(short, long)]
    block: Option<String>,

    /// Output file (defaults to era5.<product>.<start>-<end>.nc)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long)]
    verbose: bool,

    /// Print the request instead of submitting it
    #[arg(long)]
    dry_run: bool,
}

impl Opts {
    fn to_block(&self) -> Block {
        Block {
            lon: self.lon.as_deref().map(|v| [v[0], v[1]]),
            lat: self.lat.as_deref().map(|v| [v[0], v[1]]),
            res: self.res,
            step: self.step,
            date: self
                .date
                .clone()
                .map(|ds| ds.into_iter().map(DateValue::Str).collect()),
            verbose: self.verbose.then_some(true),
            output: self.output.clone(),
        }
    }

    /// Command line over the selected config block.
    fn settings(&self) -> Result<Block> {
        let cli = self.to_block();
        let Some(path) = &self.input else {
            if self.block.is_some() {
                bail!("--block requires --input");
            }
            return Ok(cli);
        };

        let settings = Settings::from_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        let name = self.block.as_deref().unwrap_or(DEFAULT_BLOCK);
        let file = settings.block(name)?.clone();
        Ok(cli.or(file))
    }
}

/// Log level when `RUST_LOG` is unset; `verbose` from either the command line
/// or the config block raises it to `info`.
fn default_level(block: &Block) -> &'static str {
    if block.verbose.unwrap_or(false) {
        "info"
    } else {
        "warn"
    }
}

fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(product: Product, opts: &Opts, block: Block) -> Result<()> {
    let query = block.to_query().context("invalid request parameters")?;

    let mut era5 = Era5::new(product, query);
    if let Some(output) = block.output {
        era5 = era5.with_output(output);
    }

    if opts.dry_run {
        let retrieval = era5.retrieval()?;
        println!("{}", serde_json::to_string_pretty(&retrieval)?);
        return Ok(());
    }

    let client = Client::from_env()?;
    let result = era5.retrieve(&client)?;
    info!(job_id = ?result.job_id, "retrieval complete");
    println!(
        "Downloaded {bytes} bytes to {target}",
        bytes = result.size_bytes,
        target = result.target.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (product, opts) = cli.product.split();
    let settings = opts.settings();
    let level = match &settings {
        Ok(block) => default_level(block),
        Err(_) if opts.verbose => "info",
        Err(_) => "warn",
    };
    init_tracing(level);

    match settings.and_then(|block| run(product, &opts, block)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (Product, Opts) {
        Cli::try_parse_from(args).unwrap().product.split()
    }

    #[test]
    fn parses_product_subcommands() {
        let (p, o) = parse(&[
            "era5", "sfc", "-x", "-10", "10", "-y", "30", "40", "-d", "20200101", "20200102",
            "-r", "0.5", "-s", "3",
        ]);
        assert_eq!(p, Product::Sfc);
        let q = o.settings().unwrap().to_query().unwrap();
        assert_eq!(q.lon, [-10.0, 10.0]);
        assert_eq!(q.res, 0.5);
        assert_eq!(q.step, 3);
    }

    #[test]
    fn block_without_input_is_rejected() {
        let (_, o) = parse(&["era5", "ml", "-b", "etna"]);
        assert!(o.settings().is_err());
    }

    #[test]
    fn command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("era5.toml");
        std::fs::write(
            &path,
            "[etna]\nlon = [14.0, 16.0]\nlat = [37.0, 38.5]\nstep = 6\ndate = [\"20181224\"]\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let (_, o) = parse(&["era5", "pl", "-i", path, "-b", "etna", "-s", "12"]);
        let block = o.settings().unwrap();
        let q = block.to_query().unwrap();
        assert_eq!(q.step, 12);
        assert_eq!(q.lat, [37.0, 38.5]);
    }

    #[test]
    fn rejects_three_longitudes() {
        assert!(Cli::try_parse_from(["era5", "ml", "-x", "1", "2", "3"]).is_err());
    }

    #[test]
    fn verbose_from_config_file_raises_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("era5.toml");
        std::fs::write(
            &path,
            "[era5]\nlon = [0.0, 1.0]\nlat = [0.0, 1.0]\ndate = [\"20200101\"]\nverbose = true\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let (_, o) = parse(&["era5", "sfc", "-i", path]);
        assert!(!o.verbose);
        let block = o.settings().unwrap();
        assert_eq!(default_level(&block), "info");
        assert!(block.to_query().unwrap().verbose);

        let (_, quiet) = parse(&["era5", "sfc", "-x", "0", "1", "-y", "0", "1", "-d", "20200101"]);
        assert_eq!(default_level(&quiet.settings().unwrap()), "warn");
    }
}
