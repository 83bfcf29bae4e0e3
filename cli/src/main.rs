//! CLI for polite host discovery on a local network
//!
//! Pings every target on a bounded worker pool, then reports the hosts that
//! answered along with their MAC address, vendor, and hostname.
//!
//! # Examples
//!
//! ```bash
//! # help menu
//! quietscan --help
//!
//! # scan the subnet of the default adapter
//! quietscan
//!
//! # scan a range slowly and print json
//! quietscan --targets 192.168.1.10-40 --delay-ms 200 --json
//!
//! # refresh the vendor database
//! quietscan --update-vendors
//! ```
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use itertools::Itertools;
use log::*;
use quietscan_lib::{
    config::{ScanConfig, ScanSettings},
    network,
    scanner::{PoliteScanner, ProgressCallback, ScanResult},
    targets::ips::TargetValidator,
    vendor::{OuiDatabase, oui},
};
use serde::Deserialize;
use std::{
    fs,
    net::Ipv4Addr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

/// Progress is logged every time this many targets complete
const PROGRESS_STEP: usize = 32;

/// Per-source deadline when downloading the vendor registry
const VENDOR_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI for polite host discovery on a local network
struct Args {
    /// Comma separated list of IPs, IP ranges, and CIDR blocks to scan
    #[arg(short, long, use_value_delimiter = true, conflicts_with = "targets_file")]
    targets: Vec<String>,

    /// File with one IP per line to scan ("#" starts a comment)
    #[arg(long)]
    targets_file: Option<PathBuf>,

    /// Choose a specific network adapter for the scan
    #[arg(short, long)]
    interface: Option<String>,

    /// Allow up to 1024 hosts and prefixes broader than /24
    #[arg(long, default_value_t = false)]
    allow_large_ranges: bool,

    /// Maximum number of hosts probed at once (1-128)
    #[arg(long)]
    concurrency: Option<i64>,

    /// Delay in milliseconds before each probe, jitter is added on top
    #[arg(long)]
    delay_ms: Option<i64>,

    /// Timeout in milliseconds for every external command and lookup
    #[arg(long)]
    timeout_ms: Option<i64>,

    /// Resolve MACs with arp-scan or arping instead of only reading the
    /// ARP cache
    #[arg(long, default_value_t = false)]
    active_arp: bool,

    /// Sort results by IP address
    #[arg(long, default_value_t = false)]
    sort: bool,

    /// Output final report in json instead of table text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only print final output nothing else
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Prints debug logs including those from quietscan-lib
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// List usable network adapters and exit
    #[arg(long, default_value_t = false)]
    list_adapters: bool,

    /// Download the latest vendor database and exit
    #[arg(long, default_value_t = false)]
    update_vendors: bool,

    /// YAML file providing defaults for any flag not given explicitly
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Defaults read from the YAML settings file
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    targets: Vec<String>,
    targets_file: Option<PathBuf>,
    interface: Option<String>,
    allow_large_ranges: Option<bool>,
    concurrency: Option<i64>,
    delay_ms: Option<i64>,
    timeout_ms: Option<i64>,
    active_arp: Option<bool>,
    sort: Option<bool>,
    json: Option<bool>,
}

#[doc(hidden)]
fn load_file_settings(path: &Path) -> Result<FileSettings> {
    let file = fs::File::open(path)
        .map_err(|e| eyre!("cannot open settings file {}: {}", path.display(), e))?;
    let settings = serde_yaml::from_reader(file)
        .map_err(|e| eyre!("invalid settings file {}: {}", path.display(), e))?;
    Ok(settings)
}

#[doc(hidden)]
fn apply_file_settings(args: &mut Args, file: FileSettings) {
    if args.targets.is_empty() && args.targets_file.is_none() {
        if file.targets.is_empty() {
            args.targets_file = file.targets_file;
        } else {
            args.targets = file.targets;
        }
    }

    args.interface = args.interface.take().or(file.interface);
    args.concurrency = args.concurrency.or(file.concurrency);
    args.delay_ms = args.delay_ms.or(file.delay_ms);
    args.timeout_ms = args.timeout_ms.or(file.timeout_ms);

    args.allow_large_ranges |= file.allow_large_ranges.unwrap_or_default();
    args.active_arp |= file.active_arp.unwrap_or_default();
    args.sort |= file.sort.unwrap_or_default();
    args.json |= file.json.unwrap_or_default();
}

#[doc(hidden)]
fn build_settings(args: &Args) -> ScanSettings {
    let mut settings = ScanSettings::new();

    if let Some(concurrency) = args.concurrency {
        if settings.set_concurrency(concurrency) {
            warn!(
                "concurrency {} exceeds the maximum, using {}",
                concurrency,
                settings.concurrency()
            );
        }
    }

    if let Some(delay_ms) = args.delay_ms {
        settings.set_delay_ms(delay_ms);
    }

    if let Some(timeout_ms) = args.timeout_ms {
        if settings.set_timeout_ms(timeout_ms) {
            warn!(
                "timeout {}ms exceeds the maximum, using {}",
                timeout_ms,
                humantime::format_duration(settings.timeout())
            );
        }
    }

    settings.set_allow_large_ranges(args.allow_large_ranges);
    settings.set_active_arp(args.active_arp);

    settings
}

#[doc(hidden)]
fn initialize_logger(args: &Args) -> Result<()> {
    let filter = if args.quiet {
        simplelog::LevelFilter::Error
    } else if args.debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    simplelog::TermLogger::init(
        filter,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[doc(hidden)]
fn print_args(args: &Args, config: &ScanConfig) {
    info!("configuration:");
    info!("targets:            {:?}", args.targets);
    info!("targets_file:       {:?}", args.targets_file);
    info!(
        "interface:          {}",
        args.interface.as_deref().unwrap_or("auto")
    );
    info!("concurrency:        {}", config.concurrency);
    info!(
        "delay:              {}",
        humantime::format_duration(config.delay)
    );
    info!(
        "timeout:            {}",
        humantime::format_duration(config.timeout)
    );
    info!("allow_large_ranges: {}", config.allow_large_ranges);
    info!("active_arp:         {}", config.active_arp);
    info!("sort:               {}", args.sort);
    info!("json:               {}", args.json);
    info!("quiet:              {}", args.quiet);
}

/// Expands `--targets` entries, de-duplicates them, and applies the safety
/// ceilings to the combined list
#[doc(hidden)]
fn expand_targets(entries: &[String], config: &ScanConfig) -> Result<Vec<Ipv4Addr>> {
    let validator = TargetValidator::from(config);
    let mut ips = Vec::new();

    for entry in entries {
        let set = validator
            .parse_subnet_input(entry)
            .map_err(|e| eyre!("invalid target {}: {}", entry, e))?;
        ips.extend(set.iter().copied());
    }

    let ips: Vec<Ipv4Addr> = ips.into_iter().unique().collect();

    validator.validate_targets(&ips)?;

    Ok(ips)
}

#[doc(hidden)]
fn read_targets_file(path: &Path, scanner: &PoliteScanner) -> Result<Vec<Ipv4Addr>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| eyre!("cannot read targets file {}: {}", path.display(), e))?;
    let lines: Vec<&str> = contents.lines().collect();
    Ok(scanner.prepare_targets(&lines)?)
}

#[doc(hidden)]
fn progress_logger() -> ProgressCallback {
    Arc::new(|current, total| {
        if current % PROGRESS_STEP == 0 {
            info!("progress: {}/{}", current, total);
        } else {
            debug!("progress: {}/{}", current, total);
        }
    })
}

#[doc(hidden)]
fn run_scan(args: &Args, scanner: &PoliteScanner) -> Result<ScanResult> {
    let progress = Some(progress_logger());

    if let Some(path) = &args.targets_file {
        let targets = read_targets_file(path, scanner)?;
        let label = path.display().to_string();
        let adapter = args.interface.as_deref().unwrap_or_default();
        return Ok(scanner.scan(&targets, adapter, &label, progress));
    }

    if !args.targets.is_empty() {
        let targets = expand_targets(&args.targets, scanner.config())?;
        let label = args.targets.join(",");
        let adapter = args.interface.as_deref().unwrap_or_default();
        return Ok(scanner.scan(&targets, adapter, &label, progress));
    }

    Ok(scanner.scan_adapter(args.interface.as_deref(), progress))
}

#[doc(hidden)]
fn render_table(result: &ScanResult) -> prettytable::Table {
    let mut table = prettytable::Table::new();

    table.add_row(prettytable::row!["IP", "MAC", "VENDOR", "HOSTNAME"]);

    for d in result.devices.iter() {
        table.add_row(prettytable::row![d.ip, d.mac, d.vendor, d.hostname]);
    }

    table
}

#[doc(hidden)]
fn print_results(args: &Args, result: &ScanResult) -> Result<()> {
    info!(
        "scan results for {} on {}:",
        result.subnet,
        if result.adapter.is_empty() { "-" } else { result.adapter.as_str() }
    );

    if args.json {
        let j: String = serde_json::to_string_pretty(result)?;
        println!("{}", j);
    } else {
        render_table(result).printstd();
    }

    Ok(())
}

#[doc(hidden)]
fn list_adapters() {
    let mut table = prettytable::Table::new();

    table.add_row(prettytable::row!["ADAPTER", "SUBNET"]);

    for name in network::get_all_adapters() {
        let subnet = network::get_adapter_subnet(&name).unwrap_or_default();
        table.add_row(prettytable::row![name, subnet]);
    }

    table.printstd();
}

#[doc(hidden)]
fn update_vendors(timeout: Duration) -> Result<()> {
    let path = oui::user_database_path()
        .ok_or_else(|| eyre!("could not determine a data directory"))?;

    info!(
        "downloading vendor database (timeout {} per source)...",
        humantime::format_duration(timeout)
    );

    let (master, url) = oui::fetch_master_oui(timeout)?;

    info!("fetched {} entries from {}", master.len(), url);

    let local = OuiDatabase::load(&path).unwrap_or_else(|e| {
        debug!("no existing database at {}: {}", path.display(), e);
        OuiDatabase::new()
    });

    let diff = local.diff(&master);

    info!(
        "new: {}, updated: {}, removed: {} (local {}, master {})",
        diff.new.len(),
        diff.updated.len(),
        diff.removed.len(),
        diff.total_local,
        diff.total_master
    );

    if !diff.has_changes() {
        info!("vendor database is up to date");
        return Ok(());
    }

    master.save(&path)?;

    info!("saved vendor database to {}", path.display());

    Ok(())
}

#[doc(hidden)]
fn main() -> Result<()> {
    color_eyre::install()?;

    let mut args = Args::parse();

    initialize_logger(&args)?;

    if let Some(path) = args.config.clone() {
        let file = load_file_settings(&path)?;
        apply_file_settings(&mut args, file);
    }

    if args.list_adapters {
        list_adapters();
        return Ok(());
    }

    if args.update_vendors {
        return update_vendors(VENDOR_DOWNLOAD_TIMEOUT);
    }

    let config = build_settings(&args).snapshot();

    print_args(&args, &config);

    let scanner = PoliteScanner::system(config);

    let mut result = run_scan(&args, &scanner)?;

    if args.sort {
        result.sort_by_ip();
    }

    print_results(&args, &result)
}

#[cfg(test)]
#[path = "./main_tests.rs"]
mod tests;
