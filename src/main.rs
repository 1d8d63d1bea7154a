//! tiercache shell
//!
//! Line-oriented front end over a memory + file-system cache. Reads one
//! command per line from stdin and answers on stdout; logs go to stderr.
//!
//! ```text
//! put <key> <json>    store a value (plain text is stored as a string)
//! get <key>           print a value
//! remove <key>        drop a value
//! contains <key>      print whether a key is resident
//! size                print the number of resident entries
//! clear               drop everything
//! stats [reset]       print metrics as JSON, or zero them
//! help                list commands
//! quit                exit
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tiercache::cache::{Cache, CacheManager, CompressionAlgorithm};
use tiercache::CacheConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Two-tier object cache shell
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "TIERCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Fast (memory) tier capacity
    #[arg(long, env = "TIERCACHE_MEMORY_SIZE")]
    memory_size: Option<usize>,

    /// Slow (file system) tier capacity
    #[arg(long, env = "TIERCACHE_FILE_SYSTEM_SIZE")]
    file_system_size: Option<usize>,

    /// Eviction strategy (LRU or LFU)
    #[arg(long, env = "TIERCACHE_STRATEGY")]
    strategy: Option<String>,

    /// Directory for slow-tier entry files
    #[arg(long, env = "TIERCACHE_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Slow-tier compression (none or lz4)
    #[arg(long, env = "TIERCACHE_COMPRESSION")]
    compression: Option<CompressionAlgorithm>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    /// Configuration file (or defaults) with command-line overrides applied
    fn cache_config(&self) -> anyhow::Result<CacheConfig> {
        let mut config = match &self.config {
            Some(path) => CacheConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CacheConfig::default(),
        };

        if let Some(memory) = self.memory_size {
            config.size.memory = memory;
        }
        if let Some(file_system) = self.file_system_size {
            config.size.file_system = file_system;
        }
        if let Some(strategy) = &self.strategy {
            config.strategy = strategy.clone();
        }
        if let Some(dir) = &self.storage_dir {
            config.storage_dir = dir.clone();
        }
        if let Some(compression) = self.compression {
            config.compression = compression;
        }

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = args.cache_config()?;
    info!("Starting tiercache {}", tiercache::VERSION);
    info!("  Memory tier size: {}", config.size.memory);
    info!("  File-system tier size: {}", config.size.file_system);
    info!("  Strategy: {}", config.eviction_policy());
    info!("  Storage dir: {}", config.storage_dir.display());
    info!("  Compression: {}", config.compression);

    let mut cache: CacheManager<String, Value> =
        CacheManager::from_config(&config).context("creating cache")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "error: {}", message)?;
                continue;
            }
        };

        if !execute(&mut cache, command, &mut out)? {
            break;
        }
        out.flush()?;
    }

    info!("Shutting down");
    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

// =============================================================================
// Commands
// =============================================================================

const HELP: &str = "\
commands:
  put <key> <json>   store a value
  get <key>          print a value
  remove <key>       drop a value
  contains <key>     print whether a key is resident
  size               print the number of resident entries
  clear              drop everything
  stats [reset]      print metrics, or zero them
  help               show this text
  quit               exit";

#[derive(Debug, PartialEq)]
enum Command {
    Put(String, Value),
    Get(String),
    Remove(String),
    Contains(String),
    Size,
    Clear,
    Stats,
    ResetStats,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines yield `None`
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb {
            "put" => {
                let (key, raw) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("usage: put <key> <json>")?;
                let raw = raw.trim();
                let value = serde_json::from_str(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string()));
                Command::Put(key.to_string(), value)
            }
            "get" => Command::Get(single_key(verb, rest)?),
            "remove" => Command::Remove(single_key(verb, rest)?),
            "contains" => Command::Contains(single_key(verb, rest)?),
            "size" => Command::Size,
            "clear" => Command::Clear,
            "stats" => match rest {
                "" => Command::Stats,
                "reset" => Command::ResetStats,
                _ => return Err("usage: stats [reset]".to_string()),
            },
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command {:?}, try \"help\"", other)),
        };
        Ok(Some(command))
    }
}

fn single_key(verb: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(format!("usage: {} <key>", verb));
    }
    Ok(rest.to_string())
}

/// Run one command. Returns `false` once the shell should exit.
fn execute<C, W>(cache: &mut C, command: Command, out: &mut W) -> io::Result<bool>
where
    C: Cache<String, Value> + ReportsMetrics,
    W: Write,
{
    let outcome = match command {
        Command::Put(key, value) => cache.put(key, value).map(|()| "ok".to_string()),
        Command::Get(key) => cache.get(&key).map(|value| match value {
            Some(value) => value.to_string(),
            None => "(absent)".to_string(),
        }),
        Command::Remove(key) => cache.remove(&key).map(|()| "ok".to_string()),
        Command::Contains(key) => Ok(cache.contains_key(&key).to_string()),
        Command::Size => Ok(format!("{}/{}", cache.size(), cache.capacity())),
        Command::Clear => cache.clear().map(|()| "ok".to_string()),
        Command::Stats => Ok(cache.metrics_json()),
        Command::ResetStats => {
            cache.reset_metrics();
            Ok("ok".to_string())
        }
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => return Ok(false),
    };

    match outcome {
        Ok(text) => writeln!(out, "{}", text)?,
        Err(e) => {
            error!(error = %e, "Command failed");
            writeln!(out, "error: {}", e)?;
        }
    }
    Ok(true)
}

/// Caches whose counters the `stats` command can print
trait ReportsMetrics {
    fn metrics_json(&self) -> String;

    fn reset_metrics(&self);
}

impl<F, S> ReportsMetrics for CacheManager<String, Value, F, S>
where
    F: Cache<String, Value>,
    S: Cache<String, Value>,
{
    fn metrics_json(&self) -> String {
        serde_json::to_string(&self.metrics()).unwrap_or_else(|e| format!("error: {}", e))
    }

    fn reset_metrics(&self) {
        CacheManager::reset_metrics(self);
    }
}

// =============================================================================
// Tests
// =============================================================================
