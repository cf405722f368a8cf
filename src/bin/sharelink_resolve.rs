use std::io::Read;
use std::path::PathBuf;

use sharelink_engine::config::{load_resolver_config, save_resolver_config, ResolverConfig};
use sharelink_engine::dispatch::Dispatcher;
use sharelink_engine::record::Envelope;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut config_path: Option<PathBuf> = None;
    let mut init_path: Option<PathBuf> = None;
    let mut words: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(v));
            }
            "--init-config" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--init-config requires a value".to_string())?;
                init_path = Some(PathBuf::from(v));
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown arg: {other} (try --help)"));
            }
            other => words.push(other.to_string()),
        }
        i += 1;
    }

    if let Some(path) = init_path {
        // Materialize the built-in profiles so marker lists can be edited.
        let mut config = ResolverConfig::default();
        config.platforms = config.platforms();
        save_resolver_config(&path, &config).map_err(|e| e.to_string())?;
        println!("Wrote {}", path.to_string_lossy());
        return Ok(());
    }

    let mut config = match &config_path {
        Some(path) => load_resolver_config(path).map_err(|e| e.to_string())?,
        None => ResolverConfig::default(),
    };
    config.apply_env_cookies();

    let share_text = if words.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read share text from stdin: {e}"))?;
        buf
    } else {
        words.join(" ")
    };

    let dispatcher = Dispatcher::from_config(&config).map_err(|e| e.to_string())?;
    tracing::debug!(platforms = ?dispatcher.platform_names(), "dispatcher ready");
    let record = dispatcher.dispatch(&share_text).map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&Envelope::success(record)).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn print_help() {
    println!(
        r#"sharelink_resolve

Resolve a pasted share message into a media record (JSON on stdout).

Usage:
  sharelink_resolve [--config <path>] [share text...]
  sharelink_resolve --init-config <path>

If no share text is given it is read from stdin.

Options:
  --config <path>        Resolver config JSON (timeouts, user agents, cookies, platforms)
  --init-config <path>   Write the default config, including built-in platforms, and exit

Environment:
  DOUYIN_COOKIE     Optional session cookie sent with Douyin requests
  RUST_LOG          Log filter for stderr output (default: warn)
"#
    );
}
