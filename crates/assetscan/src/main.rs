//! `assetscan` - CLI for the asset lookup tool
//!
//! This binary converts spreadsheet exports and looks assets up by typed tag
//! or by scanning a QR label with the camera.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use assetscan::cli::{
    Cli, Command, ConfigCommand, ConvertCommand, FindCommand, OutputFormat, ScanCommand,
    ShellCommand, StatsCommand,
};
use assetscan::normalize::NormalizeOptions;
use assetscan::present::{render_details, render_stats};
use assetscan::scan::DecoderFactory;
use assetscan::{
    convert_file, init_logging, Catalog, CommandDecoder, Config, Error, Normalizer, Session,
    Shown, UiState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Convert(cmd) => handle_convert(&config, cmd),
        Command::Find(cmd) => handle_find(config, cmd).await,
        Command::Scan(cmd) => handle_scan(config, cmd).await,
        Command::Shell(cmd) => handle_shell(config, cmd).await,
        Command::Stats(cmd) => handle_stats(&config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn decoder_factory(config: &Config) -> impl DecoderFactory<Decoder = CommandDecoder> {
    let command = config.scanner.command.clone();
    move || CommandDecoder::new(&command)
}

fn with_data(mut config: Config, data: Option<PathBuf>) -> Config {
    if let Some(path) = data {
        config.lookup.data_path = path;
    }
    config
}

/// A session whose database must load for the command to make sense.
fn loaded_session(
    config: Config,
    data: Option<PathBuf>,
) -> anyhow::Result<Session<impl DecoderFactory<Decoder = CommandDecoder>>> {
    let config = with_data(config, data);
    let factory = decoder_factory(&config);
    let session = Session::new(config, factory);
    session.load()?;
    Ok(session)
}

/// The user-facing text for a failed lookup.
fn notice_text(state: &UiState, err: &Error) -> String {
    match state {
        UiState::Error(notice) => notice.message.clone(),
        _ => err.to_string(),
    }
}

fn print_shown(shown: &Shown, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => {
            debug!(key = %shown.key, tier = %shown.tier, "Matched");
            print!("{}", render_details(&shown.record));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(shown)?),
    }
    Ok(())
}

async fn scan_with_ctrl_c<F: DecoderFactory>(
    session: &mut Session<F>,
) -> assetscan::Result<Option<Shown>> {
    let handle = session.scan_handle();
    let canceller = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    eprintln!("Point the camera at a QR code (Ctrl-C to cancel)...");
    let result = session.scan().await;
    canceller.abort();
    result
}

fn handle_convert(config: &Config, cmd: ConvertCommand) -> anyhow::Result<()> {
    let input = cmd
        .input
        .unwrap_or_else(|| config.converter.input_path.clone());
    let output = cmd
        .output
        .unwrap_or_else(|| config.converter.output_path.clone());
    let normalizer = Normalizer::with_options(NormalizeOptions::from(&config.converter));

    info!("Converting {} -> {}", input.display(), output.display());
    let summary = convert_file(&input, &output, &normalizer, config.converter.pretty)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Conversion complete!");
        println!("Input:          {}", summary.input.display());
        println!("Output:         {}", summary.output.display());
        print!("{}", render_stats(&summary.stats));
        if summary.synthesized_keys > 0 {
            println!("Untagged rows:  {}", summary.synthesized_keys);
        }
        if summary.duplicate_tags > 0 {
            println!("Duplicate tags: {}", summary.duplicate_tags);
        }
    }
    Ok(())
}

async fn handle_find(config: Config, cmd: FindCommand) -> anyhow::Result<()> {
    let mut session = loaded_session(config, cmd.data)?;
    match session.search(&cmd.query).await {
        Ok(shown) => print_shown(&shown, cmd.format),
        Err(err) => anyhow::bail!(notice_text(session.state(), &err)),
    }
}

async fn handle_scan(config: Config, cmd: ScanCommand) -> anyhow::Result<()> {
    let mut session = loaded_session(config, cmd.data)?;
    match scan_with_ctrl_c(&mut session).await {
        Ok(Some(shown)) => print_shown(&shown, cmd.format),
        Ok(None) => {
            eprintln!("Scan cancelled.");
            Ok(())
        }
        Err(err) => anyhow::bail!(notice_text(session.state(), &err)),
    }
}

const SHELL_HELP: &str = "\
Type an asset tag or QR code to look it up.
  :scan    scan a QR code with the camera
  :stats   show database totals
  :help    show this help
  :quit    exit";

async fn handle_shell(config: Config, cmd: ShellCommand) -> anyhow::Result<()> {
    let config = with_data(config, cmd.data);
    let factory = decoder_factory(&config);
    let mut session = Session::open(config, factory);

    if let UiState::Error(notice) = session.state() {
        eprintln!("{}", notice.message);
    } else {
        print!("{}", render_stats(&session.stats()));
    }
    println!("{SHELL_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let result = match line.trim() {
            ":quit" | ":q" => break,
            ":help" => {
                println!("{SHELL_HELP}");
                continue;
            }
            ":stats" => {
                print!("{}", render_stats(&session.stats()));
                continue;
            }
            ":scan" => scan_with_ctrl_c(&mut session).await,
            _ => session.search(&line).await.map(Some),
        };

        match result {
            Ok(Some(shown)) => print_shown(&shown, OutputFormat::Plain)?,
            Ok(None) => println!("Scan cancelled."),
            Err(err) => println!("{}", notice_text(session.state(), &err)),
        }
    }
    Ok(())
}

fn handle_stats(config: &Config, cmd: StatsCommand) -> anyhow::Result<()> {
    let path = cmd
        .data
        .unwrap_or_else(|| config.lookup.data_path.clone());
    let catalog = Catalog::load(&path)?;
    let stats = catalog.stats();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Database: {}", path.display());
        print!("{}", render_stats(&stats));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Converter]");
                println!(
                    "  Input path:         {}",
                    config.converter.input_path.display()
                );
                println!(
                    "  Output path:        {}",
                    config.converter.output_path.display()
                );
                println!("  Wrapper property:   {}", config.converter.wrapper_property);
                println!(
                    "  Placeholder prefix: {}",
                    config.converter.placeholder_prefix
                );
                println!("  Pretty output:      {}", config.converter.pretty);
                println!();
                println!("[Lookup]");
                println!(
                    "  Data path:          {}",
                    config.lookup.data_path.display()
                );
                println!("  Result delay (ms):  {}", config.lookup.result_delay_ms);
                println!("  Notice timeout (ms): {}", config.lookup.notice_timeout_ms);
                println!();
                println!("[Scanner]");
                println!("  Command:            {}", config.scanner.command.join(" "));
                println!("  Facing mode:        {}", config.scanner.facing_mode);
                println!("  FPS:                {}", config.scanner.fps);
                println!(
                    "  Scan region:        {}x{}",
                    config.scanner.qrbox_width, config.scanner.qrbox_height
                );
                println!("  Aspect ratio:       {}", config.scanner.aspect_ratio);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("configuration {} is invalid", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
