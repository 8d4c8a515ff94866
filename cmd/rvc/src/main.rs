//! rvc - convert a voice recording to a target speaker.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use rvc_cli::{DEFAULT_WEIGHT_LIMIT, inspect, load_config};
use rvc_convert::Converter;
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "rvc";

/// Convert a voice recording to a target speaker.
///
/// Models: tsukuyomi (つくよみちゃん), amitaro (あみたろ).
///
/// Configuration is read from ~/.rvc/rvc/config.yaml when present.
/// On success the output path is printed to stdout; logs go to stderr.
#[derive(Parser)]
#[command(name = "rvc")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,

    /// Config file (default is ~/.rvc/rvc/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input WAV file
    #[arg(required = true)]
    input: Option<PathBuf>,

    /// Target model identifier
    #[arg(required = true)]
    model: Option<String>,

    /// Output WAV file
    #[arg(required = true)]
    output: Option<PathBuf>,

    /// Pitch shift in semitones
    #[arg(allow_negative_numbers = true, default_value_t = 0)]
    semitones: i32,

    /// Speaker embedding index (overrides the config file)
    #[arg(long)]
    speaker: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a checkpoint's metadata, weights and derived configuration
    Inspect {
        /// Checkpoint file
        checkpoint: PathBuf,

        /// Number of weights to list
        #[arg(long, default_value_t = DEFAULT_WEIGHT_LIMIT)]
        limit: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn convert(cli: &Cli) -> anyhow::Result<PathBuf> {
    let args = &cli.convert;
    let (Some(input), Some(model), Some(output)) = (&args.input, &args.model, &args.output) else {
        anyhow::bail!("input, model and output are required");
    };

    let config = load_config(APP_NAME, cli.config.as_deref())?;
    let mut settings = config.to_settings();
    if let Some(speaker) = args.speaker {
        settings.speaker_id = speaker;
    }

    let converter = Converter::new(settings);
    let conversion = converter
        .convert(input, model, output, args.semitones as f32)
        .with_context(|| format!("convert {}", input.display()))?;
    Ok(conversion.output)
}

/// Returns what to print on stdout.
fn run(cli: &Cli) -> anyhow::Result<String> {
    match &cli.command {
        Some(Commands::Inspect { checkpoint, limit }) => {
            let report = inspect(checkpoint, *limit)?;
            Ok(report.to_string().trim_end().to_string())
        }
        None => convert(cli).map(|output| output.display().to_string()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_conversion() {
        let cli = Cli::try_parse_from(["rvc", "in.wav", "amitaro", "out.wav", "-3"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.convert.input, Some(PathBuf::from("in.wav")));
        assert_eq!(cli.convert.model.as_deref(), Some("amitaro"));
        assert_eq!(cli.convert.output, Some(PathBuf::from("out.wav")));
        assert_eq!(cli.convert.semitones, -3);
    }

    #[test]
    fn conversion_needs_three_paths() {
        assert!(Cli::try_parse_from(["rvc", "in.wav", "amitaro"]).is_err());
    }

    #[test]
    fn inspect_subcommand() {
        let cli = Cli::try_parse_from(["rvc", "inspect", "model.pth", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::Inspect { checkpoint, limit }) => {
                assert_eq!(checkpoint, PathBuf::from("model.pth"));
                assert_eq!(limit, 5);
            }
            None => panic!("expected inspect"),
        }
        assert!(cli.convert.input.is_none());
    }

    #[test]
    fn inspect_prints_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.pth");
        let meta = std::collections::BTreeMap::from([("f0".to_string(), "0".to_string())]);
        let weights = std::collections::BTreeMap::from([(
            "emb_g.weight".to_string(),
            rvc_synth::Weight::new(vec![2], vec![0.5, 0.25]).unwrap(),
        )]);
        rvc_synth::save_checkpoint(&path, &meta, &weights).unwrap();

        let cli = Cli::try_parse_from(["rvc".into(), "inspect".into(), path.clone().into_os_string()])
            .unwrap();
        let out = run(&cli).unwrap();
        assert!(out.starts_with(&format!("checkpoint: {}", path.display())), "{out}");
        assert!(out.contains("emb_g.weight F32 [2]"), "{out}");
        assert!(out.contains("variant: SynthesizerTrnMs256NSFsid_nono"), "{out}");
    }

    #[test]
    fn inspect_missing_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "rvc".into(),
            "inspect".into(),
            dir.path().join("absent.pth").into_os_string(),
        ])
        .unwrap();
        assert!(run(&cli).is_err());
    }
}
