//! ABit - dual-channel audio loop player.
//!
//! Loads up to two audio clips onto independent channels (A and B), loops a
//! selectable sub-range of each, and lets a performer switch between them
//! live with exclusive solo muting. The engine is the interesting part; this
//! binary is a thin command-line front end that drives it and prints
//! playhead telemetry while playing.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use abit::config::{ConfigStore, TomlConfigStore, describe};
use abit::constants::{
    AUDIO_EXTENSIONS, PLAYHEAD_TICK, WAVEFORM_COLOR, WAVEFORM_HEIGHT, WAVEFORM_OVERSAMPLING,
    WAVEFORM_WIDTH,
};
use abit::engine::{AudioChannel, DualChannelEngine, PlayerState, PositionRange, decode_file};
use abit::files::FileLibrary;
use abit::render::{WaveformStyle, render_waveform};
use image::Rgba;

#[derive(Parser)]
#[command(name = "abit")]
#[command(about = "Dual-channel audio loop player for live A/B switching")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load clips onto channels A/B and play them
    Play {
        /// Audio file for channel A (wav or flac)
        file_a: PathBuf,
        /// Audio file for channel B
        file_b: Option<PathBuf>,
        /// Loop window for channel A as LOWER:UPPER fractions, e.g. 0.25:0.75
        #[arg(long, value_name = "LOWER:UPPER", value_parser = parse_range)]
        range_a: Option<PositionRange>,
        /// Loop window for channel B
        #[arg(long, value_name = "LOWER:UPPER", value_parser = parse_range)]
        range_b: Option<PositionRange>,
        /// Play channel A once instead of looping
        #[arg(long)]
        once_a: bool,
        /// Play channel B once instead of looping
        #[arg(long)]
        once_b: bool,
        /// Channel to solo: a, b or none
        #[arg(long, default_value = "a")]
        select: String,
        /// How long to play before stopping
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        /// Waveform style rendered for loaded clips
        #[arg(long, default_value = "line", value_parser = parse_style)]
        waveform_style: WaveformStyle,
    },
    /// Render a clip's waveform to a PNG
    Waveform {
        /// Audio file to render (wav or flac)
        file: PathBuf,
        /// Rendering style: line, bars, striped or gradient
        #[arg(long, default_value = "line", value_parser = parse_style)]
        style: WaveformStyle,
        /// Output image path
        #[arg(long, default_value = "waveform.png")]
        out: PathBuf,
        #[arg(long, default_value_t = WAVEFORM_WIDTH)]
        width: u32,
        #[arg(long, default_value_t = WAVEFORM_HEIGHT)]
        height: u32,
    },
    /// Show or clear persisted channel configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print both channels' persisted records
    Show,
    /// Remove all persisted records
    Clear,
}

fn parse_style(s: &str) -> Result<WaveformStyle, String> {
    match s {
        "line" => Ok(WaveformStyle::Line),
        "bars" => Ok(WaveformStyle::Bars),
        "striped" => Ok(WaveformStyle::Striped),
        "gradient" => Ok(WaveformStyle::Gradient),
        other => Err(format!("unknown style '{other}' (line, bars, striped, gradient)")),
    }
}

fn parse_range(s: &str) -> Result<PositionRange, String> {
    let (lower, upper) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LOWER:UPPER, got '{s}'"))?;
    let lower: f64 = lower.trim().parse().map_err(|_| format!("bad bound '{lower}'"))?;
    let upper: f64 = upper.trim().parse().map_err(|_| format!("bad bound '{upper}'"))?;
    Ok(PositionRange::new(lower, upper))
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(generator, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Play {
            file_a,
            file_b,
            range_a,
            range_b,
            once_a,
            once_b,
            select,
            seconds,
            waveform_style,
        } => run_play(PlayArgs {
            file_a,
            file_b,
            range_a,
            range_b,
            once_a,
            once_b,
            select,
            seconds,
            waveform_style,
        }),
        Commands::Waveform {
            file,
            style,
            out,
            width,
            height,
        } => run_waveform(&file, style, &out, width, height),
        Commands::Config { action } => run_config(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
            Ok(())
        }
    }
}

struct PlayArgs {
    file_a: PathBuf,
    file_b: Option<PathBuf>,
    range_a: Option<PositionRange>,
    range_b: Option<PositionRange>,
    once_a: bool,
    once_b: bool,
    select: String,
    seconds: f64,
    waveform_style: WaveformStyle,
}

fn run_waveform(
    file: &Path,
    style: WaveformStyle,
    out: &Path,
    width: u32,
    height: u32,
) -> Result<(), Box<dyn Error>> {
    let buffer = decode_file(file)?;
    let image = render_waveform(
        &buffer,
        width,
        height,
        style,
        Rgba(WAVEFORM_COLOR),
        WAVEFORM_OVERSAMPLING,
    );
    image.save(out)?;
    println!("wrote {}", out.display());
    Ok(())
}

fn run_play(args: PlayArgs) -> Result<(), Box<dyn Error>> {
    let selected = match args.select.as_str() {
        "a" => Some(AudioChannel::A),
        "b" => Some(AudioChannel::B),
        "none" => None,
        other => return Err(format!("unknown channel '{other}' (use a, b or none)").into()),
    };

    for path in [Some(&args.file_a), args.file_b.as_ref()].into_iter().flatten() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            return Err(format!(
                "unsupported file type '{}' (supported: {})",
                path.display(),
                AUDIO_EXTENSIONS.join(", ")
            )
            .into());
        }
    }

    let store: Rc<dyn ConfigStore> = Rc::new(TomlConfigStore::new());
    let library = FileLibrary::new()?;
    let mut engine = DualChannelEngine::new(store, library);
    for channel in AudioChannel::ALL {
        engine.player_mut(channel).set_waveform_style(args.waveform_style);
    }

    engine.load_file(AudioChannel::A, &args.file_a);
    if let Some(file_b) = &args.file_b {
        engine.load_file(AudioChannel::B, file_b);
    }
    wait_for_loads(&mut engine)?;

    if engine.player(AudioChannel::A).state() == PlayerState::AwaitingFile {
        return Err(format!("could not load {}", args.file_a.display()).into());
    }
    if let Some(file_b) = &args.file_b
        && engine.player(AudioChannel::B).state() == PlayerState::AwaitingFile
    {
        return Err(format!("could not load {}", file_b.display()).into());
    }

    if let Some(range) = args.range_a {
        engine.set_position_range(AudioChannel::A, range);
    }
    if let Some(range) = args.range_b {
        engine.set_position_range(AudioChannel::B, range);
    }
    engine.set_loop(AudioChannel::A, !args.once_a);
    engine.set_loop(AudioChannel::B, !args.once_b);
    engine.select_channel(selected);

    engine.play_all();
    if !engine.any_playing() {
        return Err("playback could not start".into());
    }

    let deadline = Instant::now() + Duration::from_secs_f64(args.seconds);
    let mut last_report = Instant::now();
    while Instant::now() < deadline && engine.any_playing() {
        engine.tick();
        if last_report.elapsed() >= Duration::from_millis(250) {
            last_report = Instant::now();
            for channel in AudioChannel::ALL {
                let player = engine.player(channel);
                if let Some(playhead) = player.playhead() {
                    let mark = if player.is_muted() { " " } else { "*" };
                    println!(
                        "{mark} {channel} {:7.2}s  pos {:.3}",
                        playhead.time, playhead.position
                    );
                }
            }
        }
        sleep(PLAYHEAD_TICK);
    }

    engine.shutdown();
    Ok(())
}

fn wait_for_loads(engine: &mut DualChannelEngine) -> Result<(), Box<dyn Error>> {
    let deadline = Instant::now() + Duration::from_secs(30);
    while AudioChannel::ALL
        .iter()
        .any(|&c| engine.player(c).state() == PlayerState::Loading)
    {
        if Instant::now() > deadline {
            return Err("timed out loading audio files".into());
        }
        engine.tick();
        sleep(Duration::from_millis(5));
    }
    Ok(())
}

fn run_config(action: ConfigAction) -> Result<(), Box<dyn Error>> {
    let store = TomlConfigStore::new();
    match action {
        ConfigAction::Show => {
            for channel in AudioChannel::ALL {
                let record = store.load(channel);
                println!("{}", describe(channel, record.as_ref()));
            }
        }
        ConfigAction::Clear => {
            store.clear_all()?;
            println!("cleared channel configuration");
        }
    }
    Ok(())
}
