// Gestrs CLI
// Validates settings files and replays recorded event traces through the
// gesture engine for offline inspection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use gestrs_core::key::{button_from_name, key_from_name};
use gestrs_core::{
    conflicts, validate_feature, ChordKey, EventDecision, FeatureKey, FrameScheduler,
    GestureEngine, ManualTickSource, RawEvent, RecordingOutput, Settings, SharedSettings,
};

/// Gesture engine configuration checker and trace replayer
#[derive(Parser, Debug)]
#[command(name = "gestrs")]
#[command(author = "gestrs contributors")]
#[command(version)]
#[command(about = "Trackpad-gesture emulation engine tools", long_about = None)]
struct Args {
    /// Settings TOML file (default: ~/.config/gestrs/settings.toml)
    #[arg(short, long, value_name = "SETTINGS")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the settings file: activator validity and cross-feature
    /// conflicts. Exits non-zero on any finding.
    Check,

    /// Replay a recorded event trace through the engine, printing each
    /// pass-through/consume decision and every synthetic emission.
    Replay {
        /// Trace file: lines of "<ms> keydown <key>", "<ms> buttondown
        /// <button>", "<ms> move <dx> <dy>", "<ms> tick", ...
        trace: PathBuf,
    },
}

const ALL_FEATURES: [FeatureKey; 3] = [
    FeatureKey::Scroll,
    FeatureKey::ZoomRotate,
    FeatureKey::DockSwipe,
];

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Settings::load_default().context("failed to load default settings"),
    }
}

fn check(settings: &Settings) -> Result<()> {
    let mut findings = 0;

    for feature in ALL_FEATURES {
        if let Some(reason) = validate_feature(feature, settings) {
            println!("INVALID  {}: {}", feature, reason);
            findings += 1;
        }
    }

    for (a, b) in conflicts(settings) {
        println!("CONFLICT {} and {} share an effective activator", a, b);
        findings += 1;
    }

    if findings == 0 {
        println!("Settings are valid");
        Ok(())
    } else {
        bail!("{} finding(s)", findings);
    }
}

/// One parsed trace line.
enum TraceStep {
    Event(u64, EventBuilder),
    Tick(u64),
}

enum EventBuilder {
    KeyDown(u16),
    KeyUp(u16),
    ButtonDown(u16),
    ButtonUp(u16),
    Move(f64, f64),
    Drag(u16, f64, f64),
}

impl EventBuilder {
    fn build(&self, time: Instant) -> RawEvent {
        match *self {
            EventBuilder::KeyDown(code) => RawEvent::key_down(code, time),
            EventBuilder::KeyUp(code) => RawEvent::key_up(code, time),
            EventBuilder::ButtonDown(code) => RawEvent::button_down(code, time),
            EventBuilder::ButtonUp(code) => RawEvent::button_up(code, time),
            EventBuilder::Move(dx, dy) => RawEvent::motion(dx, dy, time),
            EventBuilder::Drag(code, dx, dy) => RawEvent::drag(code, dx, dy, time),
        }
    }
}

fn resolve_key_code(token: &str) -> Result<u16> {
    if let Ok(code) = token.parse::<u16>() {
        return Ok(code);
    }
    match key_from_name(token) {
        Some(ChordKey::Key(code)) => Ok(code),
        _ => bail!("unknown key '{}'", token),
    }
}

fn resolve_button_code(token: &str) -> Result<u16> {
    if let Ok(code) = token.parse::<u16>() {
        return Ok(code);
    }
    match button_from_name(token) {
        Some(ChordKey::Button(code)) => Ok(code),
        _ => bail!("unknown button '{}'", token),
    }
}

fn parse_trace_line(line: &str) -> Result<Option<TraceStep>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut tokens = line.split_whitespace();
    let ms: u64 = tokens
        .next()
        .context("missing timestamp")?
        .parse()
        .context("timestamp must be milliseconds")?;
    let verb = tokens.next().context("missing event verb")?;

    let step = match verb {
        "tick" => TraceStep::Tick(ms),
        "keydown" | "keyup" => {
            let code = resolve_key_code(tokens.next().context("missing key")?)?;
            let builder = if verb == "keydown" {
                EventBuilder::KeyDown(code)
            } else {
                EventBuilder::KeyUp(code)
            };
            TraceStep::Event(ms, builder)
        }
        "buttondown" | "buttonup" => {
            let code = resolve_button_code(tokens.next().context("missing button")?)?;
            let builder = if verb == "buttondown" {
                EventBuilder::ButtonDown(code)
            } else {
                EventBuilder::ButtonUp(code)
            };
            TraceStep::Event(ms, builder)
        }
        "move" => {
            let dx: f64 = tokens.next().context("missing dx")?.parse()?;
            let dy: f64 = tokens.next().context("missing dy")?.parse()?;
            TraceStep::Event(ms, EventBuilder::Move(dx, dy))
        }
        "drag" => {
            let code = resolve_button_code(tokens.next().context("missing button")?)?;
            let dx: f64 = tokens.next().context("missing dx")?.parse()?;
            let dy: f64 = tokens.next().context("missing dy")?.parse()?;
            TraceStep::Event(ms, EventBuilder::Drag(code, dx, dy))
        }
        other => bail!("unknown event verb '{}'", other),
    };
    Ok(Some(step))
}

fn replay(settings: Settings, trace_path: &PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(trace_path)
        .with_context(|| format!("failed to read trace {}", trace_path.display()))?;

    let shared = SharedSettings::new(settings);
    let output = Arc::new(RecordingOutput::new());
    let scheduler = Arc::new(FrameScheduler::new(Arc::new(ManualTickSource::new())));
    let mut engine = GestureEngine::new(shared, output.clone(), scheduler.clone());

    let base = Instant::now();
    let mut last_ms = 0u64;

    for (number, line) in content.lines().enumerate() {
        let step = parse_trace_line(line)
            .with_context(|| format!("trace line {}: '{}'", number + 1, line.trim()))?;
        let Some(step) = step else { continue };

        match step {
            TraceStep::Tick(ms) => {
                last_ms = ms;
                scheduler.tick();
                for event in output.take() {
                    println!("{:>6}ms   emit {}", ms, event);
                }
            }
            TraceStep::Event(ms, builder) => {
                last_ms = ms;
                let event = builder.build(base + Duration::from_millis(ms));
                let decision = engine.process_event(&event);
                let marker = match decision {
                    EventDecision::Consume => "consume",
                    EventDecision::PassThrough => "pass   ",
                };
                println!("{:>6}ms {} {}", ms, marker, line.trim());
            }
        }
    }

    // Fire any pending tap commit, then run the scheduler dry.
    if let Some(deadline) = engine.next_deadline() {
        for signal in engine.fire_due(deadline) {
            println!("{:>6}ms signal {:?}", last_ms, signal);
        }
    }
    while !scheduler.is_idle() {
        scheduler.tick();
        for event in output.take() {
            println!("{:>6}ms+  emit {}", last_ms, event);
        }
    }

    let (scroll, zoom, swipe) = engine.phases();
    log::debug!("final phases: scroll={} zoom={} swipe={}", scroll, zoom, swipe);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    let settings = load_settings(args.settings.as_ref())?;

    match &args.command {
        Command::Check => check(&settings),
        Command::Replay { trace } => replay(settings, trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["gestrs", "check"]);
        assert!(matches!(args.command, Command::Check));
        assert!(args.settings.is_none());

        let args = Args::parse_from([
            "gestrs",
            "--settings",
            "/tmp/settings.toml",
            "replay",
            "/tmp/trace.txt",
        ]);
        assert_eq!(args.settings, Some(PathBuf::from("/tmp/settings.toml")));
        assert!(matches!(args.command, Command::Replay { .. }));
    }

    #[test]
    fn test_parse_trace_lines() {
        assert!(parse_trace_line("# comment").unwrap().is_none());
        assert!(parse_trace_line("").unwrap().is_none());

        let step = parse_trace_line("10 buttondown MiddleButton").unwrap().unwrap();
        assert!(matches!(
            step,
            TraceStep::Event(10, EventBuilder::ButtonDown(_))
        ));

        let step = parse_trace_line("20 move 3.5 -2").unwrap().unwrap();
        match step {
            TraceStep::Event(20, EventBuilder::Move(dx, dy)) => {
                assert_eq!(dx, 3.5);
                assert_eq!(dy, -2.0);
            }
            _ => panic!("unexpected step"),
        }

        assert!(matches!(
            parse_trace_line("30 tick").unwrap().unwrap(),
            TraceStep::Tick(30)
        ));
    }

    #[test]
    fn test_parse_trace_rejects_garbage() {
        assert!(parse_trace_line("notanumber keydown A").is_err());
        assert!(parse_trace_line("10 explode").is_err());
        assert!(parse_trace_line("10 keydown NotAKey").is_err());
        assert!(parse_trace_line("10 buttondown Button99").is_err());
    }

    #[test]
    fn test_key_and_button_resolution() {
        assert_eq!(resolve_key_code("58").unwrap(), 58);
        assert_eq!(resolve_key_code("CapsLock").unwrap(), 58);
        assert_eq!(resolve_button_code("MiddleButton").unwrap(), 0x112);
        assert_eq!(resolve_button_code("274").unwrap(), 274);
    }

    #[test]
    fn test_check_reports_conflict() {
        let toml = r#"
[scroll]
enabled = true
activator = "MiddleButton"

[swipe]
enabled = true
activator = "MiddleButton"
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert!(check(&settings).is_err());
    }

    #[test]
    fn test_check_accepts_valid_settings() {
        let toml = r#"
[scroll]
enabled = true
activator = "MiddleButton"

[swipe]
enabled = true
activator = "Button4"
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert!(check(&settings).is_ok());
    }
}
