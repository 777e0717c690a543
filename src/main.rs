//! Stressline CLI
//!
//! Usage:
//!   stressline --frames session.jsonl           # Replay recorded landmarks
//!   stressline --interactive                    # Read lines / key commands from stdin
//!   stressline --serve                          # HTTP API server
//!   stressline --frames f.jsonl --audio a.wav   # Replay with recorded audio
//!   stressline --frames f.jsonl --json          # JSON output
//!
//! Input lines (JSON, one per line):
//!   {"t": 1.25, "faces": [{"points": [{"x": .., "y": ..}, ...]}]}
//!   {"command": "start_session"}
//!   {"transcript": "what was said"}

use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use stressline::config::StressConfig;
use stressline::core::{
    run_server, CommandOutcome, SessionController, VoiceStressEstimator, WavReplayBackend,
};
use stressline::types::{AssessmentResult, Command, ControllerState, FaceLandmarks, Frame, FrameOutput};
use stressline::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "stressline",
    version = VERSION,
    about = "Stressline - multimodal stress detection from face landmarks and voice",
    long_about = "Stressline scores stress from facial landmarks against a calibrated\n\
                  per-user baseline, optionally fused with a speech-stress estimate.\n\n\
                  Modes:\n  \
                  --frames       Replay a JSON-lines recording\n  \
                  --interactive  Read lines from stdin (s/e/c/r/l/q keys)\n  \
                  --serve        HTTP API server mode\n\n\
                  States:\n  \
                  IDLE_UNCALIBRATED - No face seen yet\n  \
                  CALIBRATING       - Collecting the neutral baseline\n  \
                  IDLE_MONITORING   - Scoring live, ready for a session\n  \
                  SESSION_ACTIVE    - Timed assessment running\n  \
                  RESULTS_AVAILABLE - Assessment ready"
)]
struct Args {
    /// Replay landmarks, commands and transcripts from a JSON-lines file
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Interactive mode - read lines from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// WAV file used as the audio source for sessions
    #[arg(long)]
    audio: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session length in seconds (overrides config)
    #[arg(long)]
    session_secs: Option<u64>,

    /// Speech-stress oracle URL (overrides config and environment)
    #[arg(long)]
    oracle_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show per-frame score components
    #[arg(long)]
    verbose: bool,
}

/// One input line
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputLine {
    Frame {
        /// Offset from replay start, seconds
        #[serde(default)]
        t: Option<f64>,
        faces: Vec<FaceLandmarks>,
    },
    Command {
        command: Command,
    },
    Transcript {
        transcript: String,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    let controller = build_controller(config, &args);

    if args.serve {
        run_serve(&args, controller);
    } else if let Some(path) = &args.frames {
        run_replay(path, controller, &args);
    } else {
        run_interactive(controller, &args);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "stressline=debug" } else { "stressline=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// File (optional) → environment → CLI flags
fn load_config(args: &Args) -> Result<StressConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => StressConfig::load(path)?,
        None => StressConfig::default(),
    }
    .with_env_overrides();

    if let Some(secs) = args.session_secs {
        config.session_secs = secs;
    }
    if let Some(url) = &args.oracle_url {
        config.oracle.url = Some(url.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_controller(config: StressConfig, args: &Args) -> SessionController {
    match &args.audio {
        Some(path) => {
            let voice = VoiceStressEstimator::from_settings(&config.oracle);
            let audio = Box::new(WavReplayBackend { path: path.clone() });
            SessionController::new(config, voice, audio)
        }
        None => SessionController::from_config(config),
    }
}

/// Session clock for a frame's `t` offset; `None` when it overflows
fn frame_clock(base: Instant, t: Option<f64>) -> Option<Instant> {
    match t {
        Some(t) => base.checked_add(Duration::try_from_secs_f64(t).ok()?),
        None => Some(Instant::now()),
    }
}

/// Replay a recording; `t` offsets drive the session clock
fn run_replay(path: &PathBuf, mut controller: SessionController, args: &Args) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    print_header("Replay", args.no_color);
    let base = Instant::now();
    let mut clock = base;

    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(line = n + 1, error = %e, "read failed, stopping replay");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let input = match serde_json::from_str::<InputLine>(line) {
            Ok(input) => input,
            Err(e) => {
                warn!(line = n + 1, error = %e, "skipping malformed line");
                continue;
            }
        };

        // Commands and transcripts take the clock of the preceding frame
        if let InputLine::Frame { t, .. } = &input {
            match frame_clock(base, *t) {
                Some(at) => clock = at,
                None => {
                    warn!(line = n + 1, t = ?t, "offset out of range, skipping line");
                    continue;
                }
            }
        }

        handle_input(&mut controller, input, clock, args);
        if controller.quit_requested() {
            break;
        }
    }

    if !controller.quit_requested() {
        print_summary(&controller, args);
        controller.shutdown();
    }
}

/// Interactive stdin mode
fn run_interactive(mut controller: SessionController, args: &Args) {
    print_header("Interactive", args.no_color);
    println!("Paste JSON lines (frames, commands, transcripts) or use keys:");
    println!("  s = start session   e = end session   c = recalibrate");
    println!("  r = reset results   l = toggle overlay   q = quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let prompt = format_prompt(&controller, args.no_color);
        print!("{}", prompt);
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.is_empty() {
            // Empty line still advances the session clock
            controller.tick_at(Instant::now());
            continue;
        }

        let input = match Command::from_key(line) {
            Some(command) => InputLine::Command { command },
            None => match serde_json::from_str::<InputLine>(line) {
                Ok(input) => input,
                Err(_) => {
                    println!("Unknown input. Keys: s e c r l q, or a JSON line.");
                    continue;
                }
            },
        };

        handle_input(&mut controller, input, Instant::now(), args);
        if controller.quit_requested() {
            break;
        }
    }

    if !controller.quit_requested() {
        controller.shutdown();
    }
    println!("\nGoodbye.");
}

fn handle_input(controller: &mut SessionController, input: InputLine, now: Instant, args: &Args) {
    let before = controller.state();

    match input {
        InputLine::Frame { faces, .. } => {
            if let Some(output) = controller.process_frame_at(&Frame { faces }, now) {
                print_frame(&output, args);
            }
        }
        InputLine::Command { command } => match controller.apply_at(command, now) {
            Ok(outcome) => print_outcome(&outcome, args),
            Err(e) => {
                if args.json {
                    println!("{}", serde_json::json!({ "error": e.to_string() }));
                } else {
                    println!("{} {}", "rejected:".yellow(), e);
                }
            }
        },
        InputLine::Transcript { transcript } => {
            controller.supply_transcript(transcript);
            if !args.json {
                println!("{}", "transcript received".dimmed());
            }
        }
    }

    let after = controller.state();
    if before != after {
        print_transition(controller, before, after, args);
    }
}

fn print_frame(output: &FrameOutput, args: &Args) {
    if args.json {
        match serde_json::to_string(output) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "cannot serialise frame output"),
        }
        return;
    }

    if args.no_color {
        println!("{}", output.to_parseable_string());
    } else {
        println!("{}", output.to_terminal_string());
    }

    if args.verbose {
        if let Some(c) = &output.components {
            println!(
                "  eye: factor={:.3} stress={:.3} | lip: factor={:.3} stress={:.3} | raw={:.3}",
                c.eye_factor, c.eye_stress, c.lip_factor, c.lip_stress, c.raw
            );
        }
    }
}

fn print_outcome(outcome: &CommandOutcome, args: &Args) {
    if args.json {
        match serde_json::to_string(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "cannot serialise command outcome"),
        }
        return;
    }

    match outcome {
        CommandOutcome::Started { session_secs } => {
            println!("{}", format!("Session started ({}s)", session_secs).green().bold());
        }
        CommandOutcome::Ended { .. } => {}
        CommandOutcome::Recalibrating => {
            println!("{}", "Recalibrating - hold a neutral expression".cyan());
        }
        CommandOutcome::Reset => println!("{}", "Results cleared".cyan()),
        CommandOutcome::Overlay { enabled } => {
            println!("Landmark overlay {}", if *enabled { "on" } else { "off" });
        }
        CommandOutcome::Quit => println!("{}", "Shutting down".dimmed()),
    }
}

fn print_transition(controller: &SessionController, from: ControllerState, to: ControllerState, args: &Args) {
    if args.json {
        println!(
            "{}",
            serde_json::json!({ "transition": { "from": from, "to": to } })
        );
        if to == ControllerState::ResultsAvailable {
            print_assessment(controller.assessment(), args);
        }
        return;
    }

    println!("{}", controller.snapshot().to_status_line().bold());
    match to {
        ControllerState::IdleMonitoring if from == ControllerState::Calibrating => {
            println!("{}", "Calibration complete".green());
        }
        ControllerState::ResultsAvailable => print_assessment(controller.assessment(), args),
        _ => {}
    }
}

fn print_assessment(assessment: &AssessmentResult, args: &Args) {
    if args.json {
        match serde_json::to_string(assessment) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "cannot serialise assessment"),
        }
        return;
    }

    println!();
    print!("{}", assessment.to_terminal_string(args.no_color));
    if let Some(report) = &assessment.trend {
        println!();
        print!("{}", report.render());
    }
    println!();
}

fn print_summary(controller: &SessionController, args: &Args) {
    if args.json {
        match serde_json::to_string(&controller.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "cannot serialise snapshot"),
        }
        return;
    }
    println!();
    println!("{}", controller.snapshot().to_status_line());
}

/// Print header
fn print_header(mode: &str, no_color: bool) {
    println!();
    let title = format!("  Stressline v{} - {}", VERSION, mode);
    if no_color {
        println!("========================================");
        println!("{}", title);
        println!("========================================");
    } else {
        println!("{}", "========================================".bold());
        println!("{}", title.bold());
        println!("{}", "========================================".bold());
    }
    println!();
}

/// Prompt shows state (and time left during a session)
fn format_prompt(controller: &SessionController, no_color: bool) -> String {
    let state = controller.state();
    let remaining = controller
        .time_remaining()
        .map(|d| format!(" {}s", d.as_secs()))
        .unwrap_or_default();
    if no_color {
        format!("[{}{}] > ", state, remaining)
    } else {
        format!(
            "{}{} [{}{}]{} > ",
            state.color_code(),
            state.emoji(),
            state,
            remaining,
            ControllerState::color_reset()
        )
    }
}

/// Run HTTP API server on a runtime owned by this mode only
fn run_serve(args: &Args, controller: SessionController) {
    println!();
    println!("Stressline API Server v{}", VERSION);
    println!();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run_server(&args.addr, controller)) {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// TESTS
// =============================================================================
