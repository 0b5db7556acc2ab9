use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use robot_platform::MockPlatform;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod config;
mod hal;
mod program;
mod sim;

use config::BridgeConfig;
use hal::Hal;
use program::{demo, run_program};
use sim::{Stimulus, StimulusDriver};

#[derive(Parser, Debug)]
#[command(
    name = "nao",
    version,
    about = "Humanoid robot behaviors over blocking event adapters",
    disable_help_subcommand = true
)]
struct Cli {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Speak a sentence
    Say { text: String },
    /// Set the stiffness of a joint chain
    Stiffness {
        #[arg(long, default_value = "Body")]
        chain: String,
        /// Stiffness in [0, 1]
        #[arg(long, default_value_t = 1.0)]
        value: f32,
    },
    /// Block until a tactile sensor is pressed
    WaitTouch {
        /// Sensor key (overrides the config)
        #[arg(long)]
        sensor: Option<String>,
        /// Press the sensor on the simulated robot
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
    /// Manage known faces, then block until a face is recognized
    Face {
        /// Learn the face currently in view under this name
        #[arg(long)]
        learn: Vec<String>,
        /// Forget a previously learned person
        #[arg(long)]
        forget: Vec<String>,
        /// Show this person to the simulated camera
        #[arg(long)]
        show: Option<String>,
    },
    /// Block until a word from the vocabulary is recognized
    Word {
        /// Comma separated vocabulary (defaults to the config)
        #[arg(long, value_delimiter = ',')]
        vocab: Vec<String>,
        /// Say this word to the simulated microphones
        #[arg(long)]
        hear: Option<String>,
    },
    /// Greet, wait for a head touch, then repeat the next word heard
    Demo {
        /// Word spoken to the simulated microphones after the touch
        #[arg(long)]
        hear: Option<String>,
    },
}

fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!(error = ?err, "startup failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = BridgeConfig::load_or_default(cli.config.as_deref())?;
    if let Commands::WaitTouch {
        sensor: Some(sensor),
        ..
    } = &cli.command
    {
        config.touch_sensor = sensor.clone();
    }

    let platform = Arc::new(MockPlatform::new());
    let caps = platform.capabilities();
    let driver = StimulusDriver::start(
        platform.clone(),
        stimuli_for(&cli.command, &config),
        Duration::from_millis(config.stimulus_interval_ms),
    );
    info!(module = %config.module_name, "robot session started");

    let outcome = run_program(caps.tts.as_ref(), &config.error_phrase, || {
        let hal = Hal::new(&caps, &config)?;
        let result = execute(&hal, &cli.command, &config);
        let shutdown = hal.shutdown();
        result?;
        shutdown
    });
    driver.stop();

    for line in platform.spoken() {
        println!("robot said: {line}");
    }
    Ok(outcome.exit_code())
}

fn execute(hal: &Hal, command: &Commands, config: &BridgeConfig) -> Result<()> {
    match command {
        Commands::Say { text } => hal.say(text),
        Commands::Stiffness { chain, value } => hal.stiffness(chain, *value),
        Commands::WaitTouch { .. } => {
            let sensor = hal.wait_for_touch()?;
            println!("touched: {sensor}");
            Ok(())
        }
        Commands::Face { learn, forget, .. } => {
            for name in learn {
                let learned = hal.learn_face(name)?;
                println!("learn {name}: {}", if learned { "ok" } else { "refused" });
            }
            for name in forget {
                let forgotten = hal.forget_face(name)?;
                println!("forget {name}: {}", if forgotten { "ok" } else { "unknown" });
            }
            let label = hal.recognize_face()?;
            if label.is_empty() {
                println!("face: <unknown>");
            } else {
                println!("face: {label}");
            }
            Ok(())
        }
        Commands::Word { vocab, .. } => {
            let vocabulary = if vocab.is_empty() {
                config.vocabulary.clone()
            } else {
                vocab.clone()
            };
            let word = hal.recognize_word(&vocabulary)?;
            println!("word: {word} (vocabulary: {})", hal.vocabulary().join(", "));
            Ok(())
        }
        Commands::Demo { .. } => {
            let word = demo(hal, &config.vocabulary)?;
            println!("word: {word}");
            Ok(())
        }
    }
}

/// What the simulated world does while the command runs.
fn stimuli_for(command: &Commands, config: &BridgeConfig) -> Vec<Stimulus> {
    match command {
        Commands::WaitTouch { simulate: true, .. } => {
            vec![Stimulus::Touch(config.touch_sensor.clone())]
        }
        Commands::Face {
            show: Some(name), ..
        } => vec![Stimulus::Face(name.clone())],
        Commands::Word {
            hear: Some(word), ..
        } => vec![Stimulus::Word(word.clone())],
        Commands::Demo { hear } => {
            let mut stimuli = vec![Stimulus::Touch(config.touch_sensor.clone())];
            if let Some(word) = hear {
                stimuli.push(Stimulus::Word(word.clone()));
            }
            stimuli
        }
        _ => Vec::new(),
    }
}
