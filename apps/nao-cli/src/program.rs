use anyhow::Result;
use robot_platform::TextToSpeech;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::hal::Hal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// Run a robot behavior. On failure the error is logged and the robot speaks
/// `error_phrase` so someone standing next to it knows the program stopped.
pub fn run_program(
    tts: &dyn TextToSpeech,
    error_phrase: &str,
    body: impl FnOnce() -> Result<()>,
) -> Outcome {
    match body() {
        Ok(()) => {
            info!("program completed");
            Outcome::Completed
        }
        Err(err) => {
            error!(error = ?err, "program failed");
            if let Err(say_err) = tts.say(error_phrase) {
                warn!(error = %say_err, "could not announce failure");
            }
            Outcome::Failed
        }
    }
}

/// Stiffen up, greet, wait for a head touch, then repeat the next word heard.
pub fn demo(hal: &Hal, vocabulary: &[String]) -> Result<String> {
    hal.stiffness("Body", 1.0)?;
    hal.say("Hello")?;
    let sensor = hal.wait_for_touch()?;
    info!(sensor = %sensor, "touched");
    let word = hal.recognize_word(vocabulary)?;
    hal.say(&word)?;
    Ok(word)
}
