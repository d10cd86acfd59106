use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use vocex_audio::{CpalRecorder, RodioDecoder, RodioPlayer};
use vocex_core::{Presenter, SessionError, StartSignal};
use vocex_experiment::{Sequencer, TaskConfig, builtin_catalog};
use vocex_timing::MonotonicClock;

/// Terminal rendering of the engine's display cues. Pure observer: the
/// sequencer decides what to show and when.
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show_prompt(&mut self) {
        println!("\n        (((  listen, then respond aloud  )))");
    }

    fn show_fixation(&mut self) {
        println!("\n                       +");
    }

    fn show_message(&mut self, text: &str) {
        println!("\n{text}");
    }
}

/// The designated start input: a line consisting of `5` (scanner-trigger
/// convention). Every other line is ignored.
struct TriggerKey;

impl StartSignal for TriggerKey {
    fn wait_for_start(&mut self) -> Result<(), SessionError> {
        println!("Press 5 and ENTER to begin.");
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line
                .map_err(|err| SessionError::Configuration(format!("start input closed: {err}")))?;
            if line.trim() == "5" {
                return Ok(());
            }
        }
        Err(SessionError::Configuration(
            "start input closed before the trigger".into(),
        ))
    }
}

fn prompt_for_id() -> Result<String> {
    print!("Participant id: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn load_task_config(path: Option<&PathBuf>) -> Result<TaskConfig> {
    match path {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("reading task config {}", path.display()))?;
            let config = serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing task config {}", path.display()))?;
            Ok(config)
        }
        None => Ok(TaskConfig::default()),
    }
}

pub fn run(
    id: Option<String>,
    assets: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
) -> Result<()> {
    let task = load_task_config(config.as_ref())?;
    let id = match id {
        Some(id) => id,
        None => prompt_for_id()?,
    };
    let session = task.session_for(&id)?;
    info!(
        participant = %session.participant_id,
        seed = session.seed,
        first_voice = %session.first_voice,
        capture_ms = session.capture_ms,
        iti_ms = session.iti_ms,
        "session configured"
    );

    let player = RodioPlayer::new().map_err(|err| anyhow!("audio output unavailable: {err}"))?;
    let recorder = CpalRecorder::new(session.sample_rate, session.channels);
    let clock = MonotonicClock::new();
    let mut sequencer = Sequencer::new(session, player, recorder, ConsolePresenter, clock);

    sequencer.prepare(&builtin_catalog(), &assets, &RodioDecoder)?;
    let result = sequencer.run(&mut TriggerKey)?;

    fs::create_dir_all(&output)
        .with_context(|| format!("creating output directory {}", output.display()))?;
    let bytes = vocex_export::package(&result, &sequencer.config)?;
    let path = output.join(vocex_export::bundle_name(&result.participant_id));
    fs::write(&path, bytes).with_context(|| format!("writing bundle {}", path.display()))?;

    println!(
        "\n{} trials exported to {}",
        result.records.len(),
        path.display()
    );
    Ok(())
}
