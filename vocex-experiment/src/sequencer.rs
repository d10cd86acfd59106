use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info};
use vocex_cache::{CachedStimulus, StimulusCache};
use vocex_core::{
    AudioDecoder, PlannedTrial, Player, Presenter, Recorder, SessionConfig, SessionError,
    SessionResult, SessionState, StartSignal, StimulusItem, TrialPlan, TrialRecord,
};
use vocex_timing::Clock;

use crate::assemble::ResultAssembler;
use crate::order;

/// Drives the session state machine and every trial's timed sub-sequence.
///
/// This is the only component that advances time-driven state. It suspends
/// at exactly four points: awaiting the start signal, awaiting preload,
/// awaiting capture completion, and holding the ITI. Within a trial,
/// playback and capture run concurrently (capture is started immediately
/// after playback, not after it finishes); across trials everything is
/// strictly sequential.
pub struct Sequencer<P, R, V, C>
where
    P: Player,
    R: Recorder,
    V: Presenter,
    C: Clock,
{
    pub config: SessionConfig,
    pub state: SessionState,
    pub plan: Option<TrialPlan>,
    pub player: P,
    pub recorder: R,
    pub presenter: V,
    pub clock: C,
    cache: Option<StimulusCache>,
}

impl<P, R, V, C> Sequencer<P, R, V, C>
where
    P: Player,
    R: Recorder,
    V: Presenter,
    C: Clock,
{
    pub fn new(config: SessionConfig, player: P, recorder: R, presenter: V, clock: C) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            plan: None,
            player,
            recorder,
            presenter,
            clock,
            cache: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Build the trial order, preload every stimulus, and acquire the
    /// microphone. On success the session sits in `AwaitingStart`; on any
    /// failure it is terminally `Failed` and nothing was partially kept.
    pub fn prepare<D: AudioDecoder>(
        &mut self,
        catalog: &[StimulusItem],
        asset_root: &Path,
        decoder: &D,
    ) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle)?;

        self.state = SessionState::AwaitingOrder;
        let plan = match order::build_plan(catalog, &self.config) {
            Ok(plan) => plan,
            Err(err) => return self.fail(err),
        };
        info!(
            participant = %self.config.participant_id,
            trials = plan.len(),
            seed = self.config.seed,
            first_voice = %self.config.first_voice,
            "trial plan ready"
        );

        self.state = SessionState::Preloading;
        let cache = match StimulusCache::preload(&plan, asset_root, decoder) {
            Ok(cache) => cache,
            Err(err) => return self.fail(err),
        };
        if let Err(err) = self.recorder.open() {
            return self.fail(err);
        }

        self.plan = Some(plan);
        self.cache = Some(cache);
        self.state = SessionState::AwaitingStart;
        Ok(())
    }

    /// Run the session to completion. Suspends until the designated start
    /// input; time zero is the instant that signal is processed. Returns
    /// the complete dataset, or the terminal error — never a partial
    /// result.
    pub fn run<S: StartSignal>(&mut self, signal: &mut S) -> Result<SessionResult, SessionError> {
        self.expect_state(SessionState::AwaitingStart)?;
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => return self.fail(SessionError::Logic("no trial plan".into())),
        };

        self.presenter.show_message("Waiting for the start signal.");
        if let Err(err) = signal.wait_for_start() {
            return self.fail(err);
        }
        self.clock.restart();
        self.state = SessionState::Running;
        info!(participant = %self.config.participant_id, "session started");

        let mut assembler = ResultAssembler::new(&self.config);

        if self.config.lead_in_ms > 0 {
            self.presenter.show_fixation();
            self.clock.sleep(Duration::from_millis(self.config.lead_in_ms));
        }

        for (idx, trial) in plan.trials.iter().enumerate() {
            if let Err(err) = self.run_trial(idx + 1, trial, &mut assembler) {
                self.player.stop();
                return self.fail(err);
            }
        }

        if self.config.lead_out_ms > 0 {
            self.presenter.show_fixation();
            self.clock
                .sleep(Duration::from_millis(self.config.lead_out_ms));
        }

        self.presenter.show_message("Session complete. Thank you.");
        self.state = SessionState::Complete;
        info!(trials = assembler.len(), "session complete");
        Ok(assembler.finish())
    }

    /// One trial: Display → Playback+Capture → ITI. Playback and capture
    /// start back-to-back; the capture window is sized to outlast any
    /// stimulus, so nothing waits on playback completion.
    fn run_trial(
        &mut self,
        index: usize,
        trial: &PlannedTrial,
        assembler: &mut ResultAssembler,
    ) -> Result<(), SessionError> {
        let stimulus: CachedStimulus = {
            let cache = self
                .cache
                .as_ref()
                .ok_or_else(|| SessionError::Logic("stimulus cache missing".into()))?;
            cache
                .get(trial.voice, &trial.item.word)
                .cloned()
                .ok_or_else(|| {
                    SessionError::Logic(format!(
                        "asset for '{}' ({}) missing from preloaded cache",
                        trial.item.word, trial.voice
                    ))
                })?
        };

        self.presenter.show_prompt();

        self.player
            .start(&stimulus.clip)
            .map_err(|message| SessionError::Playback {
                asset: stimulus.asset.clone(),
                message,
            })?;
        let playback_onset_ns = self.clock.now_ns();
        let playback_end_ns = playback_onset_ns + stimulus.clip.duration().as_nanos() as u64;

        let capture_start_ns = self.clock.now_ns();
        let capture = self
            .recorder
            .capture_for(Duration::from_millis(self.config.capture_ms))?;
        let capture_end_ns = self.clock.now_ns();
        self.player.stop();

        self.presenter.show_fixation();
        self.clock.sleep(Duration::from_millis(self.config.iti_ms));

        let record = TrialRecord {
            index,
            attempt: trial.attempt,
            voice: trial.voice,
            word: trial.item.word.clone(),
            translation: trial.item.translation.clone(),
            word_id: trial.item.word_id,
            list: trial.item.list,
            playback_file: stimulus.asset,
            playback_onset_ns,
            playback_end_ns,
            capture_start_ns,
            capture_end_ns,
            iti_ms: self.config.iti_ms,
        };
        debug!(
            trial = index,
            word = %record.word,
            voice = %record.voice,
            onset_ms = record.playback_onset_ns / 1_000_000,
            "trial complete"
        );
        assembler.push(record, capture)
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::Logic(format!(
                "operation requires state {expected}, session is {}",
                self.state
            )))
        }
    }

    fn fail<T>(&mut self, err: SessionError) -> Result<T, SessionError> {
        error!(%err, "session failed");
        self.state = SessionState::Failed;
        Err(err)
    }
}
