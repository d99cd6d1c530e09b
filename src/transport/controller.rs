// Playback controller - start/stop/cancel and live tempo for the clock thread
// The caller never touches the running schedule: it only sends commands and
// swaps snapshots.

use super::clock::ClockContext;
use super::event::BeatSink;
use super::live::{LiveTempoControl, SharedLiveTempo};
use super::state::{AtomicPlaybackState, PlaybackState, StopReason};
use crate::config::{EngineConfig, MAX_WAIT_SECONDS};
use crate::error::{ConfigurationError, PlaybackError, validate_bpm};
use crate::messaging::channels::{
    CommandSender, SharedNotificationProducer, create_command_channel,
    create_notification_channel, notify,
};
use crate::messaging::{ConcurrencyMisuse, LoopCommand, NotificationConsumer, NotificationKind};
use crate::sequencer::{PlaybackPosition, PlaybackTarget, Schedule, TempoRampConfig};
use arc_swap::ArcSwapOption;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const CLOCK_THREAD_NAME: &str = "metronome-clock";

/// Only stop commands travel on the channel; a few slots are plenty
const COMMAND_CAPACITY: usize = 4;

/// Per-run options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Stop automatically after this many seconds (0 = run until stopped)
    pub auto_stop_after_seconds: f64,
    pub ramp: TempoRampConfig,
}

impl PlaybackOptions {
    pub fn with_auto_stop(mut self, seconds: f64) -> Self {
        self.auto_stop_after_seconds = seconds;
        self
    }

    pub fn with_ramp(mut self, ramp: TempoRampConfig) -> Self {
        self.ramp = ramp;
        self
    }

    fn auto_stop(&self) -> Result<Option<Duration>, ConfigurationError> {
        let seconds = self.auto_stop_after_seconds;
        if !(0.0..=MAX_WAIT_SECONDS).contains(&seconds) {
            return Err(ConfigurationError::InvalidAutoStop(seconds));
        }
        Ok((seconds > 0.0).then(|| Duration::from_secs_f64(seconds)))
    }
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            auto_stop_after_seconds: 0.0,
            ramp: TempoRampConfig::default(),
        }
    }
}

/// Clock thread of the current (or last) run
struct ActiveRun {
    commands: CommandSender,
    handle: JoinHandle<()>,
    basic: bool,
}

/// Top-level playback state machine
pub struct PlaybackController {
    sink: Arc<dyn BeatSink>,
    config: EngineConfig,
    state: AtomicPlaybackState,
    notifications: SharedNotificationProducer,
    live_tempo: SharedLiveTempo,
    position: Arc<ArcSwapOption<PlaybackPosition>>,
    run: Option<ActiveRun>,
}

impl PlaybackController {
    /// Creates an idle controller. The consumer receives every notification.
    pub fn new(sink: Arc<dyn BeatSink>, config: EngineConfig) -> (Self, NotificationConsumer) {
        let (producer, consumer) = create_notification_channel(config.notification_capacity);
        let controller = Self {
            sink,
            config,
            state: AtomicPlaybackState::default(),
            notifications: Arc::new(Mutex::new(producer)),
            live_tempo: Arc::new(LiveTempoControl::new(0.0)),
            position: Arc::new(ArcSwapOption::empty()),
            run: None,
        };
        (controller, consumer)
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state() == PlaybackState::Running
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Latest position published by the clock thread (None when not playing)
    pub fn position(&self) -> Option<PlaybackPosition> {
        self.position.load_full().map(|position| *position)
    }

    /// Validates `target` and starts playing it on a new clock thread.
    ///
    /// Returns once the thread is running. Starting while a run is active is
    /// ignored with a warning.
    pub fn start(
        &mut self,
        target: PlaybackTarget,
        options: PlaybackOptions,
    ) -> Result<(), PlaybackError> {
        let auto_stop = options.auto_stop()?;
        let basic = target.is_basic();
        let schedule = Schedule::new(target, options.ramp)?;

        if self.state() == PlaybackState::Running {
            self.report_misuse(ConcurrencyMisuse::AlreadyRunning);
            return Ok(());
        }
        // A cancelled or finished run is reaped before the new one starts
        self.join_run();

        let (commands_tx, commands_rx) = create_command_channel(COMMAND_CAPACITY);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let context = ClockContext {
            schedule,
            sink: Arc::clone(&self.sink),
            commands: commands_rx,
            notifications: Arc::clone(&self.notifications),
            live_tempo: Arc::clone(&self.live_tempo),
            live_version: self.live_tempo.version(),
            position: Arc::clone(&self.position),
            state: self.state.clone(),
            auto_stop,
            tolerance: self.config.timing_tolerance(),
        };

        self.state.set(PlaybackState::Running);
        let spawned = thread::Builder::new()
            .name(CLOCK_THREAD_NAME.to_string())
            .spawn(move || context.run(ready_tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.state.set(PlaybackState::Stopped);
                return Err(PlaybackError::Spawn(e));
            }
        };

        if ready_rx.recv().is_err() {
            let _ = handle.join();
            self.state.set(PlaybackState::Stopped);
            return Err(PlaybackError::LoopNotStarted);
        }

        log::info!("Playback started");
        self.run = Some(ActiveRun {
            commands: commands_tx,
            handle,
            basic,
        });
        Ok(())
    }

    /// Stops the active run and waits for the clock thread to exit.
    /// No beat is emitted after this returns.
    pub fn stop(&mut self) {
        if !self.state().is_active() {
            self.report_misuse(ConcurrencyMisuse::NotRunning);
            self.join_run();
            return;
        }

        let Some(run) = self.run.take() else {
            return;
        };
        if run.handle.thread().id() == thread::current().id() {
            // Called from the sink on the clock thread: joining would deadlock
            self.signal(&run, StopReason::UserRequested);
            self.run = Some(run);
            return;
        }

        self.signal(&run, StopReason::UserRequested);
        self.finish_run(run);
    }

    /// Asks the active run to stop without waiting for it
    pub fn cancel(&self) {
        match &self.run {
            Some(run) if self.state().is_active() => self.signal(run, StopReason::Cancelled),
            _ => self.report_misuse(ConcurrencyMisuse::NotRunning),
        }
    }

    /// Changes the tempo of a running basic-mode playback at the next tick
    pub fn set_live_bpm(&self, bpm: f64) -> Result<(), ConfigurationError> {
        validate_bpm(bpm)?;

        let basic_run = self.run.as_ref().is_some_and(|run| run.basic);
        if !basic_run || self.state() != PlaybackState::Running {
            self.report_misuse(ConcurrencyMisuse::LiveBpmUnavailable);
            return Ok(());
        }
        self.live_tempo.update(bpm);
        Ok(())
    }

    fn signal(&self, run: &ActiveRun, reason: StopReason) {
        if self.state.transition(PlaybackState::Running, PlaybackState::Stopping) {
            log::debug!("Stop requested ({})", reason);
        }
        // A full channel already holds a stop; a closed one means the loop is gone
        let _ = run.commands.try_send(LoopCommand::Stop(reason));
    }

    fn join_run(&mut self) {
        if let Some(run) = self.run.take() {
            self.finish_run(run);
        }
    }

    fn finish_run(&mut self, run: ActiveRun) {
        if run.handle.join().is_err() {
            log::warn!("Clock thread panicked");
        }
        self.state.set(PlaybackState::Stopped);
        self.position.store(None);
    }

    fn report_misuse(&self, misuse: ConcurrencyMisuse) {
        log::warn!("Ignored playback command: {}", misuse);
        notify(&self.notifications, NotificationKind::Misuse(misuse));
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            self.signal(&run, StopReason::UserRequested);
            self.finish_run(run);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::TimingConfig;
    use ringbuf::traits::Consumer;

    fn silent_controller() -> (PlaybackController, NotificationConsumer) {
        PlaybackController::new(Arc::new(|_: &crate::transport::BeatEvent| {}), EngineConfig::default())
    }

    fn drain(consumer: &mut NotificationConsumer) -> Vec<NotificationKind> {
        std::iter::from_fn(|| consumer.try_pop()).map(|n| n.kind).collect()
    }

    #[test]
    fn test_initial_state() {
        let (controller, _) = silent_controller();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.position().is_none());
    }

    #[test]
    fn test_invalid_start_is_rejected_synchronously() {
        let (mut controller, _) = silent_controller();
        let result = controller.start(
            PlaybackTarget::basic(TimingConfig::new(5.0, 4, 1)),
            PlaybackOptions::default(),
        );
        assert!(matches!(
            result,
            Err(PlaybackError::Configuration(ConfigurationError::BpmOutOfRange(_)))
        ));
        assert_eq!(controller.state(), PlaybackState::Idle);

        let result = controller.start(
            PlaybackTarget::basic(TimingConfig::default()),
            PlaybackOptions::default().with_auto_stop(-1.0),
        );
        assert!(matches!(
            result,
            Err(PlaybackError::Configuration(ConfigurationError::InvalidAutoStop(_)))
        ));
    }

    #[test]
    fn test_stop_without_run_warns() {
        let (mut controller, mut consumer) = silent_controller();
        controller.stop();
        controller.cancel();
        assert_eq!(
            drain(&mut consumer),
            vec![
                NotificationKind::Misuse(ConcurrencyMisuse::NotRunning),
                NotificationKind::Misuse(ConcurrencyMisuse::NotRunning)
            ]
        );
    }

    #[test]
    fn test_live_bpm_validation() {
        let (controller, mut consumer) = silent_controller();
        assert_eq!(
            controller.set_live_bpm(400.0),
            Err(ConfigurationError::BpmOutOfRange(400.0))
        );
        assert_eq!(controller.set_live_bpm(100.0), Ok(()));
        assert_eq!(
            drain(&mut consumer),
            vec![NotificationKind::Misuse(ConcurrencyMisuse::LiveBpmUnavailable)]
        );
    }

    #[test]
    fn test_options_auto_stop() {
        assert_eq!(PlaybackOptions::default().auto_stop(), Ok(None));
        assert_eq!(
            PlaybackOptions::default().with_auto_stop(1.5).auto_stop(),
            Ok(Some(Duration::from_millis(1500)))
        );
        assert!(
            PlaybackOptions::default()
                .with_auto_stop(f64::INFINITY)
                .auto_stop()
                .is_err()
        );
        assert_eq!(
            PlaybackOptions::default().with_auto_stop(1e20).auto_stop(),
            Err(ConfigurationError::InvalidAutoStop(1e20))
        );
        assert!(
            PlaybackOptions::default()
                .with_auto_stop(MAX_WAIT_SECONDS)
                .auto_stop()
                .is_ok()
        );
    }

    #[test]
    fn test_start_rejects_huge_auto_stop() {
        let (mut controller, _) = silent_controller();
        let result = controller.start(
            PlaybackTarget::basic(TimingConfig::default()),
            PlaybackOptions::default().with_auto_stop(1e20),
        );
        assert!(matches!(
            result,
            Err(PlaybackError::Configuration(ConfigurationError::InvalidAutoStop(_)))
        ));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }
}
