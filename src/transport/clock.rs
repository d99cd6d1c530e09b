// Clock thread - Runs one schedule in real time
// Absolute deadlines (start + sum of intervals) so timing does not drift; every
// wait is a deadline receive on the command channel so a stop is seen at once.

use super::event::BeatSink;
use super::live::SharedLiveTempo;
use super::state::{AtomicPlaybackState, PlaybackState, StopReason};
use crate::messaging::channels::{CommandReceiver, SharedNotificationProducer, notify};
use crate::messaging::{LoopCommand, NotificationKind};
use crate::sequencer::{PlaybackPosition, Schedule, Step};
use arc_swap::ArcSwapOption;
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything the clock thread owns for one run
pub(crate) struct ClockContext {
    pub schedule: Schedule,
    pub sink: Arc<dyn BeatSink>,
    pub commands: CommandReceiver,
    pub notifications: SharedNotificationProducer,
    pub live_tempo: SharedLiveTempo,
    pub live_version: u64,
    pub position: Arc<ArcSwapOption<PlaybackPosition>>,
    pub state: AtomicPlaybackState,
    pub auto_stop: Option<Duration>,
    pub tolerance: Duration,
}

/// Reports the end of a run when dropped, so an unwinding loop still ends `Stopped`
struct RunEnd {
    state: AtomicPlaybackState,
    notifications: SharedNotificationProducer,
    position: Arc<ArcSwapOption<PlaybackPosition>>,
    reason: Option<StopReason>,
}

impl Drop for RunEnd {
    fn drop(&mut self) {
        let reason = self.reason.unwrap_or(StopReason::Aborted);
        if self.reason.is_none() {
            log::error!("Clock thread unwound before the run ended");
        }

        self.position.store(None);
        self.state.set(PlaybackState::Stopped);
        log::info!("Playback ended: {}", reason);
        notify(&self.notifications, NotificationKind::Stopped(reason));
    }
}

impl ClockContext {
    /// Thread body. Signals `ready` once running, then plays until done or stopped.
    pub fn run(mut self, ready: Sender<()>) {
        // The controller waits on this before `start` returns
        let _ = ready.send(());

        let mut end = RunEnd {
            state: self.state.clone(),
            notifications: Arc::clone(&self.notifications),
            position: Arc::clone(&self.position),
            reason: None,
        };

        let start = Instant::now();
        let auto_stop_at = self.auto_stop.map(|after| start + after);
        let mut deadline = start;

        let reason = loop {
            // A step is only computed once its time has come, so live edits
            // made during the wait apply to it
            if let Err(reason) = self.wait_until(deadline, auto_stop_at) {
                break reason;
            }
            if let Some(bpm) = self.live_tempo.take_if_newer(&mut self.live_version) {
                if self.schedule.set_live_bpm(bpm) {
                    log::debug!("Live tempo applied: {:.1} BPM", bpm);
                }
            }

            match self.schedule.next_step() {
                Step::Beat {
                    event,
                    interval,
                    notices,
                } => {
                    self.check_lateness(deadline);
                    self.deliver(notices);
                    self.publish_position();
                    self.sink.on_beat(&event);
                    deadline += interval;
                }
                Step::Pause { duration, notices } => {
                    self.deliver(notices);
                    self.publish_position();
                    log::debug!("Pausing {:?} before the next song", duration);
                    deadline += duration;
                }
                Step::Finished { reason, notices } => {
                    self.deliver(notices);
                    break reason;
                }
            }
        };

        end.reason = Some(reason);
    }

    /// Sleeps until `deadline`. Err when a stop arrives or the auto-stop time passes.
    fn wait_until(
        &self,
        deadline: Instant,
        auto_stop_at: Option<Instant>,
    ) -> Result<(), StopReason> {
        let wake = match auto_stop_at {
            Some(at) if at < deadline => at,
            _ => deadline,
        };

        match self.commands.recv_deadline(wake) {
            Ok(LoopCommand::Stop(reason)) => return Err(reason),
            // Controller gone
            Err(RecvTimeoutError::Disconnected) => return Err(StopReason::UserRequested),
            Err(RecvTimeoutError::Timeout) => {}
        }

        if auto_stop_at.is_some_and(|at| Instant::now() >= at) {
            return Err(StopReason::AutoStop);
        }
        Ok(())
    }

    /// Reports a tick that woke up later than the tolerance. The tick still fires.
    fn check_lateness(&self, deadline: Instant) {
        let lateness = Instant::now().saturating_duration_since(deadline);
        if lateness > self.tolerance {
            log::debug!("Tick late by {:?}", lateness);
            notify(
                &self.notifications,
                NotificationKind::TimingDegraded { lateness },
            );
        }
    }

    fn deliver(&self, notices: Vec<NotificationKind>) {
        for notice in notices {
            notify(&self.notifications, notice);
        }
    }

    fn publish_position(&self) {
        self.position
            .store(Some(Arc::new(self.schedule.position())));
    }
}
