//! Wall-clock playback of a transmission
//!
//! The sequencer itself has no clock. [`play`] drives
//! [`Session::advance`] from a tokio interval, one tick per period, until the
//! run completes or the cancellation token fires.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::sequencer::{Frame, TickOutcome};
use crate::session::Session;
use crate::types::SimulationResult;

/// How a playback ended
#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    /// Every tick played; the session now shows the result
    Completed(SimulationResult),
    /// Stopped by the token before the schedule ran out
    Cancelled { at_tick: usize },
    /// Nothing was in flight
    Idle,
}

/// Play the session's in-flight run, calling `on_frame` for every tick
///
/// The first tick fires one full period after the call, matching a timer
/// started when the user presses send. A late timer delays later ticks rather
/// than bursting to catch up.
pub async fn play<F>(session: &mut Session, period: Duration, token: &CancellationToken, mut on_frame: F) -> Playback
where
    F: FnMut(&Frame),
{
    let Some(run_id) = session.in_flight().map(|t| t.run_id()) else {
        return Playback::Idle;
    };

    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(%run_id, period_ms = period.as_millis() as u64, "Playback started");

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                let at_tick = session.in_flight().map(|t| t.current_tick()).unwrap_or_default();
                session.cancel();
                info!(%run_id, at_tick, "Playback cancelled");
                return Playback::Cancelled { at_tick };
            }
            _ = interval.tick() => {
                match session.advance() {
                    Some(TickOutcome::Frame(frame)) => on_frame(&frame),
                    Some(TickOutcome::Complete(outcome)) => {
                        debug!(%run_id, success = outcome.result.success, "Playback finished");
                        return Playback::Completed(outcome.result);
                    }
                    // Cancelled from elsewhere between ticks
                    Some(TickOutcome::Finished) | None => return Playback::Idle,
                }
            }
        }
    }
}
