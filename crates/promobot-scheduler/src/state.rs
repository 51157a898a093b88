//! The job state machine, as a pure transition function.
//!
//! Keeping this as a standalone table makes the legality of every command
//! checkable without touching the runtime, and gives the audit log a single
//! source of truth for from/to pairs.

use crate::types::JobState;

/// Everything that can move a job between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    /// Start or Resume command (or the auto-start when SAFE_MODE is off).
    Start,
    Pause,
    Stop,
    /// The posting loop observed the stop signal and exited cleanly.
    LoopExited,
    /// Schedule exhausted: `once` finished its attempt, or `interval`
    /// reached `max_repeats`.
    Exhausted,
    /// A permanent send error ended the job.
    Fatal,
}

/// Compute the state a job moves to on `event`, or `None` when the
/// transition is illegal. Terminal states are absorbing.
pub fn next_state(from: JobState, event: JobEvent) -> Option<JobState> {
    use JobEvent::*;
    use JobState::*;

    match (from, event) {
        (Queued, Start) => Some(Running),
        (Queued, Stop) => Some(Stopped),

        (Running, Pause) => Some(Paused),
        (Running, Stop) => Some(Stopping),
        (Running, Exhausted) => Some(Completed),
        (Running, Fatal) => Some(Failed),

        (Paused, Start) => Some(Running),
        (Paused, Stop) => Some(Stopping),
        // A pause command can land while the final attempt is in flight; the
        // attempt is allowed to finish and may exhaust the schedule.
        (Paused, Exhausted) => Some(Completed),
        (Paused, Fatal) => Some(Failed),

        (Stopping, LoopExited) => Some(Stopped),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobEvent::*;
    use JobState::*;

    const ALL_STATES: [JobState; 7] =
        [Queued, Running, Paused, Stopping, Stopped, Completed, Failed];
    const ALL_EVENTS: [JobEvent; 6] = [Start, Pause, Stop, LoopExited, Exhausted, Fatal];

    #[test]
    fn terminal_states_are_absorbing() {
        for state in [Stopped, Completed, Failed] {
            for event in ALL_EVENTS {
                assert_eq!(next_state(state, event), None, "{state} must absorb {event:?}");
            }
        }
    }

    #[test]
    fn queued_job_can_only_start_or_stop() {
        assert_eq!(next_state(Queued, Start), Some(Running));
        assert_eq!(next_state(Queued, Stop), Some(Stopped));
        assert_eq!(next_state(Queued, Pause), None);
        assert_eq!(next_state(Queued, Exhausted), None);
    }

    #[test]
    fn stop_from_live_states_goes_through_stopping() {
        assert_eq!(next_state(Running, Stop), Some(Stopping));
        assert_eq!(next_state(Paused, Stop), Some(Stopping));
        assert_eq!(next_state(Stopping, LoopExited), Some(Stopped));
    }

    #[test]
    fn pause_resume_cycle() {
        assert_eq!(next_state(Running, Pause), Some(Paused));
        assert_eq!(next_state(Paused, Start), Some(Running));
        // Pausing a paused job is not a transition.
        assert_eq!(next_state(Paused, Pause), None);
    }

    #[test]
    fn no_transition_skips_stopping_on_the_stop_path() {
        // The only way into Stopped from a live loop is via Stopping.
        assert_eq!(next_state(Running, LoopExited), None);
        assert_eq!(next_state(Paused, LoopExited), None);
    }

    #[test]
    fn every_transition_stays_within_the_defined_states() {
        for from in ALL_STATES {
            for event in ALL_EVENTS {
                if let Some(to) = next_state(from, event) {
                    assert_ne!(from, to, "self-transitions are not defined");
                    assert!(ALL_STATES.contains(&to));
                }
            }
        }
    }
}
