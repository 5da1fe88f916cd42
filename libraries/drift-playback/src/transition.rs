//! Transition scheduling policy
//!
//! Decides, from one player's settings and the loaded track, what single
//! mechanism will carry playback to the next track: a fade-out timer, an
//! interval timer, the channel's end notification, or nothing at all
//! (looping). Pure so every branch is testable without a clock.

use std::time::Duration;

use crate::scheduler::TimerAction;

/// Delay between a fade-out ramp finishing and the successor starting,
/// so the tail of the ramp is not clipped
pub const FADE_SETTLE: Duration = Duration::from_millis(50);

/// How the current track will hand over to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Timer to arm, as (action, delay from now); at most one
    pub timer: Option<(TimerAction, Duration)>,

    /// Whether the channel's end notification should be armed instead
    pub end_notification: bool,
}

impl TransitionPlan {
    const NONE: Self = Self {
        timer: None,
        end_notification: false,
    };
}

/// Plan the handover for a track with `remaining` playtime left
///
/// `remaining` and `interval` are what is *left* of the track duration
/// and the user interval; at track start that is the full values, after
/// a resume it is both minus the effective elapsed time.
///
/// Policy, first match wins:
/// 1. looping: nothing is armed, the channel repeats forever.
/// 2. usable fade (fade > 0 and remaining known and remaining > fade):
///    fade-out timer at `remaining - fade`, pulled earlier when the
///    interval is strictly sooner.
/// 3. interval set: interval timer.
/// 4. remaining known: end notification.
/// 5. otherwise: nothing (the track plays out unobserved).
pub fn plan_transition(
    looping: bool,
    remaining: Option<Duration>,
    fade: Duration,
    interval: Option<Duration>,
) -> TransitionPlan {
    if looping {
        return TransitionPlan::NONE;
    }

    if fade > Duration::ZERO {
        if let Some(remaining) = remaining {
            if remaining > fade {
                let fade_start = remaining - fade;
                let delay = match interval {
                    Some(interval) if interval < fade_start => interval,
                    _ => fade_start,
                };
                return TransitionPlan {
                    timer: Some((TimerAction::BeginFadeOut, delay)),
                    end_notification: false,
                };
            }
        }
        // Fall through: fade configured but unusable (unknown duration or
        // track shorter than the fade).
    }

    if let Some(interval) = interval {
        return TransitionPlan {
            timer: Some((TimerAction::IntervalExpired, interval)),
            end_notification: false,
        };
    }

    if remaining.is_some() {
        return TransitionPlan {
            timer: None,
            end_notification: true,
        };
    }

    TransitionPlan::NONE
}
