//! Lazy, time-driven activation of newly registered provider accounts.
//!
//! There is no scheduler: the pending → active move is resolved whenever the
//! account tries to authenticate.

use chrono::{DateTime, Duration, Utc};

use super::errors::DomainError;
use super::provider::ActivationState;

pub const DEFAULT_ACTIVATION_WINDOW_SECS: i64 = 60;
/// Thirty days.
pub const MAX_ACTIVATION_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Pending { remaining: Duration },
    /// `mutated` is set when the window just elapsed and the stored state
    /// still says pending.
    Active { mutated: bool },
    Inactive,
}

impl Resolution {
    /// Turn the resolution into the authentication verdict. `Ok(true)` means
    /// the caller must persist the activation.
    pub fn into_verdict(self) -> Result<bool, DomainError> {
        match self {
            Resolution::Pending { remaining } => Err(DomainError::AccountPendingVerification {
                remaining_seconds: whole_seconds_ceil(remaining),
            }),
            Resolution::Inactive => Err(DomainError::AccountInactive),
            Resolution::Active { mutated } => Ok(mutated),
        }
    }
}

pub fn resolve_state(
    state: ActivationState,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Resolution {
    match state {
        ActivationState::Inactive => Resolution::Inactive,
        ActivationState::Active => Resolution::Active { mutated: false },
        ActivationState::Pending => {
            let elapsed = now - created_at;
            if elapsed < window {
                Resolution::Pending {
                    remaining: window - elapsed,
                }
            } else {
                Resolution::Active { mutated: true }
            }
        }
    }
}

fn whole_seconds_ceil(d: Duration) -> i64 {
    let secs = d.num_seconds();
    if d > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}
