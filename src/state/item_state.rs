/// Item state definitions for tracking one work item through a worker
///
/// This module defines every state an item can occupy while its owning worker
/// processes it, and the transitions allowed between them.
use crate::ArchiveError;
use std::fmt;

/// Represents the current state of one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Item has been assigned but not yet examined
    Pending,

    /// A fetch attempt is in flight
    Fetching,

    /// The last attempt was rate limited; waiting before the next one
    RateLimited,

    /// The last attempt failed transiently; waiting before the next one
    TransientError,

    // ===== Terminal States =====
    /// Snapshot fetched and written to its destination
    Success,

    /// Destination already existed; nothing fetched
    Skipped,

    /// Snapshot service reported permanent absence (404)
    NotFound,

    /// Attempts exhausted or item unusable
    Error,
}

impl ItemState {
    /// Returns true if no further processing happens from this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Skipped | Self::NotFound | Self::Error
        )
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Pending        -> Skipped | Fetching | Error
    /// Fetching       -> Success | Skipped | NotFound | RateLimited | TransientError | Error
    /// RateLimited    -> Fetching | Error
    /// TransientError -> Fetching | Error
    /// ```
    ///
    /// `Pending -> Error` covers items that cannot be planned (bad timestamp,
    /// no filename); `Fetching -> Skipped` covers a destination claimed by
    /// another item while this one was in flight; `RateLimited -> Error`
    /// covers the optional rate-limit cap.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (self, next),
            (Pending, Skipped | Fetching | Error)
                | (
                    Fetching,
                    Success | Skipped | NotFound | RateLimited | TransientError | Error
                )
                | (RateLimited, Fetching | Error)
                | (TransientError, Fetching | Error)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: ItemState) -> Result<(), ArchiveError> {
        if !self.can_transition_to(next) {
            return Err(ArchiveError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::RateLimited => "rate_limited",
            Self::TransientError => "transient_error",
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
