//! Refocus policy applied after find calls.
//!
//! Searching window contents pulls host focus away from the overlay, so the
//! overlay has to be refocused after every find. When a search has just
//! wrapped around (the active match is the last one) the host clears focus
//! late, and refocusing right away loses the race; the refocus is pushed back
//! by [`FOCUS_WRAP_DELAY`]. Embedded frames keep overlay focus on their own,
//! and refocusing there hands focus to an unrelated sibling frame instead.
use crate::capability::TargetKind;
use std::time::Duration;

/// Delay before refocusing the overlay after a wrap-around.
pub const FOCUS_WRAP_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDelay {
    /// Run on the next turn of the session loop.
    Immediate,
    After(Duration),
}

/// Decide how to refocus the overlay after a find on a target of `kind`.
///
/// ```
/// use inpage_search::capability::TargetKind;
/// use inpage_search::focus::{refocus_delay, FocusDelay, FOCUS_WRAP_DELAY};
///
/// assert_eq!(refocus_delay(TargetKind::Content, 1, 3), Some(FocusDelay::Immediate));
/// assert_eq!(refocus_delay(TargetKind::Content, 3, 3), Some(FocusDelay::After(FOCUS_WRAP_DELAY)));
/// assert_eq!(refocus_delay(TargetKind::Embedded, 3, 3), None);
/// ```
pub fn refocus_delay(kind: TargetKind, active: u32, total: u32) -> Option<FocusDelay> {
    match kind {
        TargetKind::Embedded => None,
        TargetKind::Content if total != 0 && active == total => {
            Some(FocusDelay::After(FOCUS_WRAP_DELAY))
        }
        TargetKind::Content => Some(FocusDelay::Immediate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_found_yet_refocuses_immediately() {
        assert_eq!(refocus_delay(TargetKind::Content, 0, 0), Some(FocusDelay::Immediate));
    }

    #[test]
    fn embedded_never_refocuses() {
        assert_eq!(refocus_delay(TargetKind::Embedded, 0, 0), None);
        assert_eq!(refocus_delay(TargetKind::Embedded, 1, 2), None);
    }
}
