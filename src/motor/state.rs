//! Motor move state.

/// Where the motor is in its current move.
///
/// The declaration order is meaningful: every state after `Starting` is
/// producing pulses, and every state after `Run` is changing speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveState {
    /// No move in progress.
    #[default]
    Stopped,
    /// Move planned; the first phase is chosen on the next tick.
    Starting,
    /// Cruising at top speed.
    Run,
    /// Speeding up toward top speed.
    Accel,
    /// Slowing down toward the target.
    Decel,
}

impl MoveState {
    /// A move has been accepted and not yet finished.
    #[inline]
    pub fn is_active(self) -> bool {
        self != MoveState::Stopped
    }

    /// Pulses are being produced.
    #[inline]
    pub fn is_moving(self) -> bool {
        self > MoveState::Starting
    }

    /// Speed is changing.
    #[inline]
    pub fn is_ramping(self) -> bool {
        self > MoveState::Run
    }

    /// State name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            MoveState::Stopped => "Stopped",
            MoveState::Starting => "Starting",
            MoveState::Run => "Run",
            MoveState::Accel => "Accel",
            MoveState::Decel => "Decel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_predicates() {
        assert!(!MoveState::Stopped.is_active());
        assert!(MoveState::Starting.is_active());
        assert!(!MoveState::Starting.is_moving());
        assert!(MoveState::Run.is_moving());
        assert!(!MoveState::Run.is_ramping());
        assert!(MoveState::Accel.is_ramping());
        assert!(MoveState::Decel.is_ramping());
    }
}
