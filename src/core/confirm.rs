/// Two-step confirmation guarding a row's delete action.
///
/// ```text
/// Disarmed --trigger--> Armed --trigger--> Pending --settle--> Disarmed
///              Armed --reset--> Disarmed
/// ```
///
/// Reaching `Pending` is the moment the remove call is issued. `Pending`
/// ignores triggers and resets until the call settles; nothing is armed while
/// it waits, so a failed delete has to be armed again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmGate {
    #[default]
    Disarmed,
    Armed,
    Pending,
}

/// What the caller must do after feeding the gate a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    None,
    Remove,
}

/// Label state for the delete affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteLabel {
    Delete,
    Confirm,
    Deleting,
}

impl ConfirmGate {
    pub fn trigger(&mut self) -> GateAction {
        match self {
            Self::Disarmed => {
                *self = Self::Armed;
                GateAction::None
            }
            Self::Armed => {
                *self = Self::Pending;
                GateAction::Remove
            }
            Self::Pending => GateAction::None,
        }
    }

    /// The row's action menu was opened or closed.
    pub fn reset(&mut self) {
        if *self == Self::Armed {
            *self = Self::Disarmed;
        }
    }

    /// The remove call finished, successfully or not.
    pub fn settle(&mut self) {
        if *self == Self::Pending {
            *self = Self::Disarmed;
        }
    }

    pub fn label(&self) -> DeleteLabel {
        match self {
            Self::Disarmed => DeleteLabel::Delete,
            Self::Armed => DeleteLabel::Confirm,
            Self::Pending => DeleteLabel::Deleting,
        }
    }

    pub fn is_inert(&self) -> bool {
        *self == Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_trigger_only_arms() {
        let mut gate = ConfirmGate::default();
        assert_eq!(gate.trigger(), GateAction::None);
        assert_eq!(gate.label(), DeleteLabel::Confirm);
    }

    #[test]
    fn second_trigger_removes() {
        let mut gate = ConfirmGate::default();
        gate.trigger();
        assert_eq!(gate.trigger(), GateAction::Remove);
        assert_eq!(gate.label(), DeleteLabel::Deleting);
        assert!(gate.is_inert());
    }

    #[test]
    fn menu_toggle_between_triggers_disarms() {
        let mut gate = ConfirmGate::default();
        gate.trigger();
        gate.reset(); // close
        gate.reset(); // reopen
        assert_eq!(gate.trigger(), GateAction::None);
        assert_eq!(gate.label(), DeleteLabel::Confirm);
    }

    #[test]
    fn pending_ignores_triggers_and_resets() {
        let mut gate = ConfirmGate::Pending;
        assert_eq!(gate.trigger(), GateAction::None);
        gate.reset();
        assert_eq!(gate, ConfirmGate::Pending);
    }

    #[test]
    fn settle_returns_to_disarmed() {
        let mut gate = ConfirmGate::Pending;
        gate.settle();
        assert_eq!(gate, ConfirmGate::Disarmed);
        assert_eq!(gate.trigger(), GateAction::None);
    }

    #[test]
    fn settle_outside_pending_is_noop() {
        let mut gate = ConfirmGate::Armed;
        gate.settle();
        assert_eq!(gate, ConfirmGate::Armed);
    }
}
