// src/actions.rs
//
// Symbolic actions for the slot-filling dialog protocol.
//
// Both sides exchange tagged actions carrying slot-id payloads. State-machine
// dispatch and the feature map only ever look at the kind (variant tag); the
// payload ids say which slot an action targets.

use serde::{Deserialize, Serialize};

/// Identifier of a slot, in `0..num_slots`.
pub type SlotId = usize;

/// Number of distinct agent action kinds.
pub const NUM_AGENT_KINDS: usize = 5;

/// Number of distinct user action kinds.
pub const NUM_USER_KINDS: usize = 6;

/// Variant tag of an [`AgentAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentActionKind {
    Greet,
    AskSlot,
    ExplicitConfirm,
    ConfirmAsk,
    Close,
}

impl AgentActionKind {
    /// Fixed enumeration order shared by policy tables and the feature map.
    pub const ALL: [AgentActionKind; NUM_AGENT_KINDS] = [
        AgentActionKind::Greet,
        AgentActionKind::AskSlot,
        AgentActionKind::ExplicitConfirm,
        AgentActionKind::ConfirmAsk,
        AgentActionKind::Close,
    ];

    /// Index of this kind in [`AgentActionKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            AgentActionKind::Greet => 0,
            AgentActionKind::AskSlot => 1,
            AgentActionKind::ExplicitConfirm => 2,
            AgentActionKind::ConfirmAsk => 3,
            AgentActionKind::Close => 4,
        }
    }

    /// Stable lowercase name (used in logs and CLI output).
    pub fn as_str(self) -> &'static str {
        match self {
            AgentActionKind::Greet => "greet",
            AgentActionKind::AskSlot => "ask_slot",
            AgentActionKind::ExplicitConfirm => "explicit_confirm",
            AgentActionKind::ConfirmAsk => "confirm_and_ask",
            AgentActionKind::Close => "close",
        }
    }
}

/// Variant tag of a [`UserAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserActionKind {
    Silent,
    AllSlots,
    OneSlot,
    Confirm,
    Negate,
    Close,
}

impl UserActionKind {
    /// Fixed enumeration order shared by policy tables and the feature map.
    pub const ALL: [UserActionKind; NUM_USER_KINDS] = [
        UserActionKind::Silent,
        UserActionKind::AllSlots,
        UserActionKind::OneSlot,
        UserActionKind::Confirm,
        UserActionKind::Negate,
        UserActionKind::Close,
    ];

    /// Index of this kind in [`UserActionKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            UserActionKind::Silent => 0,
            UserActionKind::AllSlots => 1,
            UserActionKind::OneSlot => 2,
            UserActionKind::Confirm => 3,
            UserActionKind::Negate => 4,
            UserActionKind::Close => 5,
        }
    }

    /// Stable lowercase name (used in logs and CLI output).
    pub fn as_str(self) -> &'static str {
        match self {
            UserActionKind::Silent => "silent",
            UserActionKind::AllSlots => "provide-all-slots",
            UserActionKind::OneSlot => "provide-one-slot",
            UserActionKind::Confirm => "confirm",
            UserActionKind::Negate => "negate",
            UserActionKind::Close => "close",
        }
    }
}

/// A move by the dialog agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentAction {
    /// Open the dialog.
    Greet,
    /// Request the value of one slot.
    AskSlot(SlotId),
    /// Ask the user to confirm one slot, expecting confirm/negate.
    ExplicitConfirm(SlotId),
    /// Implicitly confirm one slot while requesting another.
    ConfirmAsk { confirm: SlotId, ask: SlotId },
    /// Terminate the dialog.
    Close,
}

impl AgentAction {
    pub fn kind(&self) -> AgentActionKind {
        match self {
            AgentAction::Greet => AgentActionKind::Greet,
            AgentAction::AskSlot(_) => AgentActionKind::AskSlot,
            AgentAction::ExplicitConfirm(_) => AgentActionKind::ExplicitConfirm,
            AgentAction::ConfirmAsk { .. } => AgentActionKind::ConfirmAsk,
            AgentAction::Close => AgentActionKind::Close,
        }
    }

    /// Slot being requested by this action, if any.
    pub fn ask_id(&self) -> Option<SlotId> {
        match self {
            AgentAction::AskSlot(id) => Some(*id),
            AgentAction::ConfirmAsk { ask, .. } => Some(*ask),
            _ => None,
        }
    }

    /// Slot being confirmed by this action, if any.
    pub fn confirm_id(&self) -> Option<SlotId> {
        match self {
            AgentAction::ExplicitConfirm(id) => Some(*id),
            AgentAction::ConfirmAsk { confirm, .. } => Some(*confirm),
            _ => None,
        }
    }
}

/// A move by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAction {
    /// Say nothing this turn.
    Silent,
    /// Provide values for every slot at once.
    AllSlots,
    /// Provide the value of a single slot.
    OneSlot(SlotId),
    /// Affirm the slot the agent asked to confirm.
    Confirm(SlotId),
    /// Reject the slot the agent asked to confirm.
    Negate(SlotId),
    /// Terminate the dialog.
    Close,
}

impl UserAction {
    pub fn kind(&self) -> UserActionKind {
        match self {
            UserAction::Silent => UserActionKind::Silent,
            UserAction::AllSlots => UserActionKind::AllSlots,
            UserAction::OneSlot(_) => UserActionKind::OneSlot,
            UserAction::Confirm(_) => UserActionKind::Confirm,
            UserAction::Negate(_) => UserActionKind::Negate,
            UserAction::Close => UserActionKind::Close,
        }
    }

    /// Slot this action targets, if any.
    pub fn slot_id(&self) -> Option<SlotId> {
        match self {
            UserAction::OneSlot(id) | UserAction::Confirm(id) | UserAction::Negate(id) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_indices_match_enumeration_order() {
        for (i, kind) in AgentActionKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        for (i, kind) in UserActionKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn payload_accessors() {
        let act = AgentAction::ConfirmAsk { confirm: 1, ask: 2 };
        assert_eq!(act.kind(), AgentActionKind::ConfirmAsk);
        assert_eq!(act.confirm_id(), Some(1));
        assert_eq!(act.ask_id(), Some(2));

        assert_eq!(AgentAction::AskSlot(0).ask_id(), Some(0));
        assert_eq!(AgentAction::Greet.ask_id(), None);
        assert_eq!(UserAction::Negate(2).slot_id(), Some(2));
        assert_eq!(UserAction::AllSlots.slot_id(), None);
    }
}
