// src/agent.rs
//
// Handcrafted dialog-manager policy.
//
// The agent is fully deterministic apart from one Bernoulli draw deciding
// whether a confirmation is explicit or implicit. Dispatch is keyed by the
// user action kind; within each branch, by the agent's previous action kind.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::actions::{AgentAction, AgentActionKind, SlotId, UserAction};
use crate::config::DialogConfig;
use crate::state::SlotArray;

/// Fatal dialog protocol violations.
///
/// A violation signals a broken contract in the fixed designed protocol; it
/// terminates the session abnormally and is never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    /// A user action named a slot id outside `0..num_slots`.
    SlotOutOfRange { slot: SlotId, num_slots: usize },
}

impl std::fmt::Display for DialogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogError::SlotOutOfRange { slot, num_slots } => write!(
                f,
                "user action targets slot {} but the dialog has {} slots",
                slot, num_slots
            ),
        }
    }
}

impl std::error::Error for DialogError {}

/// The dialog agent ("dialog manager").
///
/// Tracks its own slot statuses and its previous action, and picks the next
/// action in response to the user via the handcrafted policy.
#[derive(Debug, Clone)]
pub struct Agent {
    state: SlotArray,
    prev_act: AgentAction,
    explicit_confirm_prob: f64,
}

impl Agent {
    pub fn new(cfg: &DialogConfig) -> Self {
        Self {
            state: SlotArray::new(cfg.num_slots),
            prev_act: AgentAction::Greet,
            explicit_confirm_prob: cfg.explicit_confirm_prob,
        }
    }

    /// Reset slot statuses and dialog position for a fresh session.
    pub fn reset(&mut self) {
        self.state.clear();
        self.prev_act = AgentAction::Greet;
    }

    /// Slot statuses as currently believed by the agent.
    pub fn slots(&self) -> &SlotArray {
        &self.state
    }

    /// The agent's most recent action.
    pub fn prev_action(&self) -> AgentAction {
        self.prev_act
    }

    /// Kick off the dialog; the agent always opens with a greeting.
    pub fn start_dialog(&mut self) -> AgentAction {
        self.prev_act = AgentAction::Greet;
        self.prev_act
    }

    /// Execute one agent turn: update slot state from the user's action and
    /// return (and remember) the agent's next action.
    pub fn take_turn(
        &mut self,
        user_act: &UserAction,
        rng: &mut ChaCha8Rng,
    ) -> Result<AgentAction, DialogError> {
        if let Some(slot) = user_act.slot_id() {
            if slot >= self.state.len() {
                return Err(DialogError::SlotOutOfRange {
                    slot,
                    num_slots: self.state.len(),
                });
            }
        }
        let next = match user_act {
            UserAction::Silent => self.handle_silence(),
            UserAction::OneSlot(slot) => self.handle_one_slot(*slot, rng),
            UserAction::AllSlots => self.handle_all_slots(),
            UserAction::Confirm(slot) => self.handle_confirmation(*slot),
            UserAction::Negate(slot) => self.handle_negation(*slot),
            UserAction::Close => AgentAction::Close,
        };
        self.prev_act = next;
        Ok(next)
    }

    /// Silence after a greeting moves the dialog forward; after a close the
    /// agent stays closed; anywhere else the agent retries its last action.
    fn handle_silence(&mut self) -> AgentAction {
        match self.prev_act.kind() {
            AgentActionKind::Greet => self.ask_confirm_or_close(),
            AgentActionKind::Close => AgentAction::Close,
            _ => self.prev_act,
        }
    }

    /// The slot marked obtained is the one the agent *requested*, not the one
    /// the user literally named; only after a greeting, where the agent named
    /// nothing, does the user's payload decide.
    fn handle_one_slot(&mut self, provided: SlotId, rng: &mut ChaCha8Rng) -> AgentAction {
        match self.prev_act {
            AgentAction::Greet => {
                self.state.mark_obtained(provided);
                self.confirm(rng)
            }
            AgentAction::AskSlot(asked) => {
                self.state.mark_obtained(asked);
                self.confirm(rng)
            }
            AgentAction::ConfirmAsk { confirm, ask } => {
                // Providing the requested slot doubles as an affirmation of
                // the slot being implicitly confirmed.
                self.state.mark_confirmed(confirm);
                self.state.mark_obtained(ask);
                self.confirm(rng)
            }
            AgentAction::Close => AgentAction::Close,
            // Explicit confirmation expects a confirm/negate, not a slot
            // value; recover by repeating.
            AgentAction::ExplicitConfirm(_) => self.prev_act,
        }
    }

    fn handle_all_slots(&mut self) -> AgentAction {
        match self.prev_act.kind() {
            AgentActionKind::Greet => {
                self.state.mark_all_obtained();
                self.ask_confirm_or_close()
            }
            AgentActionKind::Close => AgentAction::Close,
            AgentActionKind::ExplicitConfirm
            | AgentActionKind::AskSlot
            | AgentActionKind::ConfirmAsk => self.prev_act,
        }
    }

    fn handle_confirmation(&mut self, slot: SlotId) -> AgentAction {
        match self.prev_act.kind() {
            AgentActionKind::ExplicitConfirm | AgentActionKind::ConfirmAsk => {
                // Only a confirmation of the slot actually in question counts.
                if self.prev_act.confirm_id() == Some(slot) {
                    self.state.mark_confirmed(slot);
                    self.ask_confirm_or_close()
                } else {
                    self.prev_act
                }
            }
            AgentActionKind::Close => AgentAction::Close,
            AgentActionKind::Greet | AgentActionKind::AskSlot => self.prev_act,
        }
    }

    fn handle_negation(&mut self, slot: SlotId) -> AgentAction {
        match self.prev_act.kind() {
            AgentActionKind::ExplicitConfirm | AgentActionKind::ConfirmAsk => {
                if self.prev_act.confirm_id() == Some(slot) {
                    self.state.mark_empty(slot);
                    self.ask_confirm_or_close()
                } else {
                    self.prev_act
                }
            }
            AgentActionKind::Close => AgentAction::Close,
            AgentActionKind::Greet | AgentActionKind::AskSlot => self.prev_act,
        }
    }

    /// Ask for the lowest-id empty slot, or close when none remain.
    ///
    /// Simpler repertoire than `ask_confirm_or_close`, for drivers that skip
    /// the confirmation stage entirely.
    pub fn ask_or_close(&self) -> AgentAction {
        match self.state.first_empty() {
            Some(id) => AgentAction::AskSlot(id),
            None => AgentAction::Close,
        }
    }

    /// Ask for an empty slot; failing that, explicitly confirm an obtained
    /// slot; failing that, close.
    fn ask_confirm_or_close(&self) -> AgentAction {
        if let Some(id) = self.state.first_empty() {
            return AgentAction::AskSlot(id);
        }
        match self.state.first_unconfirmed() {
            Some(id) => AgentAction::ExplicitConfirm(id),
            None => AgentAction::Close,
        }
    }

    /// Confirm an unconfirmed slot, explicitly or implicitly per the
    /// configured Bernoulli split.
    fn confirm(&mut self, rng: &mut ChaCha8Rng) -> AgentAction {
        if rng.gen_bool(self.explicit_confirm_prob) {
            self.explicit_confirm()
        } else {
            self.implicit_confirm()
        }
    }

    fn explicit_confirm(&self) -> AgentAction {
        match self.state.first_unconfirmed() {
            Some(id) => AgentAction::ExplicitConfirm(id),
            None => self.ask_confirm_or_close(),
        }
    }

    /// Implicit confirmation needs an empty slot to ask about alongside the
    /// confirmation; without one, fall back to an explicit confirmation.
    fn implicit_confirm(&self) -> AgentAction {
        let empty = match self.state.first_empty() {
            Some(id) => id,
            None => return self.explicit_confirm(),
        };
        match self.state.first_unconfirmed() {
            Some(unconfirmed) => AgentAction::ConfirmAsk {
                confirm: unconfirmed,
                ask: empty,
            },
            None => self.explicit_confirm(),
        }
    }
}
