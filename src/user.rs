// src/user.rs
//
// The stochastic dialog user.
//
// The user tracks its own slot beliefs and the agent's most recent action,
// samples an action kind from its policy table, and fleshes the kind out into
// a full action using the slots the agent named.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::actions::{AgentAction, UserAction, UserActionKind};
use crate::config::{DialogConfig, PolicyConfig};
use crate::policy::PolicyTable;
use crate::state::SlotArray;

/// The user in a dialog session.
#[derive(Debug, Clone)]
pub struct User {
    slots: SlotArray,
    last_system_act: Option<AgentAction>,
    policy: PolicyTable,
    num_slots: usize,
}

impl User {
    /// User following the handcrafted expert policy.
    pub fn handcrafted(dialog: &DialogConfig, policy: &PolicyConfig) -> Self {
        Self::with_policy(PolicyTable::handcrafted(policy), dialog)
    }

    /// User following a Dirichlet-sampled random policy.
    pub fn random(dialog: &DialogConfig, policy: &PolicyConfig, rng: &mut ChaCha8Rng) -> Self {
        Self::with_policy(PolicyTable::random(policy.dirichlet_alpha, rng), dialog)
    }

    /// User following an arbitrary policy table.
    pub fn with_policy(policy: PolicyTable, dialog: &DialogConfig) -> Self {
        Self {
            slots: SlotArray::new(dialog.num_slots),
            last_system_act: None,
            policy,
            num_slots: dialog.num_slots,
        }
    }

    /// Reset slot beliefs and dialog position, keeping the policy.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.last_system_act = None;
    }

    /// Replace the policy (used by the solvers between episodes).
    pub fn set_policy(&mut self, policy: PolicyTable) {
        self.policy = policy;
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Slot statuses as currently believed by the user.
    pub fn slots(&self) -> &SlotArray {
        &self.slots
    }

    /// Execute one user turn: record the agent's action, sample an action
    /// kind from the policy, build the full action, and update slot beliefs.
    pub fn take_turn(&mut self, system_act: &AgentAction, rng: &mut ChaCha8Rng) -> UserAction {
        self.last_system_act = Some(*system_act);
        let kind = self.policy.sample(system_act.kind(), rng);
        let action = self.build_action(kind, system_act, rng);
        self.update_state(&action, system_act);
        action
    }

    /// Attach slot ids to a sampled action kind.
    ///
    /// A provided slot targets whatever the agent just asked about, falling
    /// back to a uniformly random slot when the agent named nothing. Confirm
    /// and negate target the agent's confirmation slot, with the same random
    /// fallback so exploratory policies stay well-formed.
    fn build_action(
        &self,
        kind: UserActionKind,
        system_act: &AgentAction,
        rng: &mut ChaCha8Rng,
    ) -> UserAction {
        let random_slot = rng.gen_range(0..self.num_slots);
        match kind {
            UserActionKind::Silent => UserAction::Silent,
            UserActionKind::AllSlots => UserAction::AllSlots,
            UserActionKind::OneSlot => {
                UserAction::OneSlot(system_act.ask_id().unwrap_or(random_slot))
            }
            UserActionKind::Confirm => {
                UserAction::Confirm(system_act.confirm_id().unwrap_or(random_slot))
            }
            UserActionKind::Negate => {
                UserAction::Negate(system_act.confirm_id().unwrap_or(random_slot))
            }
            UserActionKind::Close => UserAction::Close,
        }
    }

    fn update_state(&mut self, action: &UserAction, system_act: &AgentAction) {
        match action {
            UserAction::Silent | UserAction::Close => {}
            UserAction::AllSlots => {
                for id in 0..self.num_slots {
                    self.slots.mark_obtained(id);
                }
            }
            UserAction::OneSlot(id) => {
                self.slots.mark_obtained(*id);
                // Answering the request half of an implicit confirmation also
                // affirms the slot being confirmed.
                if let AgentAction::ConfirmAsk { confirm, .. } = system_act {
                    self.slots.mark_confirmed(*confirm);
                }
            }
            UserAction::Confirm(id) => self.slots.mark_confirmed(*id),
            UserAction::Negate(id) => self.slots.mark_empty(*id),
        }
    }
}
