// src/session.rs
//
// A single dialog session between agent and user.
//
// The agent opens with a greeting; the two sides then alternate until both
// have closed. Every user turn appends a (previous-agent-kind, user-kind)
// pair to the trace, which is what the feature map consumes downstream.

use rand_chacha::ChaCha8Rng;

use crate::actions::{AgentAction, AgentActionKind, UserActionKind};
use crate::agent::{Agent, DialogError};
use crate::user::User;

/// Per-turn log of (agent state the user saw, user action kind) pairs.
pub type DialogTrace = Vec<(AgentActionKind, UserActionKind)>;

/// Orchestrates alternating turns between one user and one agent.
///
/// Sessions are single-shot: restart by resetting both participants and
/// constructing a new session.
pub struct DialogSession<'a> {
    user: &'a mut User,
    agent: &'a mut Agent,
    trace: DialogTrace,
    prev_agent_act: Option<AgentAction>,
}

impl<'a> DialogSession<'a> {
    pub fn new(user: &'a mut User, agent: &'a mut Agent) -> Self {
        Self {
            user,
            agent,
            trace: DialogTrace::new(),
            prev_agent_act: None,
        }
    }

    /// Run the session to completion and return the trace.
    ///
    /// The session ends once both sides have closed. After an agent-initiated
    /// close the final trace entry records the user's reaction to it; a
    /// user-initiated close ends the session as soon as the agent answers it,
    /// with no further user turn.
    pub fn run(mut self, rng: &mut ChaCha8Rng) -> Result<DialogTrace, DialogError> {
        let mut agent_act = self.agent.start_dialog();
        let mut last_user: Option<UserActionKind> = None;
        while !(last_user == Some(UserActionKind::Close)
            && agent_act.kind() == AgentActionKind::Close)
        {
            let user_act = self.user.take_turn(&agent_act, rng);
            self.trace.push((agent_act.kind(), user_act.kind()));
            last_user = Some(user_act.kind());

            if agent_act.kind() == AgentActionKind::Close {
                break;
            }
            agent_act = self.agent.take_turn(&user_act, rng)?;
        }
        Ok(self.trace)
    }

    /// Have the agent make the opening move; used by step-wise drivers.
    pub fn start(&mut self) -> AgentActionKind {
        let act = self.agent.start_dialog();
        self.prev_agent_act = Some(act);
        act.kind()
    }

    /// Execute one protocol step: the user responds to the last agent action,
    /// then the agent responds to the user.
    ///
    /// Returns the pair of action kinds (user, next agent). Call [`start`]
    /// first.
    ///
    /// [`start`]: DialogSession::start
    pub fn step(
        &mut self,
        rng: &mut ChaCha8Rng,
    ) -> Result<(UserActionKind, AgentActionKind), DialogError> {
        let agent_act = self
            .prev_agent_act
            .expect("step called before start");
        let user_act = self.user.take_turn(&agent_act, rng);
        self.trace.push((agent_act.kind(), user_act.kind()));

        let next = self.agent.take_turn(&user_act, rng)?;
        self.prev_agent_act = Some(next);
        Ok((user_act.kind(), next.kind()))
    }

    /// Trace accumulated so far.
    pub fn trace(&self) -> &DialogTrace {
        &self.trace
    }
}

/// Reset both participants and run one complete session.
///
/// The canonical entry point used by the learners, statistics collectors,
/// and the CLI.
pub fn run_session(
    user: &mut User,
    agent: &mut Agent,
    rng: &mut ChaCha8Rng,
) -> Result<DialogTrace, DialogError> {
    user.reset();
    agent.reset();
    DialogSession::new(user, agent).run(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DialogConfig, PolicyConfig};
    use crate::policy::{PolicyTable, ValueTable};
    use rand::SeedableRng;

    #[test]
    fn handcrafted_session_terminates_with_mutual_close() {
        let dialog = DialogConfig::default();
        let mut user = User::handcrafted(&dialog, &PolicyConfig::default());
        let mut agent = Agent::new(&dialog);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        for _ in 0..50 {
            let trace = run_session(&mut user, &mut agent, &mut rng).unwrap();
            let (last_state, last_action) = *trace.last().unwrap();
            assert_eq!(last_state, AgentActionKind::Close);
            assert_eq!(last_action, UserActionKind::Close);
        }
    }

    #[test]
    fn user_initiated_close_ends_without_an_extra_turn() {
        let dialog = DialogConfig::default();

        // Greedy policy that closes in every state.
        let mut values = ValueTable::zeros();
        for state in crate::actions::AgentActionKind::ALL {
            values.set(state, UserActionKind::Close, 1.0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let policy = PolicyTable::from_q_values(&values, 0.0, &mut rng);
        let mut user = User::with_policy(policy, &dialog);
        let mut agent = Agent::new(&dialog);

        // The user closes on the greeting; the agent answers with a close and
        // the session is over, with no user reaction to that close.
        let trace = run_session(&mut user, &mut agent, &mut rng).unwrap();
        assert_eq!(
            trace,
            vec![(AgentActionKind::Greet, UserActionKind::Close)]
        );
    }

    #[test]
    fn traces_are_deterministic_under_a_fixed_seed() {
        let dialog = DialogConfig::default();
        let policy = PolicyConfig::default();

        let mut user1 = User::handcrafted(&dialog, &policy);
        let mut agent1 = Agent::new(&dialog);
        let mut rng1 = ChaCha8Rng::seed_from_u64(1234);
        let trace1 = run_session(&mut user1, &mut agent1, &mut rng1).unwrap();

        let mut user2 = User::handcrafted(&dialog, &policy);
        let mut agent2 = Agent::new(&dialog);
        let mut rng2 = ChaCha8Rng::seed_from_u64(1234);
        let trace2 = run_session(&mut user2, &mut agent2, &mut rng2).unwrap();

        assert_eq!(trace1, trace2);
    }

    #[test]
    fn stepwise_api_reaches_mutual_close() {
        let dialog = DialogConfig::default();
        let mut user = User::handcrafted(&dialog, &PolicyConfig::default());
        let mut agent = Agent::new(&dialog);
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        user.reset();
        agent.reset();
        let mut session = DialogSession::new(&mut user, &mut agent);
        let mut state = session.start();
        loop {
            let (user_kind, next_state) = session.step(&mut rng).unwrap();
            if state == AgentActionKind::Close && user_kind == UserActionKind::Close {
                break;
            }
            state = next_state;
        }
        assert!(!session.trace().is_empty());
    }
}
