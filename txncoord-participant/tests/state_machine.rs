//! Model-checks the participant status token automaton against the two
//! legal linear paths named by the data-model invariants: every node's
//! lifetime is a prefix of `INIT -> PREPARED -> READY -> COMMIT ->
//! COMMITTED` or `INIT -> PREPARED -> {ABORT|READY} -> ROLL_BACK ->
//! ROLLED_BACK`, and once a token reaches `COMMITTED`/`ROLLED_BACK` it is a
//! sink -- no back-edges, ever.

use stateright::{Checker, Model, Property};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Token {
    Init,
    Prepared,
    Ready,
    Abort,
    Commit,
    Committed,
    RollBack,
    RolledBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Edge {
    Prepare,
    VoteReady,
    VoteAbort,
    DecideCommit,
    DecideRollback,
    Ack,
}

struct ParticipantTokenModel;

impl Model for ParticipantTokenModel {
    type State = Token;
    type Action = Edge;

    fn init_states(&self) -> Vec<Self::State> {
        vec![Token::Init]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        match state {
            Token::Init => actions.push(Edge::Prepare),
            Token::Prepared => {
                actions.push(Edge::VoteReady);
                actions.push(Edge::VoteAbort);
            }
            Token::Ready => {
                actions.push(Edge::DecideCommit);
                actions.push(Edge::DecideRollback);
            }
            Token::Abort => actions.push(Edge::DecideRollback),
            Token::Commit | Token::RollBack => actions.push(Edge::Ack),
            Token::Committed | Token::RolledBack => {}
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        use Edge::*;
        use Token::*;
        Some(match (state, action) {
            (Init, Prepare) => Prepared,
            (Prepared, VoteReady) => Ready,
            (Prepared, VoteAbort) => Abort,
            (Ready, DecideCommit) => Commit,
            (Ready, DecideRollback) => RollBack,
            (Abort, DecideRollback) => RollBack,
            (Commit, Ack) => Committed,
            (RollBack, Ack) => RolledBack,
            _ => return None,
        })
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("terminal states have no outgoing edges", |model, state| {
                let mut actions = Vec::new();
                model.actions(state, &mut actions);
                !matches!(state, Token::Committed | Token::RolledBack) || actions.is_empty()
            }),
            Property::sometimes("COMMITTED is reachable", |_, state| *state == Token::Committed),
            Property::sometimes("ROLLED_BACK is reachable", |_, state| *state == Token::RolledBack),
        ]
    }
}

#[test]
fn participant_token_automaton_has_no_back_edges() {
    ParticipantTokenModel
        .checker()
        .spawn_bfs()
        .join()
        .assert_properties();
}
