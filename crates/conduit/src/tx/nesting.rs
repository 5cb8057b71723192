use crate::{Error, Result};

/// Outcome of one nesting level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    #[default]
    Pending,
    Committed,
    RolledBack,
}

/// Tracks nested begin/commit/rollback calls on one backend transaction.
///
/// `history` holds the state of every enclosing level, so its length is the
/// current depth. The `rolled_back` flag is never cleared: once any level
/// rolls back, the whole transaction is dead.
#[derive(Debug, Default)]
pub(crate) struct Nesting {
    current: State,
    history: Vec<State>,
    rolled_back: bool,
}

impl Nesting {
    pub(crate) fn depth(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn is_outermost(&self) -> bool {
        self.history.is_empty()
    }

    pub(crate) fn current(&self) -> State {
        self.current
    }

    pub(crate) fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Enters a new level.
    pub(crate) fn push(&mut self) {
        self.history.push(self.current);
        self.current = State::Pending;
    }

    /// Leaves the current level. A no-op at the outermost level.
    pub(crate) fn pop(&mut self) {
        if let Some(state) = self.history.pop() {
            self.current = state;
        }
    }

    /// Fails if a statement may not run at the current level.
    pub(crate) fn check_statement(&self) -> Result<()> {
        if self.current == State::Committed {
            return Err(Error::already_committed());
        }

        if self.rolled_back {
            return Err(Error::rolled_back());
        }

        Ok(())
    }

    /// Fails if the current level may not commit.
    pub(crate) fn check_commit(&self) -> Result<()> {
        if self.rolled_back {
            return Err(Error::rolled_back());
        }

        if self.current == State::Committed {
            return Err(Error::already_committed());
        }

        Ok(())
    }

    pub(crate) fn mark_committed(&mut self) {
        self.current = State::Committed;
    }

    pub(crate) fn mark_rolled_back(&mut self) {
        self.current = State::RolledBack;
        self.rolled_back = true;
        self.pop();
    }

    /// Returns `true` if the current level no longer needs a rollback on
    /// close.
    pub(crate) fn is_finished(&self) -> bool {
        self.rolled_back || self.current != State::Pending
    }
}
