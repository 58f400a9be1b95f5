//! Confirmation gate for destructive commands

use crate::error::Result;
use crate::tui::prompts;

/// Capability of commands that change or delete data
pub trait RequiresConfirmation {
    /// The user pre-approved the operation (`--confirm`)
    fn confirmed(&self) -> bool;

    fn confirmation_message(&self) -> String;
}

/// Asks the user a single yes/no question
pub trait Prompter {
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// dialoguer-backed prompt on the controlling terminal, defaulting to "no"
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        prompts::confirm(message, false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState {
    AwaitingConfirmation { message: String },
    Proceed,
    Abort,
}

impl ConfirmationState {
    pub fn enter(gate: &dyn RequiresConfirmation) -> Self {
        if gate.confirmed() {
            ConfirmationState::Proceed
        } else {
            ConfirmationState::AwaitingConfirmation {
                message: gate.confirmation_message(),
            }
        }
    }

    pub fn answer(self, accepted: bool) -> Self {
        match self {
            ConfirmationState::AwaitingConfirmation { .. } if accepted => ConfirmationState::Proceed,
            ConfirmationState::AwaitingConfirmation { .. } => ConfirmationState::Abort,
            settled => settled,
        }
    }

    /// Drive the gate to a terminal state, prompting at most once
    pub fn settle(self, prompter: &dyn Prompter) -> Result<Self> {
        match self {
            ConfirmationState::AwaitingConfirmation { ref message } => {
                let accepted = prompter.confirm(message)?;
                Ok(self.answer(accepted))
            }
            settled => Ok(settled),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Answers every prompt with a fixed reply and counts how often it was asked
    pub struct ScriptedPrompter {
        pub reply: bool,
        pub asked: Cell<usize>,
    }

    impl ScriptedPrompter {
        pub fn replying(reply: bool) -> Self {
            Self {
                reply,
                asked: Cell::new(0),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&self, _message: &str) -> Result<bool> {
            self.asked.set(self.asked.get() + 1);
            Ok(self.reply)
        }
    }

    struct Gate(bool);

    impl RequiresConfirmation for Gate {
        fn confirmed(&self) -> bool {
            self.0
        }

        fn confirmation_message(&self) -> String {
            "Are you sure?".into()
        }
    }

    #[test]
    fn test_pre_confirmed_skips_prompt() {
        let prompter = ScriptedPrompter::replying(false);
        let state = ConfirmationState::enter(&Gate(true)).settle(&prompter).unwrap();
        assert_eq!(state, ConfirmationState::Proceed);
        assert_eq!(prompter.asked.get(), 0);
    }

    #[test]
    fn test_declined_aborts() {
        let prompter = ScriptedPrompter::replying(false);
        let state = ConfirmationState::enter(&Gate(false)).settle(&prompter).unwrap();
        assert_eq!(state, ConfirmationState::Abort);
        assert_eq!(prompter.asked.get(), 1);
    }

    #[test]
    fn test_accepted_proceeds() {
        let prompter = ScriptedPrompter::replying(true);
        let state = ConfirmationState::enter(&Gate(false)).settle(&prompter).unwrap();
        assert_eq!(state, ConfirmationState::Proceed);
    }

    #[test]
    fn test_terminal_states_ignore_answers() {
        assert_eq!(ConfirmationState::Abort.answer(true), ConfirmationState::Abort);
        assert_eq!(ConfirmationState::Proceed.answer(false), ConfirmationState::Proceed);
    }
}
