//! Sources of recovery decisions.
//!
//! - [`PromptDecisions`]: interactive four-way prompt over any reader/writer
//! - [`ScriptedDecisions`]: a fixed queue, for tests and replays
//! - [`FixedDecision`]: the same answer every time, for unattended runs

use super::action::RecoveryAction;
use super::policy::{DriftInfo, RunPhase};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

/// Errors raised while obtaining or applying a recovery decision.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The interactive input reached end-of-file before a valid answer.
    #[error("Decision input closed before a recovery action was chosen")]
    InputClosed,

    /// Reading the answer or writing the prompt failed.
    #[error("Decision prompt I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A scripted provider ran out of answers.
    #[error("No scripted recovery action left for the boundary at iteration {iteration}")]
    ScriptExhausted {
        /// Iteration of the unanswered boundary.
        iteration: u64,
    },

    /// The boundary state machine was driven out of order.
    #[error("Illegal phase transition: {from} -> {to}")]
    IllegalTransition {
        /// Phase before the transition.
        from: RunPhase,
        /// Requested phase.
        to: RunPhase,
    },
}

/// Supplies the action to take at a drifted boundary.
pub trait DecisionProvider {
    /// Chooses one action for the boundary described by `info`.
    fn decide(&mut self, info: &DriftInfo) -> Result<RecoveryAction, RecoveryError>;
}

impl<D: DecisionProvider + ?Sized> DecisionProvider for Box<D> {
    fn decide(&mut self, info: &DriftInfo) -> Result<RecoveryAction, RecoveryError> {
        (**self).decide(info)
    }
}

/// Interactive prompt: one key per answer, case-insensitive, re-prompting on
/// anything else.
#[derive(Debug)]
pub struct PromptDecisions<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptDecisions<R, W> {
    /// Creates a prompt reading answers from `input` and writing to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the prompt and returns its reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl PromptDecisions<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on the process's standard input, writing to standard error.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> DecisionProvider for PromptDecisions<R, W> {
    fn decide(&mut self, info: &DriftInfo) -> Result<RecoveryAction, RecoveryError> {
        let mut line = String::new();
        loop {
            write!(
                self.output,
                "efficiency expected={:.6}, measured={:.6} at iteration {} (level {}).\n\
                 expand statistics (e), reset statistics (r), revert the last update (b) \
                 or accept and go on (a)? ",
                info.expected, info.measured, info.iteration, info.level
            )?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(RecoveryError::InputClosed);
            }
            match RecoveryAction::from_response(&line) {
                Some(action) => return Ok(action),
                None => {
                    debug!(response = line.trim(), "Unrecognised recovery response");
                    writeln!(self.output, "please answer e, r, b or a")?;
                }
            }
        }
    }
}

/// Answers from a pre-recorded queue.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDecisions {
    script: VecDeque<RecoveryAction>,
    consulted: Vec<DriftInfo>,
}

impl ScriptedDecisions {
    /// Creates a provider that answers with `actions` in order.
    pub fn new(actions: impl IntoIterator<Item = RecoveryAction>) -> Self {
        Self {
            script: actions.into_iter().collect(),
            consulted: Vec::new(),
        }
    }

    /// Boundaries this provider was asked about.
    pub fn consulted(&self) -> &[DriftInfo] {
        &self.consulted
    }

    /// Answers not yet used.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn decide(&mut self, info: &DriftInfo) -> Result<RecoveryAction, RecoveryError> {
        let action = self.script.pop_front().ok_or(RecoveryError::ScriptExhausted {
            iteration: info.iteration,
        })?;
        self.consulted.push(*info);
        Ok(action)
    }
}

/// Always answers with the same action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDecision {
    action: RecoveryAction,
}

impl FixedDecision {
    /// Creates a provider that always returns `action`.
    pub fn new(action: RecoveryAction) -> Self {
        Self { action }
    }

    /// The configured action.
    pub fn action(&self) -> RecoveryAction {
        self.action
    }
}

impl DecisionProvider for FixedDecision {
    fn decide(&mut self, _info: &DriftInfo) -> Result<RecoveryAction, RecoveryError> {
        Ok(self.action)
    }
}
