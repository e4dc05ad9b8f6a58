use std::{collections::HashSet, hash::Hash};

use log::debug;
use thiserror::Error;

use crate::Millis;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteKind {
    RestartRace,
    KickPlayer,
    ChangeLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteOption {
    Yes,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteResult {
    Passed,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteState {
    Hold,
    Running,
    Finished,
}

/// Result of counting a single ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Undecided,
    Decided(VoteResult),
}

/// Errors that can occur when starting a vote or casting a ballot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    /// Ballot arrived while no vote was open
    #[error("No vote is running")]
    NotRunning,

    /// A second vote was requested while one is still open
    #[error("A vote is already running")]
    AlreadyRunning,

    /// The voter has already been counted in this vote
    #[error("Voter has already cast a ballot in this vote")]
    AlreadyVoted,

    /// Ballot arrived at or after the deadline
    #[error("Vote deadline has passed")]
    Expired,

    /// A vote without voters can never reach a quorum
    #[error("Cannot start a vote with zero voters")]
    ZeroVoters,
}

/// Quorum vote with a deadline.
///
/// The server's instance is the only one that decides anything; clients run
/// the same automaton on the broadcasts they receive, for display.
#[derive(Clone, Debug)]
pub struct Vote<V: Eq + Hash + Clone> {
    state: VoteState,
    kind: Option<VoteKind>,
    subject: String,
    yes: u32,
    no: u32,
    voters: HashSet<V>,
    voter_count: u32,
    pass_count: u32,
    deadline: Millis,
    result: Option<VoteResult>,
}

impl<V: Eq + Hash + Clone> Default for Vote<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Eq + Hash + Clone> Vote<V> {
    pub fn new() -> Self {
        Self {
            state: VoteState::Hold,
            kind: None,
            subject: String::new(),
            yes: 0,
            no: 0,
            voters: HashSet::new(),
            voter_count: 0,
            pass_count: 0,
            deadline: 0,
            result: None,
        }
    }

    /// Smallest number of matching ballots that decides a vote.
    pub fn pass_count_for(voter_count: u32) -> u32 {
        voter_count / 2 + 1
    }

    /// Opens a fresh vote, discarding the tally of any finished one.
    pub fn start(
        &mut self,
        kind: VoteKind,
        subject: &str,
        voter_count: u32,
        time_limit_ms: Millis,
        now: Millis,
    ) -> Result<(), VoteError> {
        if self.state == VoteState::Running {
            return Err(VoteError::AlreadyRunning);
        }
        if voter_count == 0 {
            return Err(VoteError::ZeroVoters);
        }

        self.state = VoteState::Running;
        self.kind = Some(kind);
        self.subject = subject.to_string();
        self.yes = 0;
        self.no = 0;
        self.voters.clear();
        self.voter_count = voter_count;
        self.pass_count = Self::pass_count_for(voter_count);
        self.deadline = now.saturating_add(time_limit_ms);
        self.result = None;

        debug!(
            "vote {:?} '{}' started: {} voters, {} to decide",
            kind, self.subject, voter_count, self.pass_count
        );
        Ok(())
    }

    /// Counts one ballot. Ballots at or past the deadline are refused; only
    /// [`Vote::update`] may conclude a vote after that point.
    pub fn add_vote(
        &mut self,
        option: VoteOption,
        voter: V,
        now: Millis,
    ) -> Result<VoteOutcome, VoteError> {
        if self.state != VoteState::Running {
            return Err(VoteError::NotRunning);
        }
        if now >= self.deadline {
            return Err(VoteError::Expired);
        }
        if !self.voters.insert(voter) {
            return Err(VoteError::AlreadyVoted);
        }

        match option {
            VoteOption::Yes => self.yes += 1,
            VoteOption::No => self.no += 1,
        }

        match self.compute_result() {
            Some(result) => {
                self.finish(result);
                Ok(VoteOutcome::Decided(result))
            }
            None => Ok(VoteOutcome::Undecided),
        }
    }

    /// Resolves an undecided vote as failed once its deadline has passed.
    /// Returns the result on the call that closes the vote, `None` otherwise.
    pub fn update(&mut self, now: Millis) -> Option<VoteResult> {
        if self.state != VoteState::Running || now < self.deadline {
            return None;
        }
        self.finish(VoteResult::Failed);
        Some(VoteResult::Failed)
    }

    /// Forces the outcome; used by client mirrors to adopt the server's word.
    pub fn finish(&mut self, result: VoteResult) {
        self.state = VoteState::Finished;
        self.result = Some(result);
    }

    fn compute_result(&self) -> Option<VoteResult> {
        if self.yes >= self.pass_count {
            Some(VoteResult::Passed)
        } else if self.no > self.voter_count - self.pass_count {
            Some(VoteResult::Failed)
        } else {
            None
        }
    }

    pub fn state(&self) -> VoteState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == VoteState::Running
    }

    pub fn kind(&self) -> Option<VoteKind> {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn yes(&self) -> u32 {
        self.yes
    }

    pub fn no(&self) -> u32 {
        self.no
    }

    pub fn voter_count(&self) -> u32 {
        self.voter_count
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    pub fn deadline(&self) -> Millis {
        self.deadline
    }

    pub fn result(&self) -> Option<VoteResult> {
        self.result
    }

    pub fn has_voted(&self, voter: &V) -> bool {
        self.voters.contains(voter)
    }
}
