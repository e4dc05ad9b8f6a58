use std::collections::HashSet;

use proptest::{collection::vec, prelude::*};

use pitlane_shared::{Vote, VoteError, VoteKind, VoteOption, VoteOutcome, VoteResult, VoteState};

fn option(yes: bool) -> VoteOption {
    if yes {
        VoteOption::Yes
    } else {
        VoteOption::No
    }
}

proptest! {
    #[test]
    fn every_voter_counts_once_and_the_first_quorum_wins(
        voter_count in 1u32..12,
        ballots in vec((0u32..12, any::<bool>()), 0..40),
    ) {
        let mut vote: Vote<u32> = Vote::new();
        vote.start(VoteKind::RestartRace, "", voter_count, 10_000, 0).unwrap();
        let pass_count = Vote::<u32>::pass_count_for(voter_count);

        let mut seen = HashSet::new();
        let (mut yes, mut no) = (0, 0);
        let mut decided = None;

        for (voter, is_yes) in ballots {
            let voter = voter % voter_count;
            let outcome = vote.add_vote(option(is_yes), voter, 1);

            if decided.is_some() {
                prop_assert_eq!(outcome, Err(VoteError::NotRunning));
                continue;
            }
            if !seen.insert(voter) {
                prop_assert_eq!(outcome, Err(VoteError::AlreadyVoted));
                continue;
            }
            if is_yes {
                yes += 1;
            } else {
                no += 1;
            }

            if yes >= pass_count {
                prop_assert_eq!(outcome, Ok(VoteOutcome::Decided(VoteResult::Passed)));
                decided = Some(VoteResult::Passed);
            } else if no > voter_count - pass_count {
                prop_assert_eq!(outcome, Ok(VoteOutcome::Decided(VoteResult::Failed)));
                decided = Some(VoteResult::Failed);
            } else {
                prop_assert_eq!(outcome, Ok(VoteOutcome::Undecided));
            }
        }

        prop_assert_eq!(vote.yes(), yes);
        prop_assert_eq!(vote.no(), no);
        prop_assert!(vote.yes() + vote.no() <= voter_count);
        prop_assert_eq!(vote.result(), decided);
        if decided.is_none() {
            prop_assert_eq!(vote.state(), VoteState::Running);
            prop_assert_eq!(vote.update(10_000), Some(VoteResult::Failed));
        }
        prop_assert_eq!(vote.state(), VoteState::Finished);
    }

    #[test]
    fn a_full_electorate_always_decides(voter_count in 1u32..12, yes_votes in 0u32..12) {
        let yes_votes = yes_votes.min(voter_count);
        let mut vote: Vote<u32> = Vote::new();
        vote.start(VoteKind::KickPlayer, "x", voter_count, 10_000, 0).unwrap();

        for voter in 0..voter_count {
            let _ = vote.add_vote(option(voter < yes_votes), voter, 1);
        }

        prop_assert_eq!(vote.state(), VoteState::Finished);
        let expected = if yes_votes >= Vote::<u32>::pass_count_for(voter_count) {
            VoteResult::Passed
        } else {
            VoteResult::Failed
        };
        prop_assert_eq!(vote.result(), Some(expected));
    }
}
