use crate::domain::Address;

/// State-changing contract calls. Each one is submitted as a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    StartPoll {
        movies: Vec<String>,
        duration_minutes: u64,
    },
    Vote {
        movie: String,
    },
    Revote {
        new_movie: String,
    },
    EndPoll,
}

impl LedgerCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            LedgerCall::StartPoll { .. } => "startPoll",
            LedgerCall::Vote { .. } => "vote",
            LedgerCall::Revote { .. } => "revote",
            LedgerCall::EndPoll => "endPoll",
        }
    }
}

/// Read-only contract views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerRead {
    PollStatus,
    RemainingTime,
    Movies,
    Votes { movie: String },
    Winner,
    HasVoted { voter: Address },
    Owner,
    CurrentPoll,
}

impl LedgerRead {
    pub fn function_name(&self) -> &'static str {
        match self {
            LedgerRead::PollStatus => "getPollStatus",
            LedgerRead::RemainingTime => "getRemainingTime",
            LedgerRead::Movies => "getMovies",
            LedgerRead::Votes { .. } => "getVotes",
            LedgerRead::Winner => "getWinner",
            LedgerRead::HasVoted { .. } => "hasVoted",
            LedgerRead::Owner => "owner",
            LedgerRead::CurrentPoll => "currentPoll",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_names_match_contract() {
        assert_eq!(LedgerCall::EndPoll.function_name(), "endPoll");
        assert_eq!(
            LedgerRead::Votes {
                movie: "Up".to_string()
            }
            .function_name(),
            "getVotes"
        );
    }
}
