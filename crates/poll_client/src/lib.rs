use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Address, CurrentPoll, PollStatus, Tally, TxHash},
    error::LedgerError,
    protocol::LedgerCall,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod abi;
pub mod rpc;
pub use rpc::{JsonRpcLedger, RpcLedgerConfig};

pub const DEFAULT_DURATION_MINUTES: u64 = 60;
const MIN_DURATION_MINUTES: u64 = 1;

/// Read-only view of the poll contract.
#[async_trait]
pub trait PollLedger: Send + Sync {
    async fn poll_status(&self) -> Result<PollStatus>;
    /// Seconds until the poll ends, as computed by the ledger.
    async fn remaining_time(&self) -> Result<u64>;
    async fn movies(&self) -> Result<Vec<String>>;
    async fn votes(&self, movie: &str) -> Result<u64>;
    async fn winner(&self) -> Result<String>;
    async fn has_voted(&self, voter: Address) -> Result<bool>;
    async fn owner(&self) -> Result<Address>;
    async fn current_poll(&self) -> Result<CurrentPoll>;
}

pub struct MissingLedger;

fn ledger_unavailable() -> anyhow::Error {
    anyhow!(LedgerError::unavailable("poll ledger is unavailable"))
}

#[async_trait]
impl PollLedger for MissingLedger {
    async fn poll_status(&self) -> Result<PollStatus> {
        Err(ledger_unavailable())
    }

    async fn remaining_time(&self) -> Result<u64> {
        Err(ledger_unavailable())
    }

    async fn movies(&self) -> Result<Vec<String>> {
        Err(ledger_unavailable())
    }

    async fn votes(&self, _movie: &str) -> Result<u64> {
        Err(ledger_unavailable())
    }

    async fn winner(&self) -> Result<String> {
        Err(ledger_unavailable())
    }

    async fn has_voted(&self, _voter: Address) -> Result<bool> {
        Err(ledger_unavailable())
    }

    async fn owner(&self) -> Result<Address> {
        Err(ledger_unavailable())
    }

    async fn current_poll(&self) -> Result<CurrentPoll> {
        Err(ledger_unavailable())
    }
}

/// Connected wallet able to submit transactions against the poll contract.
#[async_trait]
pub trait WalletSession: Send + Sync {
    fn is_connected(&self) -> bool;
    fn address(&self) -> Option<Address>;
    async fn submit(&self, call: LedgerCall) -> Result<TxHash>;
}

pub struct DisconnectedWallet;

#[async_trait]
impl WalletSession for DisconnectedWallet {
    fn is_connected(&self) -> bool {
        false
    }

    fn address(&self) -> Option<Address> {
        None
    }

    async fn submit(&self, call: LedgerCall) -> Result<TxHash> {
        Err(anyhow!(LedgerError::unavailable(format!(
            "wallet is not connected; cannot submit {}",
            call.function_name()
        ))))
    }
}

/// Blocking user-facing notification.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollActionError {
    #[error("no candidate movies to start a poll with")]
    NoCandidates,
    #[error("no movie selected")]
    EmptySelection,
    #[error("wallet is not connected")]
    WalletDisconnected,
    #[error("Failed to {action}: {message}")]
    Submission {
        action: &'static str,
        message: String,
    },
}

/// Draft movie titles collected before a poll starts. Entries are trimmed,
/// non-empty and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList(Vec<String>);

impl CandidateList {
    pub fn add(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() || self.0.iter().any(|existing| existing == title) {
            return false;
        }
        self.0.push(title.to_string());
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

pub fn clamp_duration_minutes(minutes: i64) -> u64 {
    u64::try_from(minutes).map_or(MIN_DURATION_MINUTES, |m| m.max(MIN_DURATION_MINUTES))
}

/// Reads a duration the way a number input does: the leading integer wins,
/// anything unparseable falls back to the minimum.
pub fn parse_duration_minutes(input: &str) -> u64 {
    let input = input.trim();
    let (negative, unsigned) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    let digits_len = unsigned
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 || negative {
        return MIN_DURATION_MINUTES;
    }
    unsigned[..digits_len]
        .parse::<u64>()
        .unwrap_or(u64::MAX)
        .max(MIN_DURATION_MINUTES)
}

/// What the poll page shows, derived from the last ledger reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollView {
    Unknown,
    Setup {
        candidates: Vec<String>,
        duration_minutes: u64,
        can_start: bool,
    },
    Voting {
        remaining_seconds: Option<u64>,
        tallies: Vec<Tally>,
        selection: String,
        has_voted: Option<bool>,
        can_vote: bool,
        can_end: bool,
    },
    Results {
        tallies: Vec<Tally>,
        winner: Option<String>,
    },
}

pub struct PollViewController {
    ledger: Arc<dyn PollLedger>,
    wallet: Arc<dyn WalletSession>,
    notifier: Arc<dyn Notifier>,
    candidates: CandidateList,
    duration_minutes: u64,
    selection: String,
    status: Option<PollStatus>,
    remaining_time: Option<u64>,
    movies: Option<Vec<String>>,
    vote_counts: HashMap<String, u64>,
    winner: Option<String>,
    has_voted: Option<bool>,
}

impl PollViewController {
    pub fn new(
        ledger: Arc<dyn PollLedger>,
        wallet: Arc<dyn WalletSession>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger,
            wallet,
            notifier,
            candidates: CandidateList::default(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            selection: String::new(),
            status: None,
            remaining_time: None,
            movies: None,
            vote_counts: HashMap::new(),
            winner: None,
            has_voted: None,
        }
    }

    pub fn add_candidate(&mut self, title: &str) -> bool {
        let added = self.candidates.add(title);
        if !added {
            debug!("poll: ignored blank or duplicate candidate title={title:?}");
        }
        added
    }

    pub fn remove_candidate(&mut self, index: usize) -> Option<String> {
        self.candidates.remove(index)
    }

    pub fn set_duration(&mut self, input: &str) -> u64 {
        self.duration_minutes = parse_duration_minutes(input);
        self.duration_minutes
    }

    pub fn set_duration_minutes(&mut self, minutes: i64) -> u64 {
        self.duration_minutes = clamp_duration_minutes(minutes);
        self.duration_minutes
    }

    pub fn select(&mut self, movie: impl Into<String>) {
        self.selection = movie.into();
    }

    pub fn candidates(&self) -> &[String] {
        self.candidates.as_slice()
    }

    pub fn duration_minutes(&self) -> u64 {
        self.duration_minutes
    }

    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn status(&self) -> Option<PollStatus> {
        self.status
    }

    pub fn movies(&self) -> Option<&[String]> {
        self.movies.as_deref()
    }

    pub fn vote_counts(&self) -> &HashMap<String, u64> {
        &self.vote_counts
    }

    pub fn has_voted(&self) -> Option<bool> {
        self.has_voted
    }

    /// Re-reads status, timer and movie list. Failed reads keep the last
    /// value. Vote counts are re-read only when the movie list changed.
    pub async fn refresh(&mut self) {
        match self.ledger.poll_status().await {
            Ok(status) => self.status = Some(status),
            Err(err) => warn!("poll: status read failed: {err:#}"),
        }

        match self.ledger.remaining_time().await {
            Ok(seconds) => self.remaining_time = Some(seconds),
            Err(err) => warn!("poll: remaining time read failed: {err:#}"),
        }

        match self.ledger.movies().await {
            Ok(movies) if self.movies.as_ref() != Some(&movies) => {
                info!("poll: movie list changed count={}", movies.len());
                self.movies = Some(movies);
                self.refresh_vote_counts().await;
            }
            Ok(_) => {}
            Err(err) => warn!("poll: movie list read failed: {err:#}"),
        }

        if matches!(self.status, Some(PollStatus::Active | PollStatus::Ended))
            && !self.candidates.is_empty()
        {
            debug!(
                "poll: discarding {} draft candidates after poll start",
                self.candidates.len()
            );
            self.candidates.clear();
        }

        if self.status == Some(PollStatus::Ended) {
            match self.ledger.winner().await {
                Ok(winner) if !winner.is_empty() => self.winner = Some(winner),
                Ok(_) => {}
                Err(err) => warn!("poll: winner read failed: {err:#}"),
            }
        }

        if let Some(address) = self.wallet.address() {
            match self.ledger.has_voted(address).await {
                Ok(voted) => self.has_voted = Some(voted),
                Err(err) => warn!("poll: hasVoted read failed for {address}: {err:#}"),
            }
        }
    }

    /// Rebuilds the tally from one read per movie. A failed read counts as zero.
    pub async fn refresh_vote_counts(&mut self) {
        let Some(movies) = self.movies.as_ref() else {
            return;
        };

        let mut counts = HashMap::with_capacity(movies.len());
        for movie in movies {
            let votes = match self.ledger.votes(movie).await {
                Ok(votes) => votes,
                Err(err) => {
                    warn!("poll: vote count read failed movie={movie:?}: {err:#}");
                    0
                }
            };
            counts.insert(movie.clone(), votes);
        }
        self.vote_counts = counts;
    }

    pub async fn start_poll(&mut self) -> Result<TxHash, PollActionError> {
        if self.candidates.is_empty() {
            debug!("poll: start skipped, no candidates");
            return Err(PollActionError::NoCandidates);
        }
        if !self.wallet.is_connected() {
            debug!("poll: start skipped, wallet disconnected");
            return Err(PollActionError::WalletDisconnected);
        }

        let call = LedgerCall::StartPoll {
            movies: self.candidates.as_slice().to_vec(),
            duration_minutes: self.duration_minutes,
        };
        self.submit("start poll", call).await
    }

    pub async fn cast_vote(&mut self) -> Result<TxHash, PollActionError> {
        let movie = self.checked_selection()?;
        info!("poll: attempting to vote for {movie:?}");
        let tx = self.submit("vote", LedgerCall::Vote { movie }).await?;
        self.refresh_vote_counts().await;
        Ok(tx)
    }

    pub async fn change_vote(&mut self) -> Result<TxHash, PollActionError> {
        let new_movie = self.checked_selection()?;
        info!("poll: attempting to change vote to {new_movie:?}");
        let tx = self
            .submit("change vote", LedgerCall::Revote { new_movie })
            .await?;
        self.refresh_vote_counts().await;
        Ok(tx)
    }

    /// Votes for the selection, or moves an existing vote to it when the
    /// wallet is known to have voted already.
    pub async fn vote_or_change(&mut self) -> Result<TxHash, PollActionError> {
        if self.has_voted == Some(true) {
            self.change_vote().await
        } else {
            self.cast_vote().await
        }
    }

    pub async fn end_poll(&mut self) -> Result<TxHash, PollActionError> {
        self.submit("end poll", LedgerCall::EndPoll).await
    }

    pub fn view(&self) -> PollView {
        match self.status {
            None => PollView::Unknown,
            Some(PollStatus::NotStarted) => PollView::Setup {
                candidates: self.candidates.as_slice().to_vec(),
                duration_minutes: self.duration_minutes,
                can_start: !self.candidates.is_empty() && self.wallet.is_connected(),
            },
            Some(PollStatus::Active) => PollView::Voting {
                remaining_seconds: self.remaining_time,
                tallies: self.tallies(),
                selection: self.selection.clone(),
                has_voted: self.has_voted,
                can_vote: !self.selection.is_empty() && self.wallet.is_connected(),
                can_end: self.remaining_time == Some(0),
            },
            Some(PollStatus::Ended) => PollView::Results {
                tallies: self.tallies(),
                winner: self.winner.clone(),
            },
        }
    }

    fn tallies(&self) -> Vec<Tally> {
        self.movies
            .iter()
            .flatten()
            .map(|movie| Tally {
                movie: movie.clone(),
                votes: self.vote_counts.get(movie).copied().unwrap_or(0),
            })
            .collect()
    }

    fn checked_selection(&self) -> Result<String, PollActionError> {
        if self.selection.is_empty() {
            info!("poll: no movie selected");
            return Err(PollActionError::EmptySelection);
        }
        if !self.wallet.is_connected() {
            debug!("poll: vote skipped, wallet disconnected");
            return Err(PollActionError::WalletDisconnected);
        }
        Ok(self.selection.clone())
    }

    async fn submit(
        &self,
        action: &'static str,
        call: LedgerCall,
    ) -> Result<TxHash, PollActionError> {
        let function = call.function_name();
        match self.wallet.submit(call).await {
            Ok(tx) => {
                info!("poll: {function} submitted tx={tx}");
                Ok(tx)
            }
            Err(err) => {
                let rejected = err
                    .downcast_ref::<LedgerError>()
                    .is_some_and(LedgerError::is_user_rejection);
                if rejected {
                    warn!("poll: {function} rejected by wallet: {err:#}");
                } else {
                    error!("poll: {function} failed: {err:#}");
                }
                let failure = PollActionError::Submission {
                    action,
                    message: err.to_string(),
                };
                self.notifier.alert(&failure.to_string());
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
