//! Plain-text rendering of the poll view.

use std::fmt;

use poll_client::PollView;
use shared::domain::{PollStatus, Tally};

/// The poll page as terminal text.
pub struct Page<'a>(pub &'a PollView);

fn status_label(view: &PollView) -> &'static str {
    match view {
        PollView::Unknown => "Unknown",
        PollView::Setup { .. } => PollStatus::NotStarted.label(),
        PollView::Voting { .. } => PollStatus::Active.label(),
        PollView::Results { .. } => PollStatus::Ended.label(),
    }
}

fn write_tallies(f: &mut fmt::Formatter<'_>, tallies: &[Tally]) -> fmt::Result {
    for tally in tallies {
        writeln!(f, "  {}: {} votes", tally.movie, tally.votes)?;
    }
    Ok(())
}

impl fmt::Display for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        writeln!(f, "Movie Poll")?;
        writeln!(f, "Status: {}", status_label(view))?;

        match view {
            PollView::Unknown => {}
            PollView::Setup {
                candidates,
                duration_minutes,
                can_start,
            } => {
                if !candidates.is_empty() {
                    writeln!(f, "Movies to vote on:")?;
                    for (index, movie) in candidates.iter().enumerate() {
                        writeln!(f, "  [{index}] {movie}")?;
                    }
                }
                writeln!(f, "Duration: {duration_minutes} minutes")?;
                writeln!(
                    f,
                    "Start Poll ({} movies){}",
                    candidates.len(),
                    if *can_start { "" } else { " [disabled]" }
                )?;
            }
            PollView::Voting {
                remaining_seconds,
                tallies,
                selection,
                has_voted,
                can_vote,
                can_end,
            } => {
                match remaining_seconds {
                    Some(seconds) => writeln!(f, "Time Remaining: {} minutes", seconds / 60)?,
                    None => writeln!(f, "Time Remaining: unknown")?,
                }
                write_tallies(f, tallies)?;
                if !selection.is_empty() {
                    writeln!(f, "Selected: {selection}")?;
                }
                if *has_voted == Some(true) {
                    writeln!(f, "You have voted; voting again changes your vote.")?;
                }
                if !*can_vote && selection.is_empty() {
                    writeln!(f, "Select a movie to cast a vote.")?;
                }
                if *can_end {
                    writeln!(f, "Voting time is over: End Poll is available.")?;
                }
            }
            PollView::Results { tallies, winner } => {
                writeln!(f, "Poll Results")?;
                write_tallies(f, tallies)?;
                if let Some(winner) = winner {
                    writeln!(f, "Winner: {winner}")?;
                }
            }
        }
        Ok(())
    }
}

pub fn render(view: &PollView) -> String {
    Page(view).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(movie: &str, votes: u64) -> Tally {
        Tally {
            movie: movie.to_string(),
            votes,
        }
    }

    #[test]
    fn renders_remaining_time_in_whole_minutes() {
        let view = PollView::Voting {
            remaining_seconds: Some(179),
            tallies: vec![tally("Dune", 3), tally("Up", 0)],
            selection: String::new(),
            has_voted: None,
            can_vote: false,
            can_end: false,
        };
        let text = render(&view);
        assert!(text.contains("Status: Voting Active"));
        assert!(text.contains("Time Remaining: 2 minutes"));
        assert!(text.contains("  Up: 0 votes"));
        assert!(!text.contains("End Poll"));
    }

    #[test]
    fn offers_end_poll_when_time_is_up() {
        let view = PollView::Voting {
            remaining_seconds: Some(0),
            tallies: Vec::new(),
            selection: "Dune".to_string(),
            has_voted: Some(true),
            can_vote: true,
            can_end: true,
        };
        let text = render(&view);
        assert!(text.contains("End Poll is available"));
        assert!(text.contains("Selected: Dune"));
    }

    #[test]
    fn renders_results_with_winner() {
        let view = PollView::Results {
            tallies: vec![tally("Dune", 5)],
            winner: Some("Dune".to_string()),
        };
        let text = render(&view);
        assert!(text.contains("Status: Ended"));
        assert!(text.contains("Winner: Dune"));
    }

    #[test]
    fn renders_setup_with_disabled_start() {
        let view = PollView::Setup {
            candidates: vec!["Dune".to_string()],
            duration_minutes: 1,
            can_start: false,
        };
        let text = render(&view);
        assert!(text.contains("[0] Dune"));
        assert!(text.contains("Start Poll (1 movies) [disabled]"));
    }

    #[test]
    fn unknown_status_has_no_body() {
        assert_eq!(render(&PollView::Unknown), "Movie Poll\nStatus: Unknown\n");
    }

    #[test]
    fn page_formats_like_render() {
        let view = PollView::Results {
            tallies: vec![tally("Up", 1)],
            winner: None,
        };
        assert_eq!(
            format!("{}", Page(&view)),
            "Movie Poll\nStatus: Ended\nPoll Results\n  Up: 1 votes\n"
        );
    }
}
