use crate::{
    app::{App, LeaderboardView},
    commands::HELP,
};
use dice_execution::{Phase, SessionSnapshot};
use dice_types::{short_player, LeaderboardEntry, MAX_ROUNDS};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Pick a face",
        Phase::Ready => "Ready to roll",
        Phase::Resolving => "Rolling...",
        Phase::Exhausted => "Game over",
    }
}

fn save_label(snapshot: &SessionSnapshot, saving: bool) -> String {
    if saving {
        "saving...".to_string()
    } else if snapshot.can_submit {
        "press s".to_string()
    } else if snapshot.last_submitted_score > 0 {
        format!("saved {}", snapshot.last_submitted_score)
    } else {
        "-".to_string()
    }
}

/// Label/value rows of the board pane.
pub fn board_rows(
    snapshot: &SessionSnapshot,
    player: Option<&str>,
    saving: bool,
) -> Vec<(&'static str, String)> {
    let state = &snapshot.state;
    vec![
        ("Player", short_player(player)),
        (
            "Face",
            state
                .chosen_face()
                .map_or_else(|| "-".to_string(), |face| face.to_string()),
        ),
        (
            "Last roll",
            state
                .last_roll()
                .map_or_else(|| "-".to_string(), |roll| roll.to_string()),
        ),
        ("Hits", state.hit_count().to_string()),
        ("Award", format!("+{}", state.last_round_award())),
        ("Score", state.cumulative_score().to_string()),
        ("Best", state.best_score().to_string()),
        ("Round", format!("{}/{MAX_ROUNDS}", state.rounds_played())),
        ("Status", phase_label(state.phase()).to_string()),
        ("Save", save_label(snapshot, saving)),
    ]
}

fn medal(rank: u32) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        rank => format!("#{rank}"),
    }
}

pub fn leaderboard_rows(entries: &[LeaderboardEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No scores yet".to_string()];
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{:<4} {:<16} {:<15} {:>8}",
                medal(entry.rank),
                entry.name,
                entry.short_wallet(),
                entry.score
            )
        })
        .collect()
}

pub fn draw<R, S>(f: &mut ratatui::Frame, app: &App<R, S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let title = Paragraph::new(format!(
        "Dice | {} | {}",
        short_player(app.player()),
        phase_label(app.snapshot.state.phase())
    ))
    .style(Style::default().fg(Color::Gray));
    f.render_widget(title, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(chunks[1]);

    let board: Vec<ListItem> = board_rows(&app.snapshot, app.player(), app.saving)
        .into_iter()
        .map(|(label, value)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow)),
                Span::raw(value),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(board).block(Block::default().borders(Borders::ALL).title("Board")),
        main_chunks[0],
    );

    let height = main_chunks[1].height.saturating_sub(2) as usize;
    let (title, lines): (&str, Vec<Line>) = match &app.leaderboard {
        Some(view) => {
            let rows = match view {
                LeaderboardView::Loading => vec!["Loading...".to_string()],
                LeaderboardView::Loaded(entries) => leaderboard_rows(entries),
                LeaderboardView::Failed(err) => vec![format!("Failed to load leaderboard: {err}")],
            };
            ("Leaderboard", rows.into_iter().map(Line::raw).collect())
        }
        None => (
            "Log",
            app.logs
                .iter()
                .rev()
                .take(height)
                .rev()
                .map(|line| Line::raw(line.clone()))
                .collect(),
        ),
    };
    let pane = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(pane, main_chunks[1]);

    let help = Paragraph::new(HELP).style(Style::default().fg(Color::Gray));
    f.render_widget(help, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_execution::SessionState;
    use dice_types::{DieFace, RollResult};

    fn snapshot(state: SessionState) -> SessionSnapshot {
        SessionSnapshot {
            state,
            last_submitted_score: 0,
            can_submit: false,
        }
    }

    fn value<'a>(rows: &'a [(&'static str, String)], label: &str) -> &'a str {
        rows.iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_board_rows_fresh() {
        let rows = board_rows(&snapshot(SessionState::new(1_300)), None, false);
        assert_eq!(value(&rows, "Player"), "Guest");
        assert_eq!(value(&rows, "Face"), "-");
        assert_eq!(value(&rows, "Last roll"), "-");
        assert_eq!(value(&rows, "Best"), "1300");
        assert_eq!(value(&rows, "Round"), "0/10");
        assert_eq!(value(&rows, "Status"), "Pick a face");
        assert_eq!(value(&rows, "Save"), "-");
    }

    #[test]
    fn test_board_rows_after_round() {
        let mut state = SessionState::new(0);
        state.choose_face(DieFace::FIVE);
        state.begin_roll();
        state.resolve(RollResult::try_from([5, 5, 2]).unwrap());
        let mut snap = snapshot(state);
        snap.can_submit = true;

        let rows = board_rows(&snap, Some("0x1234567890abcdef"), false);
        assert_eq!(value(&rows, "Player"), "0x1234…cdef");
        assert_eq!(value(&rows, "Face"), "5");
        assert_eq!(value(&rows, "Last roll"), "[5, 5, 2]");
        assert_eq!(value(&rows, "Hits"), "2");
        assert_eq!(value(&rows, "Award"), "+300");
        assert_eq!(value(&rows, "Score"), "300");
        assert_eq!(value(&rows, "Round"), "1/10");
        assert_eq!(value(&rows, "Save"), "press s");

        snap.can_submit = false;
        snap.last_submitted_score = 300;
        let rows = board_rows(&snap, None, false);
        assert_eq!(value(&rows, "Save"), "saved 300");
        let rows = board_rows(&snap, None, true);
        assert_eq!(value(&rows, "Save"), "saving...");
    }

    #[test]
    fn test_leaderboard_rows() {
        assert_eq!(leaderboard_rows(&[]), vec!["No scores yet".to_string()]);

        let entries = vec![
            LeaderboardEntry {
                rank: 1,
                name: "alice".to_string(),
                wallet: "0x1234567890abcdef".to_string(),
                score: 3_000,
            },
            LeaderboardEntry {
                rank: 4,
                ..LeaderboardEntry::default()
            },
        ];
        let rows = leaderboard_rows(&entries);
        assert!(rows[0].starts_with("🥇"));
        assert!(rows[0].contains("alice"));
        assert!(rows[0].contains("0x1234...cdef"));
        assert!(rows[0].ends_with("3000"));
        assert!(rows[1].contains("#4"));
        assert!(rows[1].contains("Unknown"));
    }
}
