//! Common types shared by the dice wager engine, client, and front ends.

pub mod api;
pub mod constants;
pub mod dice;
pub mod leaderboard;

pub use api::{SaveScoreRequest, SaveScoreResponse, SubmissionReceipt};
pub use constants::*;
pub use dice::{DieFace, DieFaceError, RollResult};
pub use leaderboard::{parse_leaderboard, LeaderboardEntry};

/// Shorten a player address for display.
///
/// `0x` addresses longer than 10 characters render as `0x1234…abcd`; a missing
/// or empty address renders as "Guest".
pub fn short_player(address: Option<&str>) -> String {
    match address {
        Some(address) if address.starts_with("0x") && address.chars().count() > 10 => {
            let head: String = address.chars().take(6).collect();
            let tail = tail_chars(address, 4);
            format!("{head}…{tail}")
        }
        Some(address) if !address.is_empty() => address.to_string(),
        _ => GUEST_NAME.to_string(),
    }
}

pub(crate) fn tail_chars(value: &str, count: usize) -> String {
    let len = value.chars().count();
    value.chars().skip(len.saturating_sub(count)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_player() {
        assert_eq!(
            short_player(Some("0x1234567890abcdef1234")),
            "0x1234…1234"
        );
        assert_eq!(short_player(Some("0x12345678")), "0x12345678");
        assert_eq!(short_player(Some("alice")), "alice");
        assert_eq!(short_player(Some("")), "Guest");
        assert_eq!(short_player(None), "Guest");
    }
}
