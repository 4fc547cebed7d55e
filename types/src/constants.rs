/// Maximum number of rounds in one session
pub const MAX_ROUNDS: u8 = 10;

/// Dice thrown per round
pub const DICE_PER_ROUND: usize = 3;

/// Number of faces on a die
pub const FACES: u8 = 6;

/// Display name used when the player is not logged in
pub const GUEST_NAME: &str = "Guest";

/// Placeholder for leaderboard names and wallets the service omitted
pub const UNKNOWN: &str = "Unknown";
