// Storage keys
pub const PREVIOUS_WINNER_KEY: &str = "fan_of_month.previous_winner";
pub const WINNER_HISTORY_KEY: &str = "fan_of_month.winner_history";

// Display placeholders
pub const WINNER_PLACEHOLDER: &str = "TBA";
pub const LEADER_PLACEHOLDER: &str = "Loading...";

pub const DEFAULT_REFRESH_INTERVAL_IN_MINUTES: u32 = 60;
