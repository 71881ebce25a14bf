use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared::{Countdown, StoredWinner, StoredWinnerInput};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct WinnerCard {
    pub name: String,
    pub country: String,
    pub points: u64,
    pub avatar_url: Option<String>,
    pub month: String,
    pub year: i32,
}

impl From<&StoredWinner> for WinnerCard {
    fn from(winner: &StoredWinner) -> Self {
        Self {
            name: winner.name.clone(),
            country: winner.country.clone(),
            points: winner.points,
            avatar_url: winner.avatar_url.clone(),
            month: winner.month.clone(),
            year: winner.year,
        }
    }
}

impl From<&StoredWinnerInput> for WinnerCard {
    fn from(leader: &StoredWinnerInput) -> Self {
        Self {
            name: leader.name.clone(),
            country: leader.country.clone(),
            points: leader.points,
            avatar_url: leader.avatar_url.clone(),
            month: leader.month.clone(),
            year: leader.year,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CountdownResponse {
    pub target: NaiveDateTime,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl From<Countdown> for CountdownResponse {
    fn from(countdown: Countdown) -> Self {
        Self {
            target: countdown.target,
            days: countdown.days,
            hours: countdown.hours,
            minutes: countdown.minutes,
            seconds: countdown.seconds,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Spotlight {
    /// Live leader of the running month next to last month's champion.
    Countdown {
        leader_name: String,
        leader: Option<WinnerCard>,
        champion_name: String,
        reigning_champion: Option<WinnerCard>,
        countdown: CountdownResponse,
    },
    /// Last archived winner, never the live leaderboard.
    Reveal {
        winner_name: String,
        winner: Option<WinnerCard>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TeaserView {
    pub current_month: String,
    pub spotlight: Spotlight,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FullPageView {
    pub current_month: String,
    pub spotlight: Spotlight,
    pub hall_of_fame: Vec<WinnerCard>,
}
