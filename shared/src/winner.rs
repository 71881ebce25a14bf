use chrono::{DateTime, Utc};
use serde::Deserializer;

use super::*;

pub const DEFAULT_COUNTRY: &str = "Global";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredWinnerInput {
    pub name: String,
    pub month: String,
    pub year: i32,
    pub points: u64,
    pub country: String,
    pub avatar_url: Option<String>,
}

impl StoredWinnerInput {
    pub fn is_same_period(&self, month: &str, year: i32) -> bool {
        self.month == month && self.year == year
    }

    pub fn stored_at(self, stored_at: DateTime<Utc>) -> StoredWinner {
        StoredWinner {
            name: self.name,
            month: self.month,
            year: self.year,
            points: self.points,
            country: self.country,
            avatar_url: self.avatar_url,
            stored_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredWinner {
    pub name: String,
    pub month: String,
    pub year: i32,
    pub points: u64,
    pub country: String,
    pub avatar_url: Option<String>,
    #[serde(rename = "storedAt")]
    pub stored_at: DateTime<Utc>,
}

impl StoredWinner {
    pub fn is_same_period(&self, other: &StoredWinnerInput) -> bool {
        other.is_same_period(&self.month, self.year)
    }

    /// Sort key for recency ordering; unknown month names sort first within a year.
    pub fn period_key(&self) -> (i32, u32) {
        (self.year, month_index(&self.month).unwrap_or_default())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserId {
    Number(u64),
    Text(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FanProfile {
    pub country: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TopFan {
    #[serde(deserialize_with = "lenient_count")]
    pub rank: u64,
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub mobile: Option<String>,
    pub user: Option<FanProfile>,
    pub avatar_url: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub month_points: u64,
}

/// Counts arrive as integers, decimals, numeric strings or `null` depending on the query
/// behind the endpoint. Anything that is not a number reads as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Integer(u64),
        Decimal(f64),
        Text(String),
    }

    let count = match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Integer(count)) => count,
        Some(Count::Decimal(count)) => count.round() as u64,
        Some(Count::Text(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|count| count.round() as u64))
                .unwrap_or_default()
        }
        None => 0,
    };
    Ok(count)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl TopFan {
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.nickname.as_ref()).or_else(|| non_empty(self.name.as_ref()))
    }

    /// Explicit country, then location, then the mobile dial code, then `Global`.
    pub fn resolve_country(&self) -> String {
        let profile = self.user.as_ref();
        let explicit = non_empty(self.country.as_ref())
            .or_else(|| non_empty(profile.and_then(|p| p.country.as_ref())));
        let location = non_empty(self.location.as_ref())
            .or_else(|| non_empty(profile.and_then(|p| p.location.as_ref())));
        if let Some(country) = explicit.or(location) {
            return country.to_string();
        }

        non_empty(self.mobile.as_ref())
            .or_else(|| non_empty(profile.and_then(|p| p.mobile.as_ref())))
            .and_then(country_from_mobile)
            .unwrap_or(DEFAULT_COUNTRY)
            .to_string()
    }

    pub fn resolve_avatar(&self, media_base_url: Option<&str>) -> Option<String> {
        non_empty(self.avatar_url.as_ref())
            .or_else(|| non_empty(self.user.as_ref().and_then(|p| p.avatar.as_ref())))
            .and_then(|reference| compose_image_url(reference, media_base_url))
    }

    pub fn to_winner_input(
        &self,
        month: &str,
        year: i32,
        media_base_url: Option<&str>,
    ) -> Option<StoredWinnerInput> {
        Some(StoredWinnerInput {
            name: self.display_name()?.to_string(),
            month: month.to_string(),
            year,
            points: self.month_points,
            country: self.resolve_country(),
            avatar_url: self.resolve_avatar(media_base_url),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    pub month: String,
    pub year: i32,
    #[serde(default)]
    pub top_fans: Vec<TopFan>,
}

impl Standings {
    /// Rank-1 entry, falling back to the first element when ranks are missing.
    ///
    /// The endpoint lists fans in rank order, so this matches `top_fans[0]` on well-formed
    /// payloads. Looking up the rank keeps the right fan when the list arrives unsorted.
    pub fn leader(&self) -> Option<&TopFan> {
        self.top_fans
            .iter()
            .find(|fan| fan.rank == 1)
            .or_else(|| self.top_fans.first())
    }
}

/// Absolute references pass through; relative ones are joined onto the media base.
pub fn compose_image_url(reference: &str, media_base_url: Option<&str>) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("data:")
    {
        return Some(reference.to_string());
    }
    if let Some(path) = reference.strip_prefix("//") {
        return Some(format!("https://{path}"));
    }

    let base = media_base_url?.trim_end_matches('/');
    Some(format!("{}/{}", base, reference.trim_start_matches('/')))
}

// Matched by longest prefix.
const DIAL_CODES: &[(&str, &str)] = &[
    ("971", "United Arab Emirates"),
    ("974", "Qatar"),
    ("966", "Saudi Arabia"),
    ("968", "Oman"),
    ("965", "Kuwait"),
    ("973", "Bahrain"),
    ("960", "Maldives"),
    ("230", "Mauritius"),
    ("94", "Sri Lanka"),
    ("91", "India"),
    ("65", "Singapore"),
    ("60", "Malaysia"),
    ("61", "Australia"),
    ("64", "New Zealand"),
    ("44", "United Kingdom"),
    ("49", "Germany"),
    ("33", "France"),
    ("41", "Switzerland"),
    ("27", "South Africa"),
    ("1", "United States"),
];

/// Best-effort country lookup from a phone number's international dial code.
///
/// A bare ten-digit number starting with 6-9 is treated as an Indian mobile.
pub fn country_from_mobile(mobile: &str) -> Option<&'static str> {
    let trimmed = mobile.trim();
    let international = trimmed.starts_with('+') || trimmed.starts_with("00");
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    if !international {
        let is_indian_mobile = digits.len() == 10
            && digits
                .chars()
                .next()
                .is_some_and(|first| ('6'..='9').contains(&first));
        return is_indian_mobile.then_some("India");
    }

    let digits = if trimmed.starts_with("00") {
        &digits[2..]
    } else {
        digits.as_str()
    };
    DIAL_CODES
        .iter()
        .filter(|(code, _)| digits.starts_with(code))
        .max_by_key(|(code, _)| code.len())
        .map(|(_, country)| *country)
}
