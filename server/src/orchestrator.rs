use std::{
    cmp::Reverse,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::NaiveDateTime;
use itertools::Itertools;
use shared::{
    api::StandingsSource, current_month_name, previous_month, previous_month_name, Countdown,
    RevealMode, Standings, StoredWinner, StoredWinnerInput,
};
use tracing::instrument;

use crate::{
    archive::WinnerArchive,
    consts::{LEADER_PLACEHOLDER, WINNER_PLACEHOLDER},
    types::{FullPageView, Spotlight, TeaserView, WinnerCard},
};

/// Local wall clock. Injected so the reveal window can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// Last month's closed result; `true` when it became the new previous winner.
    Archived(bool),
    Live,
    NoLeader,
    UnexpectedMonth(String),
    Offline,
}

#[derive(Debug, Default)]
struct Snapshot {
    previous_winner: Option<StoredWinner>,
    history: Vec<StoredWinner>,
    live_leader: Option<StoredWinnerInput>,
}

pub struct FanOfMonth {
    archive: WinnerArchive,
    source: Arc<dyn StandingsSource>,
    clock: Arc<dyn Clock>,
    media_base_url: Option<String>,
    snapshot: RwLock<Snapshot>,
}

impl FanOfMonth {
    /// Loads the archive straight away so views work before the first fetch.
    pub fn new(
        archive: WinnerArchive,
        source: Arc<dyn StandingsSource>,
        clock: Arc<dyn Clock>,
        media_base_url: Option<String>,
    ) -> Self {
        let snapshot = Snapshot {
            previous_winner: archive.get_current(),
            history: archive.get_all_history(),
            live_leader: None,
        };
        Self {
            archive,
            source,
            clock,
            media_base_url,
            snapshot: RwLock::new(snapshot),
        }
    }

    pub fn archive(&self) -> &WinnerArchive {
        &self.archive
    }

    pub fn reload(&self) {
        let previous_winner = self.archive.get_current();
        let history = self.archive.get_all_history();
        let mut snapshot = self.write_snapshot();
        snapshot.previous_winner = previous_winner;
        snapshot.history = history;
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Refresh {
        match self.source.fetch_standings().await {
            Ok(standings) => self.reconcile(standings),
            Err(e) => {
                tracing::error!("Failed to fetch fan of the month standings: {e:#}");
                Refresh::Offline
            }
        }
    }

    pub async fn sync(&self) -> FullPageView {
        self.reload();
        self.refresh().await;
        self.full_page()
    }

    fn reconcile(&self, standings: Standings) -> Refresh {
        let now = self.clock.now();
        let leader = standings.leader().and_then(|fan| {
            fan.to_winner_input(
                &standings.month,
                standings.year,
                self.media_base_url.as_deref(),
            )
        });

        let outcome = if standings.month == previous_month_name(now) {
            self.write_snapshot().live_leader = None;
            match leader {
                Some(candidate) => {
                    let (_, expected_year) = previous_month(now);
                    if candidate.year != expected_year {
                        tracing::warn!(
                            "Archived standings for {} report year {}, expected {expected_year}",
                            candidate.month,
                            candidate.year
                        );
                    }
                    Refresh::Archived(self.archive.save_current(candidate))
                }
                None => Refresh::NoLeader,
            }
        } else if standings.month == current_month_name(now) {
            let outcome = if leader.is_some() {
                Refresh::Live
            } else {
                Refresh::NoLeader
            };
            self.write_snapshot().live_leader = leader;
            outcome
        } else {
            tracing::warn!(
                "Ignoring standings for {} {}",
                standings.month,
                standings.year
            );
            Refresh::UnexpectedMonth(standings.month)
        };

        tracing::debug!("Fan of the month refresh: {outcome:?}");
        self.reload();
        outcome
    }

    pub fn teaser(&self) -> TeaserView {
        let now = self.clock.now();
        let snapshot = self.read_snapshot();
        TeaserView {
            current_month: current_month_name(now).to_string(),
            spotlight: spotlight(now, &snapshot),
        }
    }

    pub fn full_page(&self) -> FullPageView {
        let now = self.clock.now();
        let snapshot = self.read_snapshot();
        FullPageView {
            current_month: current_month_name(now).to_string(),
            spotlight: spotlight(now, &snapshot),
            hall_of_fame: hall_of_fame(&snapshot.history),
        }
    }

    pub fn hall_of_fame(&self) -> Vec<WinnerCard> {
        hall_of_fame(&self.read_snapshot().history)
    }

    fn read_snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_snapshot(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn spotlight(now: NaiveDateTime, snapshot: &Snapshot) -> Spotlight {
    let champion = snapshot.previous_winner.as_ref().map(WinnerCard::from);
    match RevealMode::classify(now) {
        RevealMode::Reveal => Spotlight::Reveal {
            winner_name: display_name(champion.as_ref(), WINNER_PLACEHOLDER),
            winner: champion,
        },
        RevealMode::Countdown => {
            // A leader fetched last month is stale once the month turns
            let leader = snapshot
                .live_leader
                .as_ref()
                .filter(|leader| leader.month == current_month_name(now))
                .map(WinnerCard::from);
            Spotlight::Countdown {
                leader_name: display_name(leader.as_ref(), LEADER_PLACEHOLDER),
                leader,
                champion_name: display_name(champion.as_ref(), WINNER_PLACEHOLDER),
                reigning_champion: champion,
                countdown: Countdown::until(now).into(),
            }
        }
    }
}

fn display_name(card: Option<&WinnerCard>, placeholder: &str) -> String {
    card.map_or_else(|| placeholder.to_string(), |card| card.name.clone())
}

fn hall_of_fame(history: &[StoredWinner]) -> Vec<WinnerCard> {
    history
        .iter()
        .sorted_by_key(|winner| Reverse(winner.period_key()))
        .map(WinnerCard::from)
        .collect()
}
