//! Dashboard views.
//!
//! Each view is assembled from cached API fetches and pure calculations.
//! Views are split into [`Section`]s so that one failing fetch (or the AI
//! summary) only blanks its own part of the page.

mod section;
mod views;

pub use section::Section;
pub use views::{
    BattleReport, BrawlerOverview, ClubOverview, ClubSummary, ComparisonView, HeadToHeadEntry,
    PlayerOverview, PlayerPanel,
};

use std::sync::Arc;

use tracing::{info, warn};

use crate::agents::{Agent, AgentError, ComparisonAgent, ComparisonInput, PlayerSummary};
use crate::calculate;
use crate::config::FeaturedClub;
use crate::fetch::{ApiClient, FetchError, ResourceKind};
use crate::models::{BattleLogEntry, ClubMember, ClubProfile, PlayerProfile};

/// Number of ranking rows shown for a brawler.
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// A player together with everything fetched alongside them.
struct LoadedPlayer {
    profile: PlayerProfile,
    club: Option<Result<ClubProfile, FetchError>>,
    battles: Result<Vec<BattleLogEntry>, FetchError>,
}

/// Builds views from the API client, the calculators and the AI agent.
pub struct Dashboard {
    api: Arc<ApiClient>,
    comparison: Option<ComparisonAgent>,
    featured_clubs: Vec<FeaturedClub>,
    power_threshold: u8,
    histogram_bins: usize,
    ranking_limit: usize,
}

impl Dashboard {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            comparison: None,
            featured_clubs: Vec::new(),
            power_threshold: calculate::DEFAULT_POWER_THRESHOLD,
            histogram_bins: calculate::DEFAULT_HISTOGRAM_BINS,
            ranking_limit: DEFAULT_RANKING_LIMIT,
        }
    }

    pub fn with_comparison_agent(mut self, agent: ComparisonAgent) -> Self {
        self.comparison = Some(agent);
        self
    }

    pub fn with_featured_clubs(mut self, clubs: Vec<FeaturedClub>) -> Self {
        self.featured_clubs = clubs;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn featured_clubs(&self) -> &[FeaturedClub] {
        &self.featured_clubs
    }

    async fn load_player(&self, tag: &str) -> Result<LoadedPlayer, FetchError> {
        let profile = self.api.player(tag).await?;

        let club = async {
            match profile.club_tag() {
                Some(club_tag) => Some(self.api.club(club_tag).await),
                None => None,
            }
        };
        let (club, battles) = tokio::join!(club, self.api.battle_log(tag));

        if let Some(Err(e)) = &club {
            warn!("Club for {} unavailable: {}", profile.tag, e);
        }
        if let Err(e) = &battles {
            warn!("Battle log for {} unavailable: {}", profile.tag, e);
        }

        Ok(LoadedPlayer {
            profile,
            club,
            battles,
        })
    }

    fn panel(&self, loaded: &LoadedPlayer) -> PlayerPanel {
        let profile = &loaded.profile;

        let club = loaded.club.as_ref().map(|result| {
            Section::from(
                result
                    .clone()
                    .map(|club| club_summary(&club, Some(profile.tag.as_str()))),
            )
        });

        let battles = Section::from(
            loaded
                .battles
                .as_ref()
                .map(|entries| battle_report(entries, &profile.tag))
                .map_err(Clone::clone),
        );

        PlayerPanel {
            overview: PlayerOverview {
                tag: profile.tag.clone(),
                name: profile.name.clone(),
                name_color: profile.name_color.clone(),
                trophies: profile.trophies,
                highest_trophies: profile.highest_trophies,
                exp_level: profile.exp_level,
                victories: calculate::victory_breakdown(profile),
            },
            club,
            brawler_stats: calculate::brawler_stats(&profile.brawlers, self.power_threshold),
            brawlers: calculate::brawler_rows(&profile.brawlers),
            battles,
        }
    }

    fn summary_input(&self, loaded: &LoadedPlayer, panel: &PlayerPanel) -> PlayerSummary {
        PlayerSummary::new(
            &loaded.profile,
            loaded.club.as_ref().and_then(|c| c.as_ref().ok()),
            &panel.brawler_stats,
            panel.battles.data().map(|report| &report.stats),
        )
    }

    /// Profile, club, brawlers and battle report for one player.
    pub async fn player(&self, tag: &str) -> Result<PlayerPanel, FetchError> {
        let loaded = self.load_player(tag).await?;
        Ok(self.panel(&loaded))
    }

    /// Like [`player`](Self::player), but bypasses the cache.
    ///
    /// Only the profile is fetched eagerly; the battle log and club are
    /// dropped from the cache and reloaded by the panel, so their failures
    /// stay confined to their sections.
    pub async fn refresh_player(&self, tag: &str) -> Result<PlayerPanel, FetchError> {
        self.api.refresh(ResourceKind::Player, tag).await?;
        self.api.invalidate(ResourceKind::BattleLog, tag).await?;

        let profile = self.api.player(tag).await?;
        if let Some(club_tag) = profile.club_tag() {
            if let Err(e) = self.api.invalidate(ResourceKind::Club, club_tag).await {
                warn!("Cannot refresh club {} of {}: {}", club_tag, profile.tag, e);
            }
        }
        self.player(tag).await
    }

    pub async fn player_panel(&self, tag: &str) -> Section<PlayerPanel> {
        Section::from(self.player(tag).await)
    }

    /// Battle report only.
    pub async fn battle_report(&self, tag: &str) -> Result<BattleReport, FetchError> {
        let normalized = ResourceKind::BattleLog.normalize_id(tag)?;
        let entries = self.api.battle_log(&normalized).await?;
        Ok(battle_report(&entries, &normalized))
    }

    /// Compare two players side by side, optionally with an AI summary.
    pub async fn compare(&self, tag_a: &str, tag_b: &str, with_ai: bool) -> ComparisonView {
        info!("Comparing {} with {}", tag_a, tag_b);
        let (a, b) = tokio::join!(self.load_player(tag_a), self.load_player(tag_b));

        let panel_a = a.as_ref().map(|l| self.panel(l));
        let panel_b = b.as_ref().map(|l| self.panel(l));

        let head_to_head = match (&a, &panel_a, &b, &panel_b) {
            (Ok(la), Ok(pa), Ok(lb), Ok(pb)) => Some([head_to_head(la, pa), head_to_head(lb, pb)]),
            _ => None,
        };

        let summary = if with_ai {
            Some(match (&a, &panel_a, &b, &panel_b) {
                (Ok(la), Ok(pa), Ok(lb), Ok(pb)) => {
                    let input = ComparisonInput {
                        first: self.summary_input(la, pa),
                        second: self.summary_input(lb, pb),
                    };
                    self.summarize(input).await
                }
                _ => Section::unavailable(
                    "Both players must load before they can be compared.",
                    "MISSING_PLAYER_DATA",
                ),
            })
        } else {
            None
        };

        ComparisonView {
            first: Section::from(panel_a.map_err(|e| e.clone())),
            second: Section::from(panel_b.map_err(|e| e.clone())),
            head_to_head,
            summary,
        }
    }

    async fn summarize(&self, input: ComparisonInput) -> Section<String> {
        let Some(agent) = &self.comparison else {
            return Section::unavailable("AI summaries are disabled.", "AI_DISABLED");
        };

        let result: Result<String, AgentError> = agent.execute(input).await;
        if let Err(e) = &result {
            warn!("AI comparison failed: {}", e);
        }
        Section::from(result)
    }

    /// Club header, aggregates, sorted member list and trophy histogram.
    pub async fn club_overview(&self, tag: &str) -> Result<ClubOverview, FetchError> {
        let club = self.api.club(tag).await?;

        let members = calculate::members_by_trophies(&club.members);
        let trophies: Vec<u32> = members.iter().map(|m| m.trophies).collect();
        Ok(ClubOverview {
            summary: club_summary(&club, None),
            stats: calculate::club_stats(&club.members),
            trophy_distribution: calculate::trophy_distribution(&trophies, self.histogram_bins),
            members,
        })
    }

    /// A club's member list from the dedicated members endpoint, highest
    /// trophies first.
    pub async fn club_members(&self, tag: &str) -> Result<Vec<ClubMember>, FetchError> {
        let members = self.api.club_members(tag).await?;
        Ok(calculate::members_by_trophies(&members))
    }

    /// Brawler details plus the global top players on it.
    pub async fn brawler_overview(&self, id: &str) -> Result<BrawlerOverview, FetchError> {
        let (brawler, rankings) = tokio::join!(
            self.api.brawler(id),
            self.api.brawler_rankings(id, self.ranking_limit)
        );
        if let Err(e) = &rankings {
            warn!("Rankings for brawler {} unavailable: {}", id, e);
        }

        Ok(BrawlerOverview {
            brawler: brawler?,
            rankings: Section::from(rankings),
        })
    }
}

fn club_summary(club: &ClubProfile, player_tag: Option<&str>) -> ClubSummary {
    let roles = club.member_roles();
    ClubSummary {
        tag: club.tag.clone(),
        name: club.name.clone(),
        description: club.description.clone().filter(|d| !d.is_empty()),
        club_type: club.club_type,
        required_trophies: club.required_trophies,
        trophies: club.trophies,
        member_count: roles.len() as u32,
        player_role: player_tag.and_then(|tag| roles.get(tag).copied()),
    }
}

fn battle_report(entries: &[BattleLogEntry], player_tag: &str) -> BattleReport {
    BattleReport {
        stats: calculate::battle_stats(entries, player_tag),
        rows: calculate::format_battle_log(entries, player_tag),
        trophy_trend: calculate::cumulative_trophy_changes(entries, player_tag),
    }
}

fn head_to_head(loaded: &LoadedPlayer, panel: &PlayerPanel) -> HeadToHeadEntry {
    HeadToHeadEntry {
        name: loaded.profile.name.clone(),
        tag: loaded.profile.tag.clone(),
        trophies: loaded.profile.trophies,
        highest_trophies: loaded.profile.highest_trophies,
        victories: panel.overview.victories,
        trophy_trend: panel
            .battles
            .data()
            .map(|report| report.trophy_trend.clone())
            .unwrap_or_default(),
    }
}
