//! Comparison Agent.
//!
//! Writes a short prose comparison of two players from their processed
//! statistics. The prompt is a fixed template; the model's text is returned
//! verbatim (trimmed).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::{AiBackend, ChatMessage, ChatRequest};
use super::{Agent, AgentError};
use crate::config::AiConfig;
use crate::models::{BattleStats, BrawlerStats, ClubProfile, PlayerProfile};

/// Everything the prompt says about one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub tag: String,
    pub trophies: u32,
    pub highest_trophies: u32,
    pub trio_victories: u32,
    pub solo_victories: u32,
    pub duo_victories: u32,
    pub club_name: Option<String>,
    pub club_trophies: Option<u32>,
    pub total_brawlers: u32,
    pub high_level_brawlers: u32,
    pub max_level_brawlers: u32,
    pub average_brawler_trophies: Option<f64>,
    /// Win rate over the recent battle log, as a percentage.
    pub recent_win_rate: Option<f64>,
}

impl PlayerSummary {
    pub fn new(
        player: &PlayerProfile,
        club: Option<&ClubProfile>,
        brawlers: &BrawlerStats,
        battles: Option<&BattleStats>,
    ) -> Self {
        Self {
            name: player.name.clone(),
            tag: player.tag.clone(),
            trophies: player.trophies,
            highest_trophies: player.highest_trophies,
            trio_victories: player.trio_victories,
            solo_victories: player.solo_victories,
            duo_victories: player.duo_victories,
            club_name: club
                .map(|c| c.name.clone())
                .or_else(|| player.club.as_ref().and_then(|c| c.name.clone())),
            club_trophies: club.map(|c| c.trophies),
            total_brawlers: brawlers.total_brawlers,
            high_level_brawlers: brawlers.high_level_brawlers,
            max_level_brawlers: brawlers.max_level_brawlers,
            average_brawler_trophies: brawlers.average_trophies,
            recent_win_rate: battles.and_then(|b| b.win_rate),
        }
    }

    fn prompt_section(&self, label: &str) -> String {
        format!(
            "{label} ({name}):\n\
             - Trophies: {trophies} (highest {highest})\n\
             - 3vs3 victories: {trio}\n\
             - Solo victories: {solo}\n\
             - Duo victories: {duo}\n\
             - Club: {club}\n\
             - Club trophies: {club_trophies}\n\
             - Brawlers unlocked: {total}\n\
             - Brawlers at power 9+: {high}\n\
             - Brawlers at power 11: {max}\n\
             - Average trophies per brawler: {avg}\n\
             - Win rate in recent battles: {win_rate}\n",
            label = label,
            name = self.name,
            trophies = self.trophies,
            highest = self.highest_trophies,
            trio = self.trio_victories,
            solo = self.solo_victories,
            duo = self.duo_victories,
            club = self.club_name.as_deref().unwrap_or("none"),
            club_trophies = optional(self.club_trophies.map(|t| t.to_string())),
            total = self.total_brawlers,
            high = self.high_level_brawlers,
            max = self.max_level_brawlers,
            avg = optional(self.average_brawler_trophies.map(|a| format!("{:.1}", a))),
            win_rate = optional(self.recent_win_rate.map(|w| format!("{:.1}%", w))),
        )
    }
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "no data".to_string())
}

/// Input for the Comparison agent.
#[derive(Debug, Clone)]
pub struct ComparisonInput {
    pub first: PlayerSummary,
    pub second: PlayerSummary,
}

/// Comparison agent implementation.
pub struct ComparisonAgent {
    backend: Arc<dyn AiBackend>,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl ComparisonAgent {
    pub fn new(backend: Arc<dyn AiBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            temperature: 0.7,
            max_tokens: 300,
        }
    }

    pub fn from_config(backend: Arc<dyn AiBackend>, config: &AiConfig) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(config.timeout_seconds),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn build_prompt(&self, input: &ComparisonInput) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(COMPARISON_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Compare the following two Brawl Stars players based on their statistics:\n\n\
                 {}\n{}\n\
                 Write an analysis of at most six sentences. Highlight the most important \
                 differences and say who is stronger in which areas.",
                input.first.prompt_section("Player 1"),
                input.second.prompt_section("Player 2"),
            )),
        ]
    }
}

const COMPARISON_SYSTEM_PROMPT: &str =
    "You are a Brawl Stars expert who analyses player statistics.";

#[async_trait]
impl Agent for ComparisonAgent {
    type Input = ComparisonInput;
    type Output = String;

    fn name(&self) -> &'static str {
        "comparison"
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, AgentError> {
        info!(
            "Running comparison of {} and {} via {}",
            input.first.name,
            input.second.name,
            self.backend.name()
        );

        let request = ChatRequest::new(self.build_prompt(&input))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = tokio::time::timeout(self.timeout, self.backend.chat(request))
            .await
            .map_err(|_| {
                warn!("Comparison timed out after {:?}", self.timeout);
                AgentError::Timeout(self.timeout)
            })??;
        debug!("AI response: {}", response.content);

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AgentError::ResponseParseError(
                "empty completion".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::backend::MockBackend;

    fn summary(name: &str, win_rate: Option<f64>) -> PlayerSummary {
        PlayerSummary {
            name: name.to_string(),
            tag: "#ABC".to_string(),
            trophies: 30000,
            highest_trophies: 31000,
            trio_victories: 9000,
            solo_victories: 800,
            duo_victories: 1400,
            club_name: None,
            club_trophies: None,
            total_brawlers: 80,
            high_level_brawlers: 40,
            max_level_brawlers: 12,
            average_brawler_trophies: Some(512.345),
            recent_win_rate: win_rate,
        }
    }

    fn input() -> ComparisonInput {
        ComparisonInput {
            first: summary("Spoony", Some(62.5)),
            second: summary("Bolt", None),
        }
    }

    #[tokio::test]
    async fn test_comparison_returns_trimmed_text() {
        let backend = Arc::new(MockBackend::new("  Spoony wins more often.\n"));
        let agent = ComparisonAgent::new(backend.clone(), Duration::from_secs(5));

        let text = agent.execute(input()).await.unwrap();
        assert_eq!(text, "Spoony wins more often.");

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, Some(300));
        let prompt = &requests[0].messages[1].content;
        assert!(prompt.contains("Player 1 (Spoony)"));
        assert!(prompt.contains("Player 2 (Bolt)"));
        assert!(prompt.contains("Win rate in recent battles: 62.5%"));
        assert!(prompt.contains("Win rate in recent battles: no data"));
        assert!(prompt.contains("Average trophies per brawler: 512.3"));
    }

    #[tokio::test]
    async fn test_comparison_times_out() {
        let backend = Arc::new(MockBackend::new("late").with_delay(Duration::from_millis(500)));
        let agent = ComparisonAgent::new(backend, Duration::from_millis(20));

        let err = agent.execute(input()).await.unwrap_err();
        assert_eq!(err, AgentError::Timeout(Duration::from_millis(20)));
        assert_eq!(err.to_string(), "Timeout after 20ms");
    }

    #[tokio::test]
    async fn test_comparison_propagates_backend_error() {
        let backend = Arc::new(MockBackend::failing(AgentError::RateLimited(10)));
        let agent = ComparisonAgent::new(backend, Duration::from_secs(5));

        assert_eq!(
            agent.execute(input()).await.unwrap_err(),
            AgentError::RateLimited(10)
        );
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let backend = Arc::new(MockBackend::new("   "));
        let agent = ComparisonAgent::new(backend, Duration::from_secs(5));

        assert!(matches!(
            agent.execute(input()).await,
            Err(AgentError::ResponseParseError(_))
        ));
    }

    #[test]
    fn test_summary_from_profile() {
        let player: PlayerProfile = serde_json::from_str(
            r##"{"tag": "#ABC", "name": "Spoony", "trophies": 10, "highestTrophies": 20,
                 "club": {"tag": "#CLUB", "name": "Spike"}}"##,
        )
        .unwrap();

        let summary = PlayerSummary::new(&player, None, &BrawlerStats::default(), None);
        assert_eq!(summary.club_name.as_deref(), Some("Spike"));
        assert_eq!(summary.club_trophies, None);
        assert_eq!(summary.recent_win_rate, None);
    }

    #[test]
    fn test_agent_name() {
        let backend: Arc<dyn AiBackend> = Arc::new(MockBackend::new("{}"));
        let agent = ComparisonAgent::new(backend, Duration::from_secs(1));
        assert_eq!(agent.name(), "comparison");
    }
}
