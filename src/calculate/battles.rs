//! Battle-log statistics.

use crate::models::{BattleLogEntry, BattleOutcome, BattleRow, BattleStats};

/// Showdown placements that still count as a win.
const SOLO_SHOWDOWN_VICTORY_RANK: u32 = 4;
const DUO_SHOWDOWN_VICTORY_RANK: u32 = 2;

/// Display format for battle times.
const ROW_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Decide the outcome of a battle.
///
/// Showdown modes are judged by placement; every other mode by its
/// `result` field. Anything else is `Unknown`.
pub fn battle_outcome(entry: &BattleLogEntry) -> BattleOutcome {
    let mode = entry.mode().to_ascii_lowercase();
    match (mode.as_str(), entry.battle.rank) {
        ("soloshowdown", Some(rank)) => placement_outcome(rank, SOLO_SHOWDOWN_VICTORY_RANK),
        ("duoshowdown", Some(rank)) => placement_outcome(rank, DUO_SHOWDOWN_VICTORY_RANK),
        _ => match entry.battle.result.as_deref().map(str::to_ascii_lowercase) {
            Some(r) if r == "victory" => BattleOutcome::Victory,
            Some(r) if r == "defeat" => BattleOutcome::Defeat,
            Some(r) if r == "draw" => BattleOutcome::Draw,
            _ => BattleOutcome::Unknown,
        },
    }
}

fn placement_outcome(rank: u32, worst_winning_rank: u32) -> BattleOutcome {
    if (1..=worst_winning_rank).contains(&rank) {
        BattleOutcome::Victory
    } else {
        BattleOutcome::Defeat
    }
}

/// Win/loss partition of a battle log, overall and per game mode.
///
/// An empty log gives zero counts and a `None` win rate.
pub fn battle_stats(entries: &[BattleLogEntry], player_tag: &str) -> BattleStats {
    let mut stats = BattleStats::default();

    for entry in entries {
        let outcome = battle_outcome(entry);
        stats.overall.record(outcome);
        stats
            .by_mode
            .entry(entry.mode().to_string())
            .or_default()
            .record(outcome);
        stats.net_trophy_change += entry.battle.trophy_change.unwrap_or(0);
    }

    stats.win_rate = stats.overall.win_rate();
    stats.star_player_count = star_player_count(entries, player_tag);
    stats
}

/// How many battles named the player star player.
pub fn star_player_count(entries: &[BattleLogEntry], player_tag: &str) -> u32 {
    entries
        .iter()
        .filter(|e| e.is_star_player(player_tag))
        .count() as u32
}

/// Running total of trophy changes, oldest battle first.
///
/// The API lists the most recent battle first. Battles without a trophy
/// change are skipped; battles the player is not listed in add zero.
pub fn cumulative_trophy_changes(entries: &[BattleLogEntry], player_tag: &str) -> Vec<i32> {
    let mut total = 0;
    entries
        .iter()
        .rev()
        .filter_map(|entry| {
            let change = entry.battle.trophy_change?;
            if entry.find_participant(player_tag).is_some() {
                total += change;
            }
            Some(total)
        })
        .collect()
}

/// Table rows for a battle log, in API order.
pub fn format_battle_log(entries: &[BattleLogEntry], player_tag: &str) -> Vec<BattleRow> {
    entries
        .iter()
        .map(|entry| format_battle(entry, player_tag))
        .collect()
}

fn format_battle(entry: &BattleLogEntry, player_tag: &str) -> BattleRow {
    let (brawler, power, trophies) = match entry.find_participant(player_tag) {
        // Duels: one brawler per round.
        Some(p) if !p.brawlers.is_empty() => (
            p.brawlers
                .iter()
                .map(|b| title_case(&b.name))
                .collect::<Vec<_>>()
                .join(" → "),
            p.brawlers.iter().map(|b| b.power).sum(),
            p.brawlers.iter().map(|b| b.trophies).sum(),
        ),
        Some(p) => match &p.brawler {
            Some(b) => (title_case(&b.name), b.power, b.trophies),
            None => ("Unknown".to_string(), 0, 0),
        },
        None => ("Unknown".to_string(), 0, 0),
    };

    BattleRow {
        time: entry
            .timestamp()
            .map(|t| t.format(ROW_TIME_FORMAT).to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        brawler,
        power,
        trophies,
        mode: entry.mode().to_string(),
        map: entry
            .event
            .map
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        battle_type: entry
            .battle
            .battle_type
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        result: battle_outcome(entry),
        duration_secs: entry.battle.duration,
        trophy_change: entry.battle.trophy_change,
        rank: entry.battle.rank,
        star_player: entry.is_star_player(player_tag),
    }
}

/// `EL PRIMO` -> `El Primo`.
fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
