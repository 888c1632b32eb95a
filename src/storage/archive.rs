//! Per-player match archive.

use std::collections::HashMap;

use tracing::info;

use super::{JsonlFile, StorageConfig, StorageError};
use crate::models::{MatchRecord, PlatformRegion, TimeWindow};

/// Archived matches for one player, newest first, unique by match id.
pub struct MatchArchive {
    file: JsonlFile<MatchRecord>,
}

impl MatchArchive {
    pub fn open(config: &StorageConfig, region: PlatformRegion, puuid: &str) -> Self {
        Self {
            file: JsonlFile::new(config.match_archive_path(region, puuid)),
        }
    }

    pub fn exists(&self) -> bool {
        self.file.exists()
    }

    /// All archived matches.
    pub fn load(&self) -> Result<Vec<MatchRecord>, StorageError> {
        self.file.read_all()
    }

    /// Archived matches created inside `window`.
    pub fn load_window(&self, window: TimeWindow) -> Result<Vec<MatchRecord>, StorageError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|m| window.contains(m.game_creation.div_euclid(1000)))
            .collect())
    }

    /// Merge `matches` into the archive. Returns how many were new.
    ///
    /// A match already in the archive is replaced by the incoming copy.
    pub fn merge(&self, matches: &[MatchRecord]) -> Result<usize, StorageError> {
        let mut by_id: HashMap<String, MatchRecord> = self
            .load()?
            .into_iter()
            .map(|m| (m.match_id.clone(), m))
            .collect();

        let mut added = 0;
        for record in matches {
            if by_id.insert(record.match_id.clone(), record.clone()).is_none() {
                added += 1;
            }
        }

        let mut merged: Vec<MatchRecord> = by_id.into_values().collect();
        merged.sort_by(|a, b| {
            b.game_creation
                .cmp(&a.game_creation)
                .then_with(|| a.match_id.cmp(&b.match_id))
        });

        self.file.replace(&merged)?;
        info!(
            "Archived {} new matches ({} total) in {:?}",
            added,
            merged.len(),
            self.file.path()
        );
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchParticipation;
    use tempfile::TempDir;

    fn record(match_id: &str, created_ms: i64, kills: u32) -> MatchRecord {
        MatchRecord {
            match_id: match_id.to_string(),
            game_creation: created_ms,
            game_duration: 1800,
            game_mode: "CLASSIC".to_string(),
            game_type: "MATCHED_GAME".to_string(),
            queue_id: 420,
            participants: vec![MatchParticipation {
                match_id: match_id.to_string(),
                puuid: "p1".to_string(),
                summoner_id: String::new(),
                player_name: "Alpha".to_string(),
                champion_id: 1,
                champion_name: "Annie".to_string(),
                kills,
                deaths: 1,
                assists: 1,
                win: true,
                game_duration: 1800,
                items: [0; 7],
                total_damage_dealt: 0,
                gold_earned: 0,
                cs_total: 0,
            }],
        }
    }

    fn archive(temp_dir: &TempDir) -> MatchArchive {
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        MatchArchive::open(&config, PlatformRegion::Na1, "p1")
    }

    #[test]
    fn test_merge_dedupes_and_sorts_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let archive = archive(&temp_dir);
        assert!(!archive.exists());

        assert_eq!(
            archive
                .merge(&[record("NA1_1", 1_000, 1), record("NA1_2", 2_000, 1)])
                .unwrap(),
            2
        );
        assert_eq!(
            archive
                .merge(&[record("NA1_2", 2_000, 9), record("NA1_3", 3_000, 1)])
                .unwrap(),
            1
        );

        let loaded = archive.load().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["NA1_3", "NA1_2", "NA1_1"]);
        assert_eq!(loaded[1].participants[0].kills, 9);
    }

    #[test]
    fn test_load_window_filters_by_creation_seconds() {
        let temp_dir = TempDir::new().unwrap();
        let archive = archive(&temp_dir);
        archive
            .merge(&[
                record("NA1_1", 10_000, 1),
                record("NA1_2", 20_500, 1),
                record("NA1_3", 30_000, 1),
            ])
            .unwrap();

        let inside = archive.load_window(TimeWindow::new(20, 30)).unwrap();
        let ids: Vec<&str> = inside.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["NA1_3", "NA1_2"]);
    }
}
