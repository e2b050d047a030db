use serde::{Deserialize, Serialize};

use super::{ActivityPointEntry, AttendanceRecord, Marathon, MarathonGroup, Servant, SystemConfig, Youth};

/// Hela fjärrdokumentet. Skrivs alltid i sin helhet, aldrig delvis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub youth: Vec<Youth>,
    pub attendance: Vec<AttendanceRecord>,
    pub servants: Vec<Servant>,
    pub marathons: Vec<Marathon>,
    pub marathon_groups: Vec<MarathonGroup>,
    pub marathon_points: Vec<ActivityPointEntry>,
    pub config: SystemConfig,
    /// ISO-8601, satt av skrivaren
    pub updated_at: String,
}

impl RemoteDocument {
    /// Tomt dokument med standardkonfiguration
    pub fn empty(updated_at: String) -> Self {
        Self {
            youth: Vec::new(),
            attendance: Vec::new(),
            servants: Vec::new(),
            marathons: Vec::new(),
            marathon_groups: Vec::new(),
            marathon_points: Vec::new(),
            config: SystemConfig::default(),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        let json = serde_json::to_value(RemoteDocument::empty("2026-03-06T10:00:00Z".into())).unwrap();
        for key in [
            "youth",
            "attendance",
            "servants",
            "marathons",
            "marathonGroups",
            "marathonPoints",
            "config",
            "updatedAt",
        ] {
            assert!(json.get(key).is_some(), "saknar {}", key);
        }
    }
}
