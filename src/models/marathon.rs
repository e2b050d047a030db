use serde::{Deserialize, Serialize};

use crate::utils::date::parse_date_key;

/// Poänggivande aktivitet i ett maraton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    Confession,
    Tasbeha,
    Meeting,
    WeeklyCompetition,
    Liturgy,
    Communion,
    ExodusCompetition,
    MemorizationPart,
    Fasting,
}

impl Activity {
    pub const ALL: &'static [Self] = &[
        Self::Confession,
        Self::Tasbeha,
        Self::Meeting,
        Self::WeeklyCompetition,
        Self::Liturgy,
        Self::Communion,
        Self::ExodusCompetition,
        Self::MemorizationPart,
        Self::Fasting,
    ];

    /// Fast orsakstext för automatiskt härledda poäng
    pub fn auto_reason(&self) -> &'static str {
        match self {
            Self::Liturgy => "Närvaro vid liturgin",
            Self::Meeting => "Närvaro vid veckomötet",
            Self::Confession => "Bikt",
            Self::Tasbeha => "Närvaro vid tasbeha",
            Self::WeeklyCompetition => "Vinst i fredagstävlingen",
            Self::Communion => "Nattvard",
            Self::ExodusCompetition => "Tävling i Andra Moseboken",
            Self::MemorizationPart => "Uppläst memoreringsdel",
            Self::Fasting => "Fasta",
        }
    }
}

/// Poängvärde per aktivitet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointTable {
    pub confession: i64,
    pub tasbeha: i64,
    pub meeting: i64,
    pub weekly_competition: i64,
    pub liturgy: i64,
    pub communion: i64,
    pub exodus_competition: i64,
    pub memorization_part: i64,
    pub fasting: i64,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            confession: 20,
            tasbeha: 10,
            meeting: 10,
            weekly_competition: 15,
            liturgy: 10,
            communion: 15,
            exodus_competition: 15,
            memorization_part: 10,
            fasting: 10,
        }
    }
}

impl PointTable {
    pub fn points(&self, activity: Activity) -> i64 {
        match activity {
            Activity::Confession => self.confession,
            Activity::Tasbeha => self.tasbeha,
            Activity::Meeting => self.meeting,
            Activity::WeeklyCompetition => self.weekly_competition,
            Activity::Liturgy => self.liturgy,
            Activity::Communion => self.communion,
            Activity::ExodusCompetition => self.exodus_competition,
            Activity::MemorizationPart => self.memorization_part,
            Activity::Fasting => self.fasting,
        }
    }

    /// Maxpoäng för en person under en vecka
    pub fn weekly_max(&self) -> i64 {
        Activity::ALL.iter().map(|a| self.points(*a)).sum()
    }
}

/// Tävlingsperiod (maraton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marathon {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub point_system: PointTable,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_group_id: Option<String>,
}

impl Marathon {
    /// Inkluderar både start- och slutdatum. Datumnycklar jämförs lexikografiskt.
    pub fn covers(&self, date: &str) -> bool {
        self.start_date.as_str() <= date && date <= self.end_date.as_str()
    }

    pub fn validate(&self) -> Result<(), MarathonValidationError> {
        if self.name.trim().is_empty() {
            return Err(MarathonValidationError::MissingName);
        }
        let start = parse_date_key(&self.start_date)
            .ok_or_else(|| MarathonValidationError::InvalidDate(self.start_date.clone()))?;
        let end = parse_date_key(&self.end_date)
            .ok_or_else(|| MarathonValidationError::InvalidDate(self.end_date.clone()))?;
        if end < start {
            return Err(MarathonValidationError::EndBeforeStart);
        }
        Ok(())
    }
}

/// Formulärdata för ett nytt maraton. Nya maraton är aktiva och utan grupper.
#[derive(Debug, Clone, Default)]
pub struct NewMarathon {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub point_system: PointTable,
}

impl NewMarathon {
    pub fn into_marathon(self, id: String) -> Marathon {
        Marathon {
            id,
            name: self.name.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            point_system: self.point_system,
            group_ids: Vec::new(),
            active: true,
            winner_group_id: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub servant_name: String,
    pub youth_ids: Vec<String>,
}

impl NewGroup {
    pub fn into_group(self, id: String) -> MarathonGroup {
        MarathonGroup {
            id,
            name: self.name,
            servant_name: self.servant_name,
            youth_ids: self.youth_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarathonGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub servant_name: String,
    #[serde(default)]
    pub youth_ids: Vec<String>,
}

impl MarathonGroup {
    pub fn has_member(&self, youth_id: &str) -> bool {
        self.youth_ids.iter().any(|id| id == youth_id)
    }
}

/// Poängpost. Automatiska poster (`manual == false`) ägs av närvarosynken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPointEntry {
    pub marathon_id: String,
    pub youth_id: String,
    pub week_date: String,
    pub activity: Activity,
    pub points: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub manual: bool,
}

impl ActivityPointEntry {
    pub fn is_auto_for(&self, marathon_id: &str, youth_id: &str, week_date: &str, activity: Activity) -> bool {
        !self.manual
            && self.marathon_id == marathon_id
            && self.youth_id == youth_id
            && self.week_date == week_date
            && self.activity == activity
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MarathonValidationError {
    #[error("Maratonet måste ha ett namn")]
    MissingName,
    #[error("Ogiltigt datum: {0}")]
    InvalidDate(String),
    #[error("Slutdatum kan inte vara före startdatum")]
    EndBeforeStart,
}
