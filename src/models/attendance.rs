use serde::{Deserialize, Serialize};

use super::marathon::Activity;

/// Vem en närvaropost gäller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PersonRef {
    Youth(String),
    Servant(String),
}

impl PersonRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Youth(id) | Self::Servant(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitationDetails {
    pub visitor_name: String,
    pub visit_date: String,
}

/// Närvaro för en person ett visst datum. Högst en post per (person, datum).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servant_id: Option<String>,
    pub date: String,
    #[serde(default)]
    pub liturgy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liturgy_time: Option<String>,
    #[serde(default)]
    pub meeting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<String>,
    #[serde(default)]
    pub visitation: bool,
    #[serde(default)]
    pub bible_reading: bool,
    #[serde(default)]
    pub confession: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confession_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confessor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitation_details: Option<VisitationDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasbeha: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_competition: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communion: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exodus_competition: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorization_part: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fasting: Option<bool>,
}

impl AttendanceRecord {
    /// Tom post för (person, datum) med deterministiskt id
    pub fn new(person: &PersonRef, date: &str) -> Self {
        let mut record = Self {
            id: Self::record_id(person.id(), date),
            date: date.to_string(),
            ..Default::default()
        };
        match person {
            PersonRef::Youth(id) => record.youth_id = Some(id.clone()),
            PersonRef::Servant(id) => record.servant_id = Some(id.clone()),
        }
        record
    }

    pub fn record_id(person_id: &str, date: &str) -> String {
        format!("{}-{}", person_id, date)
    }

    pub fn belongs_to(&self, person_id: &str) -> bool {
        self.youth_id.as_deref() == Some(person_id) || self.servant_id.as_deref() == Some(person_id)
    }

    pub fn is_for(&self, person: &PersonRef) -> bool {
        match person {
            PersonRef::Youth(id) => self.youth_id.as_deref() == Some(id.as_str()),
            PersonRef::Servant(id) => self.servant_id.as_deref() == Some(id.as_str()),
        }
    }

    /// Räknas personen som närvarande den här veckan?
    pub fn is_present(&self) -> bool {
        self.liturgy || self.meeting || self.visitation || self.bible_reading || self.confession
    }

    pub fn get(&self, field: AttendanceField) -> bool {
        match field {
            AttendanceField::Liturgy => self.liturgy,
            AttendanceField::Meeting => self.meeting,
            AttendanceField::Visitation => self.visitation,
            AttendanceField::BibleReading => self.bible_reading,
            AttendanceField::Confession => self.confession,
            AttendanceField::Tasbeha => self.tasbeha.unwrap_or(false),
            AttendanceField::WeeklyCompetition => self.weekly_competition.unwrap_or(false),
            AttendanceField::Communion => self.communion.unwrap_or(false),
            AttendanceField::ExodusCompetition => self.exodus_competition.unwrap_or(false),
            AttendanceField::MemorizationPart => self.memorization_part.unwrap_or(false),
            AttendanceField::Fasting => self.fasting.unwrap_or(false),
        }
    }

    /// Sätt ett fält. Bikt stämplar även biktdatum.
    pub fn set(&mut self, field: AttendanceField, value: bool) {
        match field {
            AttendanceField::Liturgy => self.liturgy = value,
            AttendanceField::Meeting => self.meeting = value,
            AttendanceField::Visitation => self.visitation = value,
            AttendanceField::BibleReading => self.bible_reading = value,
            AttendanceField::Confession => {
                self.confession = value;
                if value {
                    self.confession_date = Some(self.date.clone());
                }
            }
            AttendanceField::Tasbeha => self.tasbeha = Some(value),
            AttendanceField::WeeklyCompetition => self.weekly_competition = Some(value),
            AttendanceField::Communion => self.communion = Some(value),
            AttendanceField::ExodusCompetition => self.exodus_competition = Some(value),
            AttendanceField::MemorizationPart => self.memorization_part = Some(value),
            AttendanceField::Fasting => self.fasting = Some(value),
        }
    }
}

/// Booleska fält i en närvaropost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceField {
    Liturgy,
    Meeting,
    Visitation,
    BibleReading,
    Confession,
    Tasbeha,
    WeeklyCompetition,
    Communion,
    ExodusCompetition,
    MemorizationPart,
    Fasting,
}

impl AttendanceField {
    pub const ALL: &'static [Self] = &[
        Self::Liturgy,
        Self::Meeting,
        Self::Visitation,
        Self::BibleReading,
        Self::Confession,
        Self::Tasbeha,
        Self::WeeklyCompetition,
        Self::Communion,
        Self::ExodusCompetition,
        Self::MemorizationPart,
        Self::Fasting,
    ];

    /// Tävlingsaktivitet som fältet ger poäng för, om någon
    pub fn activity(&self) -> Option<Activity> {
        match self {
            Self::Liturgy => Some(Activity::Liturgy),
            Self::Meeting => Some(Activity::Meeting),
            Self::Confession => Some(Activity::Confession),
            Self::Tasbeha => Some(Activity::Tasbeha),
            Self::WeeklyCompetition => Some(Activity::WeeklyCompetition),
            Self::Communion => Some(Activity::Communion),
            Self::ExodusCompetition => Some(Activity::ExodusCompetition),
            Self::MemorizationPart => Some(Activity::MemorizationPart),
            Self::Fasting => Some(Activity::Fasting),
            Self::Visitation | Self::BibleReading => None,
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "liturgy" => Some(Self::Liturgy),
            "meeting" => Some(Self::Meeting),
            "visitation" => Some(Self::Visitation),
            "bibleReading" => Some(Self::BibleReading),
            "confession" => Some(Self::Confession),
            "tasbeha" => Some(Self::Tasbeha),
            "weeklyCompetition" => Some(Self::WeeklyCompetition),
            "communion" => Some(Self::Communion),
            "exodusCompetition" => Some(Self::ExodusCompetition),
            "memorizationPart" => Some(Self::MemorizationPart),
            "fasting" => Some(Self::Fasting),
            _ => None,
        }
    }
}
