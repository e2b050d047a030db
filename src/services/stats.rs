//! Härledda värden för översikt och tävling
//!
//! Allt här är rena funktioner över redan lästa samlingar.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ActivityPointEntry, AttendanceRecord, Marathon, MarathonGroup, Youth};
use crate::utils::date::parse_date_key;

/// Antal senaste veckor som väger tyngre i närvarograden
const RECENT_WEEKS: usize = 4;
const RECENT_WEIGHT: f64 = 0.6;
const OLDER_WEIGHT: f64 = 0.4;

/// Liturgi före denna tid räknas som tidig ankomst
const EARLY_BIRD_CUTOFF: &str = "08:15";

/// Närvaro på minst så många av de fyra senaste mötena räknas som regelbunden
const REGULAR_MIN_WEEKS: usize = 3;

/// Viktad närvarograd för en person, 0.0 till 1.0.
///
/// `weeks` är mötesdatum med det senaste först. De fyra senaste väger 60 %
/// och resten 40 % när det finns fler än fyra veckor.
pub fn attendance_rate<S: AsRef<str>>(person_id: &str, records: &[AttendanceRecord], weeks: &[S]) -> f64 {
    if weeks.is_empty() {
        return 0.0;
    }

    let present: HashSet<&str> = records
        .iter()
        .filter(|r| r.belongs_to(person_id) && r.is_present())
        .map(|r| r.date.as_str())
        .collect();

    let rate = |slice: &[S]| -> f64 {
        let hits = slice.iter().filter(|d| present.contains(d.as_ref())).count();
        hits as f64 / slice.len() as f64
    };

    if weeks.len() <= RECENT_WEEKS {
        return rate(weeks);
    }

    let (recent, older) = weeks.split_at(RECENT_WEEKS);
    RECENT_WEIGHT * rate(recent) + OLDER_WEIGHT * rate(older)
}

/// Summa poäng i maratonet för gruppens medlemmar
pub fn group_total(marathon: &Marathon, group: &MarathonGroup, points: &[ActivityPointEntry]) -> i64 {
    points
        .iter()
        .filter(|p| p.marathon_id == marathon.id && group.has_member(&p.youth_id))
        .map(|p| p.points)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStanding {
    pub group_id: String,
    pub name: String,
    pub servant_name: String,
    pub total: i64,
    /// Poäng per veckodatum
    pub weekly: BTreeMap<String, i64>,
    /// Andel av maxpoäng hittills, 0 till 100
    pub level_percentage: u32,
    pub is_winner: bool,
}

/// Ställning per grupp, högst totalpoäng först
pub fn leaderboard(
    marathon: &Marathon,
    groups: &[MarathonGroup],
    points: &[ActivityPointEntry],
    today: NaiveDate,
) -> Vec<GroupStanding> {
    let weeks = weeks_elapsed(marathon, today);
    let weekly_max = marathon.point_system.weekly_max();

    let mut standings: Vec<GroupStanding> = groups
        .iter()
        .filter(|g| marathon.group_ids.contains(&g.id))
        .map(|group| {
            let mut weekly = BTreeMap::new();
            for p in points
                .iter()
                .filter(|p| p.marathon_id == marathon.id && group.has_member(&p.youth_id))
            {
                *weekly.entry(p.week_date.clone()).or_insert(0) += p.points;
            }
            let total = group_total(marathon, group, points);
            let max_total = group.youth_ids.len() as i64 * weekly_max * weeks;

            GroupStanding {
                group_id: group.id.clone(),
                name: group.name.clone(),
                servant_name: group.servant_name.clone(),
                total,
                weekly,
                level_percentage: level_percentage(total, max_total),
                is_winner: marathon.winner_group_id.as_deref() == Some(group.id.as_str()),
            }
        })
        .collect();

    standings.sort_by(|a, b| b.total.cmp(&a.total));
    standings
}

/// Påbörjade veckor sedan start, minst en
fn weeks_elapsed(marathon: &Marathon, today: NaiveDate) -> i64 {
    let Some(start) = parse_date_key(&marathon.start_date) else {
        return 1;
    };
    let days = (today - start).num_days();
    ((days + 6) / 7).max(1)
}

fn level_percentage(total: i64, max_total: i64) -> u32 {
    if max_total <= 0 || total <= 0 {
        return 0;
    }
    let percent = (total as f64 / max_total as f64 * 100.0).round();
    percent.min(100.0) as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: usize,
}

/// Antal närvarande (liturgi eller möte) per mötesdatum, äldst först
pub fn attendance_trend<S: AsRef<str>>(records: &[AttendanceRecord], weeks: &[S]) -> Vec<TrendPoint> {
    let mut dates: Vec<&str> = weeks.iter().map(|w| w.as_ref()).collect();
    dates.sort_unstable();
    dates.dedup();

    dates
        .into_iter()
        .map(|date| TrendPoint {
            date: date.to_string(),
            count: records
                .iter()
                .filter(|r| r.date == date && (r.liturgy || r.meeting))
                .count(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub present: usize,
    pub liturgy: usize,
    pub meeting: usize,
    pub early_birds: usize,
    pub bible_readers: usize,
    pub confessions: usize,
    pub visitations: usize,
    pub communions: usize,
    pub absent: usize,
}

/// Nyckeltal för ett mötesdatum. Bara ungdomarnas poster räknas.
pub fn weekly_stats(records: &[AttendanceRecord], youth: &[Youth], date: &str) -> WeeklyStats {
    let today: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| r.date == date && r.youth_id.is_some() && (r.liturgy || r.meeting))
        .collect();

    let count = |pred: fn(&AttendanceRecord) -> bool| today.iter().filter(|r| pred(r)).count();

    WeeklyStats {
        present: today.len(),
        liturgy: count(|r| r.liturgy),
        meeting: count(|r| r.meeting),
        early_birds: count(|r| {
            r.liturgy_time
                .as_deref()
                .is_some_and(|t| !t.is_empty() && t < EARLY_BIRD_CUTOFF)
        }),
        bible_readers: count(|r| r.bible_reading),
        confessions: count(|r| r.confession),
        visitations: count(|r| r.visitation),
        communions: count(|r| r.communion.unwrap_or(false)),
        absent: youth.len().saturating_sub(today.len()),
    }
}

/// Andel ungdomar, 0.0 till 1.0, som var med på minst tre av de fyra senaste mötena
pub fn retention_rate<S: AsRef<str>>(youth: &[Youth], records: &[AttendanceRecord], last4: &[S]) -> f64 {
    if youth.is_empty() {
        return 0.0;
    }
    let dates: HashSet<&str> = last4.iter().map(|d| d.as_ref()).collect();

    let regular = youth
        .iter()
        .filter(|y| {
            let attended = records
                .iter()
                .filter(|r| {
                    r.youth_id.as_deref() == Some(y.id.as_str())
                        && dates.contains(r.date.as_str())
                        && (r.liturgy || r.meeting)
                })
                .count();
            attended >= REGULAR_MIN_WEEKS
        })
        .count();

    regular as f64 / youth.len() as f64
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub records: usize,
    pub present: usize,
    pub liturgy: usize,
    pub meeting: usize,
    pub visitation: usize,
    pub bible_reading: usize,
    pub confession: usize,
    pub communion: usize,
    pub last_confession: Option<String>,
}

pub fn person_summary(person_id: &str, records: &[AttendanceRecord]) -> PersonSummary {
    let mut summary = PersonSummary::default();

    for r in records.iter().filter(|r| r.belongs_to(person_id)) {
        summary.records += 1;
        summary.present += usize::from(r.is_present());
        summary.liturgy += usize::from(r.liturgy);
        summary.meeting += usize::from(r.meeting);
        summary.visitation += usize::from(r.visitation);
        summary.bible_reading += usize::from(r.bible_reading);
        summary.confession += usize::from(r.confession);
        summary.communion += usize::from(r.communion.unwrap_or(false));

        if r.confession {
            let date = r.confession_date.clone().unwrap_or_else(|| r.date.clone());
            if summary.last_confession.as_ref().map_or(true, |last| date > *last) {
                summary.last_confession = Some(date);
            }
        }
    }

    summary
}
