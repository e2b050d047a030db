//! Automatiska tävlingspoäng från närvaro
//!
//! Rena funktioner utan lagring. Anroparen sparar resultatet.

use crate::models::{
    ActivityPointEntry, AttendanceField, AttendanceRecord, Marathon, MarathonGroup,
};

/// Är ungdomen med i någon av maratonets grupper?
pub fn is_enrolled(marathon: &Marathon, groups: &[MarathonGroup], youth_id: &str) -> bool {
    groups
        .iter()
        .filter(|g| marathon.group_ids.contains(&g.id))
        .any(|g| g.has_member(youth_id))
}

/// Uppdatera automatiska poster efter att ett närvarofält ändrats.
///
/// För varje aktivt maraton som täcker datumet och där ungdomen är med i en
/// grupp tas befintliga automatiska poster för (maraton, ungdom, vecka,
/// aktivitet) bort, och om värdet är sant läggs exakt en ny till. Manuella
/// poster rörs inte. Returnerar `true` om något ändrades.
#[allow(clippy::too_many_arguments)]
pub fn apply_attendance_toggle(
    points: &mut Vec<ActivityPointEntry>,
    marathons: &[Marathon],
    groups: &[MarathonGroup],
    youth_id: &str,
    date: &str,
    field: AttendanceField,
    value: bool,
    timestamp: i64,
) -> bool {
    let Some(activity) = field.activity() else {
        return false;
    };

    let mut changed = false;
    for marathon in marathons
        .iter()
        .filter(|m| m.active && m.covers(date) && is_enrolled(m, groups, youth_id))
    {
        let before = points.len();
        points.retain(|p| !p.is_auto_for(&marathon.id, youth_id, date, activity));
        changed |= points.len() != before;

        if value {
            points.push(ActivityPointEntry {
                marathon_id: marathon.id.clone(),
                youth_id: youth_id.to_string(),
                week_date: date.to_string(),
                activity,
                points: marathon.point_system.points(activity),
                reason: activity.auto_reason().to_string(),
                timestamp,
                manual: false,
            });
            changed = true;
        }
    }

    changed
}

/// Härled om alla automatiska poster för ett maraton från närvaron.
///
/// Manuella poster och andra maratons poster behålls oförändrade.
pub fn recompute_marathon_points(
    points: &[ActivityPointEntry],
    marathon: &Marathon,
    groups: &[MarathonGroup],
    attendance: &[AttendanceRecord],
    timestamp: i64,
) -> Vec<ActivityPointEntry> {
    let mut result: Vec<ActivityPointEntry> = points
        .iter()
        .filter(|p| p.manual || p.marathon_id != marathon.id)
        .cloned()
        .collect();

    for record in attendance.iter().filter(|r| marathon.covers(&r.date)) {
        let Some(youth_id) = record.youth_id.as_deref() else {
            continue;
        };
        if !is_enrolled(marathon, groups, youth_id) {
            continue;
        }

        for field in AttendanceField::ALL {
            let Some(activity) = field.activity() else {
                continue;
            };
            if record.get(*field) {
                result.push(ActivityPointEntry {
                    marathon_id: marathon.id.clone(),
                    youth_id: youth_id.to_string(),
                    week_date: record.date.clone(),
                    activity,
                    points: marathon.point_system.points(activity),
                    reason: activity.auto_reason().to_string(),
                    timestamp,
                    manual: false,
                });
            }
        }
    }

    result
}
