//! Registret: alla ändringar av ungdomar, tjänare, närvaro och maraton
//!
//! Varje ändring skrivs först lokalt, markeras som osynkad, pushas och
//! meddelas sedan med `StoreChanged`. Resultatet av pushen returneras men en
//! misslyckad push är aldrig ett fel, ändringen finns kvar lokalt.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::events::StoreEvent;
use super::points::{apply_attendance_toggle, recompute_marathon_points};
use super::stats::leaderboard;
use super::store::{keys, LocalStore, StoreBatch};
use super::sync::SyncEngine;
use crate::models::{
    generate_lookup_code, is_valid_code, Activity, ActivityPointEntry, AttendanceField, AttendanceRecord,
    Marathon, MarathonGroup, NewGroup, NewMarathon, NewServant, NewYouth, PersonRef, PersonValidationError,
    Servant, SystemConfig, Youth,
};
use crate::utils::date::parse_date_key;
use crate::utils::{AppError, AppResult};

/// Sparat objekt och om pushen lyckades
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub item: T,
    pub pushed: bool,
}

#[derive(Clone)]
pub struct Registry {
    engine: SyncEngine,
}

impl Registry {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn store(&self) -> &LocalStore {
        self.engine.store()
    }

    /// Markera, pusha och meddela. Anropas efter varje lokal skrivning.
    async fn publish(&self) -> AppResult<bool> {
        self.engine.dirty().mark_dirty()?;
        let pushed = self.engine.push().await;
        self.engine.events().emit(StoreEvent::StoreChanged);
        Ok(pushed)
    }

    // --- Ungdomar ---

    pub async fn add_youth(&self, new: NewYouth) -> AppResult<Saved<Youth>> {
        new.validate().map_err(|e| AppError::validation(e.to_string()))?;

        let mut youth = self.store().get_youth();
        let code = self.next_code(&youth, &self.store().get_servants())?;
        let item = new.into_youth(Uuid::new_v4().to_string(), code, now_millis());

        youth.push(item.clone());
        self.store().save_youth(&youth)?;
        tracing::info!("Lade till ungdom {} med kod {}", item.name, item.code);

        let pushed = self.publish().await?;
        Ok(Saved { item, pushed })
    }

    pub async fn update_youth(&self, updated: Youth) -> AppResult<bool> {
        validate_name(&updated.name)?;
        self.check_code(&updated.code, &updated.id)?;

        let mut youth = self.store().get_youth();
        let slot = youth
            .iter_mut()
            .find(|y| y.id == updated.id)
            .ok_or_else(|| AppError::not_found(format!("Ungdom {}", updated.id)))?;
        *slot = updated;
        self.store().save_youth(&youth)?;

        self.publish().await
    }

    /// Ta bort en ungdom med närvaro, gruppmedlemskap och poäng
    pub async fn delete_youth(&self, id: &str) -> AppResult<bool> {
        let mut youth = self.store().get_youth();
        let before = youth.len();
        youth.retain(|y| y.id != id);
        if youth.len() == before {
            return Err(AppError::not_found(format!("Ungdom {}", id)));
        }

        let mut attendance = self.store().get_attendance();
        attendance.retain(|r| r.youth_id.as_deref() != Some(id));

        let mut groups = self.store().get_marathon_groups();
        for group in &mut groups {
            group.youth_ids.retain(|y| y != id);
        }

        let mut points = self.store().get_marathon_points();
        points.retain(|p| p.youth_id != id);

        let mut batch = StoreBatch::new();
        batch
            .put(keys::YOUTH, &youth)?
            .put(keys::ATTENDANCE, &attendance)?
            .put(keys::MARATHON_GROUPS, &groups)?
            .put(keys::MARATHON_POINTS, &points)?;
        self.store().commit(&batch)?;
        tracing::info!("Tog bort ungdom {}", id);

        self.publish().await
    }

    /// Töm alla ungdomar. All närvaro, alla gruppmedlemskap och poäng följer med.
    pub async fn wipe_all_youth(&self) -> AppResult<bool> {
        let mut groups = self.store().get_marathon_groups();
        for group in &mut groups {
            group.youth_ids.clear();
        }

        let mut batch = StoreBatch::new();
        batch
            .put(keys::YOUTH, &Vec::<Youth>::new())?
            .put(keys::ATTENDANCE, &Vec::<AttendanceRecord>::new())?
            .put(keys::MARATHON_GROUPS, &groups)?
            .put(keys::MARATHON_POINTS, &Vec::<ActivityPointEntry>::new())?;
        self.store().commit(&batch)?;
        tracing::warn!("Alla ungdomar raderade");

        self.publish().await
    }

    // --- Tjänare ---

    pub async fn add_servant(&self, new: NewServant) -> AppResult<Saved<Servant>> {
        new.validate().map_err(|e| AppError::validation(e.to_string()))?;

        let mut servants = self.store().get_servants();
        let code = self.next_code(&self.store().get_youth(), &servants)?;
        let item = new.into_servant(Uuid::new_v4().to_string(), code, now_millis());

        servants.push(item.clone());
        self.store().save_servants(&servants)?;
        tracing::info!("Lade till tjänare {} med kod {}", item.name, item.code);

        let pushed = self.publish().await?;
        Ok(Saved { item, pushed })
    }

    pub async fn update_servant(&self, updated: Servant) -> AppResult<bool> {
        validate_name(&updated.name)?;
        self.check_code(&updated.code, &updated.id)?;

        let mut servants = self.store().get_servants();
        let slot = servants
            .iter_mut()
            .find(|s| s.id == updated.id)
            .ok_or_else(|| AppError::not_found(format!("Tjänare {}", updated.id)))?;
        *slot = updated;
        self.store().save_servants(&servants)?;

        self.publish().await
    }

    pub async fn delete_servant(&self, id: &str) -> AppResult<bool> {
        let mut servants = self.store().get_servants();
        let before = servants.len();
        servants.retain(|s| s.id != id);
        if servants.len() == before {
            return Err(AppError::not_found(format!("Tjänare {}", id)));
        }

        let mut attendance = self.store().get_attendance();
        attendance.retain(|r| r.servant_id.as_deref() != Some(id));

        let mut batch = StoreBatch::new();
        batch
            .put(keys::SERVANTS, &servants)?
            .put(keys::ATTENDANCE, &attendance)?;
        self.store().commit(&batch)?;
        tracing::info!("Tog bort tjänare {}", id);

        self.publish().await
    }

    // --- Närvaro ---

    /// Sätt ett fält för (person, datum). Posten skapas om den saknas.
    pub async fn set_attendance_field(
        &self,
        person: &PersonRef,
        date: &str,
        field: AttendanceField,
        value: bool,
    ) -> AppResult<bool> {
        validate_date(date)?;

        let mut attendance = self.store().get_attendance();
        let index = match attendance.iter().position(|r| r.is_for(person) && r.date == date) {
            Some(index) => index,
            None => {
                attendance.push(AttendanceRecord::new(person, date));
                attendance.len() - 1
            }
        };
        attendance[index].set(field, value);

        let mut batch = StoreBatch::new();
        batch.put(keys::ATTENDANCE, &attendance)?;

        if let PersonRef::Youth(youth_id) = person {
            let mut points = self.store().get_marathon_points();
            let changed = apply_attendance_toggle(
                &mut points,
                &self.store().get_marathons(),
                &self.store().get_marathon_groups(),
                youth_id,
                date,
                field,
                value,
                now_millis(),
            );
            if changed {
                batch.put(keys::MARATHON_POINTS, &points)?;
            }
        }

        self.store().commit(&batch)?;
        tracing::debug!("Närvaro {} {} {:?} = {}", person.id(), date, field, value);

        self.publish().await
    }

    /// Spara en hel post. En befintlig post för samma (person, datum) ersätts.
    pub async fn save_attendance_record(&self, record: AttendanceRecord) -> AppResult<bool> {
        validate_date(&record.date)?;
        let person = match (&record.youth_id, &record.servant_id) {
            (Some(id), _) => PersonRef::Youth(id.clone()),
            (None, Some(id)) => PersonRef::Servant(id.clone()),
            (None, None) => return Err(AppError::validation("Närvaroposten saknar person")),
        };

        let mut record = record;
        record.id = AttendanceRecord::record_id(person.id(), &record.date);

        let mut attendance = self.store().get_attendance();
        attendance.retain(|r| !(r.is_for(&person) && r.date == record.date));
        attendance.push(record.clone());

        let mut batch = StoreBatch::new();
        batch.put(keys::ATTENDANCE, &attendance)?;

        if let PersonRef::Youth(youth_id) = &person {
            let mut points = self.store().get_marathon_points();
            let marathons = self.store().get_marathons();
            let groups = self.store().get_marathon_groups();
            let timestamp = now_millis();
            let mut changed = false;
            for field in AttendanceField::ALL {
                changed |= apply_attendance_toggle(
                    &mut points,
                    &marathons,
                    &groups,
                    youth_id,
                    &record.date,
                    *field,
                    record.get(*field),
                    timestamp,
                );
            }
            if changed {
                batch.put(keys::MARATHON_POINTS, &points)?;
            }
        }

        self.store().commit(&batch)?;
        self.publish().await
    }

    pub async fn delete_attendance_record(&self, record_id: &str) -> AppResult<bool> {
        let mut attendance = self.store().get_attendance();
        let Some(index) = attendance.iter().position(|r| r.id == record_id) else {
            return Err(AppError::not_found(format!("Närvaropost {}", record_id)));
        };
        let removed = attendance.remove(index);

        let mut points = self.store().get_marathon_points();
        points.retain(|p| {
            p.manual || p.week_date != removed.date || removed.youth_id.as_deref() != Some(p.youth_id.as_str())
        });

        let mut batch = StoreBatch::new();
        batch
            .put(keys::ATTENDANCE, &attendance)?
            .put(keys::MARATHON_POINTS, &points)?;
        self.store().commit(&batch)?;

        self.publish().await
    }

    /// Ta bort all närvaro för ett mötesdatum
    pub async fn clear_attendance_by_date(&self, date: &str) -> AppResult<bool> {
        let mut attendance = self.store().get_attendance();
        attendance.retain(|r| r.date != date);

        let mut points = self.store().get_marathon_points();
        points.retain(|p| p.manual || p.week_date != date);

        let mut batch = StoreBatch::new();
        batch
            .put(keys::ATTENDANCE, &attendance)?
            .put(keys::MARATHON_POINTS, &points)?;
        self.store().commit(&batch)?;
        tracing::info!("Rensade närvaro för {}", date);

        self.publish().await
    }

    /// Töm all närvaro. Manuella poäng behålls.
    pub async fn wipe_all_attendance(&self) -> AppResult<bool> {
        let mut points = self.store().get_marathon_points();
        points.retain(|p| p.manual);

        let mut batch = StoreBatch::new();
        batch
            .put(keys::ATTENDANCE, &Vec::<AttendanceRecord>::new())?
            .put(keys::MARATHON_POINTS, &points)?;
        self.store().commit(&batch)?;
        tracing::warn!("All närvaro raderad");

        self.publish().await
    }

    // --- Maraton ---

    pub async fn add_marathon(&self, new: NewMarathon) -> AppResult<Saved<Marathon>> {
        let item = new.into_marathon(Uuid::new_v4().to_string());
        item.validate().map_err(|e| AppError::validation(e.to_string()))?;

        let mut marathons = self.store().get_marathons();
        marathons.push(item.clone());
        self.store().save_marathons(&marathons)?;
        tracing::info!("Skapade maraton {} ({} - {})", item.name, item.start_date, item.end_date);

        let pushed = self.publish().await?;
        Ok(Saved { item, pushed })
    }

    pub async fn update_marathon(&self, updated: Marathon) -> AppResult<bool> {
        updated.validate().map_err(|e| AppError::validation(e.to_string()))?;

        let mut marathons = self.store().get_marathons();
        let slot = marathons
            .iter_mut()
            .find(|m| m.id == updated.id)
            .ok_or_else(|| AppError::not_found(format!("Maraton {}", updated.id)))?;
        *slot = updated;
        self.store().save_marathons(&marathons)?;

        self.publish().await
    }

    /// Ta bort ett maraton med dess grupper och poäng
    pub async fn delete_marathon(&self, id: &str) -> AppResult<bool> {
        let mut marathons = self.store().get_marathons();
        let Some(index) = marathons.iter().position(|m| m.id == id) else {
            return Err(AppError::not_found(format!("Maraton {}", id)));
        };
        let removed = marathons.remove(index);

        let mut groups = self.store().get_marathon_groups();
        groups.retain(|g| !removed.group_ids.contains(&g.id));

        let mut points = self.store().get_marathon_points();
        points.retain(|p| p.marathon_id != id);

        let mut batch = StoreBatch::new();
        batch
            .put(keys::MARATHONS, &marathons)?
            .put(keys::MARATHON_GROUPS, &groups)?
            .put(keys::MARATHON_POINTS, &points)?;
        self.store().commit(&batch)?;
        tracing::info!("Tog bort maraton {}", removed.name);

        self.publish().await
    }

    pub async fn add_group(&self, marathon_id: &str, new: NewGroup) -> AppResult<Saved<MarathonGroup>> {
        let mut marathons = self.store().get_marathons();
        let marathon = marathons
            .iter_mut()
            .find(|m| m.id == marathon_id)
            .ok_or_else(|| AppError::not_found(format!("Maraton {}", marathon_id)))?;

        let item = new.into_group(Uuid::new_v4().to_string());
        marathon.group_ids.push(item.id.clone());

        let mut groups = self.store().get_marathon_groups();
        groups.push(item.clone());

        let mut batch = StoreBatch::new();
        batch
            .put(keys::MARATHONS, &marathons)?
            .put(keys::MARATHON_GROUPS, &groups)?;
        self.store().commit(&batch)?;

        let pushed = self.publish().await?;
        Ok(Saved { item, pushed })
    }

    pub async fn update_group(&self, updated: MarathonGroup) -> AppResult<bool> {
        let mut groups = self.store().get_marathon_groups();
        let slot = groups
            .iter_mut()
            .find(|g| g.id == updated.id)
            .ok_or_else(|| AppError::not_found(format!("Grupp {}", updated.id)))?;
        *slot = updated;
        self.store().save_marathon_groups(&groups)?;

        self.publish().await
    }

    pub async fn delete_group(&self, id: &str) -> AppResult<bool> {
        let mut groups = self.store().get_marathon_groups();
        let before = groups.len();
        groups.retain(|g| g.id != id);
        if groups.len() == before {
            return Err(AppError::not_found(format!("Grupp {}", id)));
        }

        let mut marathons = self.store().get_marathons();
        for marathon in &mut marathons {
            marathon.group_ids.retain(|g| g != id);
        }

        let mut batch = StoreBatch::new();
        batch
            .put(keys::MARATHON_GROUPS, &groups)?
            .put(keys::MARATHONS, &marathons)?;
        self.store().commit(&batch)?;

        self.publish().await
    }

    /// Manuella poäng berörs aldrig av närvarosynken
    pub async fn add_manual_points(
        &self,
        marathon_id: &str,
        youth_id: &str,
        week_date: &str,
        activity: Activity,
        points: i64,
        reason: &str,
    ) -> AppResult<bool> {
        validate_date(week_date)?;
        if !self.store().get_marathons().iter().any(|m| m.id == marathon_id) {
            return Err(AppError::not_found(format!("Maraton {}", marathon_id)));
        }

        let mut entries = self.store().get_marathon_points();
        entries.push(ActivityPointEntry {
            marathon_id: marathon_id.to_string(),
            youth_id: youth_id.to_string(),
            week_date: week_date.to_string(),
            activity,
            points,
            reason: reason.to_string(),
            timestamp: now_millis(),
            manual: true,
        });
        self.store().save_marathon_points(&entries)?;

        self.publish().await
    }

    /// Bygg om maratonets automatiska poäng från all närvaro
    pub async fn recompute_marathon_points(&self, marathon_id: &str) -> AppResult<bool> {
        let marathon = self.find_marathon(marathon_id)?;
        let points = recompute_marathon_points(
            &self.store().get_marathon_points(),
            &marathon,
            &self.store().get_marathon_groups(),
            &self.store().get_attendance(),
            now_millis(),
        );
        self.store().save_marathon_points(&points)?;
        tracing::info!("Räknade om poäng för {}", marathon.name);

        self.publish().await
    }

    /// Avsluta maratonet. Gruppen med högst poäng vinner.
    pub async fn end_marathon(&self, marathon_id: &str, today: NaiveDate) -> AppResult<Saved<Marathon>> {
        let mut marathons = self.store().get_marathons();
        let marathon = marathons
            .iter_mut()
            .find(|m| m.id == marathon_id)
            .ok_or_else(|| AppError::not_found(format!("Maraton {}", marathon_id)))?;

        let standings = leaderboard(
            marathon,
            &self.store().get_marathon_groups(),
            &self.store().get_marathon_points(),
            today,
        );
        marathon.active = false;
        marathon.winner_group_id = standings.first().map(|s| s.group_id.clone());
        let item = marathon.clone();
        self.store().save_marathons(&marathons)?;
        tracing::info!("Maraton {} avslutat, vinnare {:?}", item.name, item.winner_group_id);

        let pushed = self.publish().await?;
        Ok(Saved { item, pushed })
    }

    // --- Konfiguration ---

    pub async fn save_config(&self, config: SystemConfig) -> AppResult<bool> {
        config.validate().map_err(|e| AppError::validation(e.to_string()))?;
        self.store().save_config(&config)?;
        self.publish().await
    }

    fn find_marathon(&self, id: &str) -> AppResult<Marathon> {
        self.store()
            .get_marathons()
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::not_found(format!("Maraton {}", id)))
    }

    fn next_code(&self, youth: &[Youth], servants: &[Servant]) -> AppResult<String> {
        let existing: HashSet<&str> = youth
            .iter()
            .map(|y| y.code.as_str())
            .chain(servants.iter().map(|s| s.code.as_str()))
            .collect();
        generate_lookup_code(&existing, &mut rand::thread_rng())
            .ok_or_else(|| AppError::other("Inga lediga koder kvar"))
    }

    /// Koden måste vara giltig och inte användas av någon annan
    fn check_code(&self, code: &str, own_id: &str) -> AppResult<()> {
        if !is_valid_code(code) {
            return Err(AppError::validation(
                PersonValidationError::InvalidCode(code.to_string()).to_string(),
            ));
        }
        let youth = self.store().get_youth();
        let servants = self.store().get_servants();
        let taken = youth
            .iter()
            .filter(|y| y.id != own_id)
            .any(|y| y.code == code)
            || servants.iter().filter(|s| s.id != own_id).any(|s| s.code == code);
        if taken {
            return Err(AppError::validation(
                PersonValidationError::DuplicateCode(code.to_string()).to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Namn krävs"));
    }
    Ok(())
}

fn validate_date(date: &str) -> AppResult<()> {
    parse_date_key(date)
        .map(|_| ())
        .ok_or_else(|| AppError::validation(format!("Ogiltigt datum: {}", date)))
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::PointTable;
    use crate::services::dirty::DirtyTracker;
    use crate::services::events::{drain, EventBus};
    use crate::services::remote::InMemoryRemoteStore;
    use crate::services::stats::group_total;
    use std::sync::Arc;

    fn setup() -> (Registry, Arc<InMemoryRemoteStore>) {
        let db = Database::open_in_memory().unwrap();
        let remote = Arc::new(InMemoryRemoteStore::new());
        let engine = SyncEngine::new(
            LocalStore::new(db.clone()),
            DirtyTracker::new(db),
            remote.clone(),
            EventBus::new(),
        );
        (Registry::new(engine), remote)
    }

    async fn add_youth(registry: &Registry, name: &str) -> Youth {
        registry
            .add_youth(NewYouth {
                name: name.into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .item
    }

    async fn marathon_with_group(registry: &Registry, table: PointTable, members: Vec<String>) -> (Marathon, MarathonGroup) {
        let marathon = registry
            .add_marathon(NewMarathon {
                name: "Fastemaraton".into(),
                start_date: "2026-03-01".into(),
                end_date: "2026-04-30".into(),
                point_system: table,
            })
            .await
            .unwrap()
            .item;
        let group = registry
            .add_group(
                &marathon.id,
                NewGroup {
                    name: "Lag Mikael".into(),
                    servant_name: "Mina".into(),
                    youth_ids: members,
                },
            )
            .await
            .unwrap()
            .item;
        (marathon, group)
    }

    #[tokio::test]
    async fn test_add_youth_pushes_and_emits() {
        let (registry, remote) = setup();
        let mut rx = registry.engine().events().subscribe();

        let saved = registry
            .add_youth(NewYouth {
                name: "Kirollos".into(),
                grade: "Årskurs 2".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(saved.pushed);
        assert!(is_valid_code(&saved.item.code));
        assert_eq!(registry.store().get_youth(), vec![saved.item.clone()]);
        assert!(!registry.engine().is_dirty());
        assert_eq!(remote.document()["youth"][0]["name"], "Kirollos");
        assert_eq!(
            drain(&mut rx),
            vec![StoreEvent::SyncStarted, StoreEvent::SyncEnded, StoreEvent::StoreChanged]
        );
    }

    #[tokio::test]
    async fn test_offline_write_stays_local_and_dirty() {
        let (registry, remote) = setup();
        remote.set_offline(true);

        let saved = registry
            .add_servant(NewServant {
                name: "Abanoub".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!saved.pushed);
        assert_eq!(registry.store().get_servants().len(), 1);
        assert!(registry.engine().is_dirty());
    }

    #[tokio::test]
    async fn test_validation_writes_nothing() {
        let (registry, remote) = setup();

        let err = registry.add_youth(NewYouth::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = registry
            .set_attendance_field(&PersonRef::Youth("p1".into()), "6 mars", AttendanceField::Liturgy, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut config = SystemConfig::default();
        config.admin_password.clear();
        assert!(registry.save_config(config).await.is_err());

        assert!(registry.store().get_youth().is_empty());
        assert!(registry.store().get_attendance().is_empty());
        assert!(!registry.engine().is_dirty());
        assert_eq!(remote.push_count(), 0);
    }

    #[tokio::test]
    async fn test_update_youth_rejects_taken_code() {
        let (registry, _remote) = setup();
        let mut a = add_youth(&registry, "Mark").await;
        let mut b = add_youth(&registry, "Mina").await;

        // Fasta koder så att inget beror på slumpen
        a.code = "11111".into();
        b.code = "22222".into();
        registry.store().save_youth(&[a.clone(), b.clone()]).unwrap();

        b.code = "11111".into();
        let err = registry.update_youth(b.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "Valideringsfel: Koden 11111 används redan");

        b.code = "123".into();
        let err = registry.update_youth(b.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "Valideringsfel: Ogiltig kod: 123");

        // Den egna koden får behållas
        b.code = "22222".into();
        registry.update_youth(b.clone()).await.unwrap();

        b.code = "12345".into();
        registry.update_youth(b.clone()).await.unwrap();
        assert!(registry.store().get_youth().iter().any(|y| y.id == b.id && y.code == "12345"));

        let mut ghost = b.clone();
        ghost.id = "saknas".into();
        ghost.code = "99999".into();
        assert!(matches!(
            registry.update_youth(ghost).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_codes_are_shared_between_youth_and_servants() {
        let (registry, _remote) = setup();
        let mut youth = add_youth(&registry, "Mark").await;
        youth.code = "11111".into();
        registry.store().save_youth(&[youth]).unwrap();

        let mut servant = registry
            .add_servant(NewServant {
                name: "Abanoub".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .item;
        assert_ne!(servant.code, "11111");

        servant.code = "11111".into();
        let err = registry.update_servant(servant).await.unwrap_err();
        assert_eq!(err.to_string(), "Valideringsfel: Koden 11111 används redan");
    }

    #[tokio::test]
    async fn test_attendance_is_unique_per_person_and_date() {
        let (registry, _remote) = setup();
        let person = PersonRef::Youth("p1".into());

        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Liturgy, true)
            .await
            .unwrap();
        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Meeting, true)
            .await
            .unwrap();
        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Liturgy, true)
            .await
            .unwrap();

        let attendance = registry.store().get_attendance();
        assert_eq!(attendance.len(), 1);
        assert!(attendance[0].liturgy && attendance[0].meeting);

        let mut replacement = AttendanceRecord::new(&person, "2026-03-06");
        replacement.confession = true;
        replacement.id = "annat-id".into();
        registry.save_attendance_record(replacement).await.unwrap();

        let attendance = registry.store().get_attendance();
        assert_eq!(attendance.len(), 1);
        assert_eq!(attendance[0].id, "p1-2026-03-06");
        assert!(!attendance[0].liturgy);
        assert!(attendance[0].confession);
    }

    #[tokio::test]
    async fn test_delete_youth_cascades() {
        let (registry, remote) = setup();
        let youth = registry
            .add_youth(NewYouth {
                name: "Kirollos".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .item;
        let mut with_code = youth.clone();
        with_code.code = "12345".into();
        registry.update_youth(with_code).await.unwrap();

        let (_marathon, group) = marathon_with_group(&registry, PointTable::default(), vec![youth.id.clone()]).await;
        let person = PersonRef::Youth(youth.id.clone());
        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Liturgy, true)
            .await
            .unwrap();
        assert_eq!(registry.store().get_marathon_points().len(), 1);
        assert_eq!(registry.store().get_youth()[0].code, "12345");

        registry.delete_youth(&youth.id).await.unwrap();

        assert!(registry.store().get_youth().is_empty());
        assert!(registry.store().get_attendance().is_empty());
        assert!(registry.store().get_marathon_points().is_empty());
        let groups = registry.store().get_marathon_groups();
        assert_eq!(groups[0].id, group.id);
        assert!(groups[0].youth_ids.is_empty());
        assert_eq!(remote.document()["attendance"], serde_json::json!([]));

        assert!(matches!(
            registry.delete_youth(&youth.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_drives_group_total() {
        let (registry, _remote) = setup();
        let youth = add_youth(&registry, "Mark").await;
        let table = PointTable {
            liturgy: 50,
            ..PointTable::default()
        };
        let (marathon, _) = marathon_with_group(&registry, table, vec![youth.id.clone()]).await;
        let person = PersonRef::Youth(youth.id.clone());

        for value in [true, false, true] {
            registry
                .set_attendance_field(&person, "2026-03-06", AttendanceField::Liturgy, value)
                .await
                .unwrap();
        }

        let group = registry.store().get_marathon_groups().remove(0);
        let points = registry.store().get_marathon_points();
        assert_eq!(points.len(), 1);
        assert_eq!(group_total(&marathon, &group, &points), 50);
    }

    #[tokio::test]
    async fn test_manual_points_survive_recompute_and_toggle() {
        let (registry, _remote) = setup();
        let youth = add_youth(&registry, "Mark").await;
        let (marathon, _) = marathon_with_group(&registry, PointTable::default(), vec![youth.id.clone()]).await;
        let person = PersonRef::Youth(youth.id.clone());

        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Meeting, true)
            .await
            .unwrap();
        registry
            .add_manual_points(&marathon.id, &youth.id, "2026-03-06", Activity::Meeting, 5, "Hjälpte till")
            .await
            .unwrap();
        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Meeting, false)
            .await
            .unwrap();

        let points = registry.store().get_marathon_points();
        assert_eq!(points.len(), 1);
        assert!(points[0].manual);

        registry
            .set_attendance_field(&person, "2026-03-06", AttendanceField::Meeting, true)
            .await
            .unwrap();
        registry.recompute_marathon_points(&marathon.id).await.unwrap();

        let points = registry.store().get_marathon_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points.iter().filter(|p| p.manual).count(), 1);
    }

    #[tokio::test]
    async fn test_end_marathon_picks_leader() {
        let (registry, _remote) = setup();
        let a = add_youth(&registry, "Mark").await;
        let b = add_youth(&registry, "Mina").await;
        let (marathon, _) = marathon_with_group(&registry, PointTable::default(), vec![a.id.clone()]).await;
        let leader = registry
            .add_group(
                &marathon.id,
                NewGroup {
                    name: "Lag Gabriel".into(),
                    servant_name: String::new(),
                    youth_ids: vec![b.id.clone()],
                },
            )
            .await
            .unwrap()
            .item;

        registry
            .set_attendance_field(&PersonRef::Youth(b.id.clone()), "2026-03-06", AttendanceField::Confession, true)
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let ended = registry.end_marathon(&marathon.id, today).await.unwrap().item;

        assert!(!ended.active);
        assert_eq!(ended.winner_group_id, Some(leader.id));
    }

    #[tokio::test]
    async fn test_delete_marathon_drops_groups_and_points() {
        let (registry, _remote) = setup();
        let youth = add_youth(&registry, "Mark").await;
        let (marathon, _) = marathon_with_group(&registry, PointTable::default(), vec![youth.id.clone()]).await;
        registry
            .set_attendance_field(&PersonRef::Youth(youth.id.clone()), "2026-03-06", AttendanceField::Liturgy, true)
            .await
            .unwrap();

        registry.delete_marathon(&marathon.id).await.unwrap();

        assert!(registry.store().get_marathons().is_empty());
        assert!(registry.store().get_marathon_groups().is_empty());
        assert!(registry.store().get_marathon_points().is_empty());
        assert_eq!(registry.store().get_attendance().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_by_date_and_wipes() {
        let (registry, _remote) = setup();
        let youth = add_youth(&registry, "Mark").await;
        let person = PersonRef::Youth(youth.id.clone());
        for date in ["2026-03-06", "2026-03-13"] {
            registry
                .set_attendance_field(&person, date, AttendanceField::Meeting, true)
                .await
                .unwrap();
        }
        let servant = registry
            .add_servant(NewServant {
                name: "Abanoub".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .item;
        registry
            .set_attendance_field(&PersonRef::Servant(servant.id.clone()), "2026-03-13", AttendanceField::Meeting, true)
            .await
            .unwrap();

        registry.clear_attendance_by_date("2026-03-06").await.unwrap();
        assert_eq!(registry.store().get_attendance().len(), 2);

        registry.delete_servant(&servant.id).await.unwrap();
        assert_eq!(registry.store().get_attendance().len(), 1);

        registry.wipe_all_youth().await.unwrap();
        assert!(registry.store().get_youth().is_empty());
        assert!(registry.store().get_attendance().is_empty());
    }
}
