//! Lokal postlagring
//!
//! Varje samling lagras som en JSON-sekvens under en egen nyckel och skrivs
//! alltid om i sin helhet. Läsningar misslyckas aldrig högljutt: saknade eller
//! trasiga värden blir en tom samling.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::Database;
use crate::models::{
    ActivityPointEntry, AttendanceRecord, Lang, Marathon, MarathonGroup, RemoteDocument, Servant,
    SystemConfig, Theme, Youth,
};
use crate::utils::{AppError, AppResult};

/// Lagringsnycklar
pub mod keys {
    pub const YOUTH: &str = "youth";
    pub const ATTENDANCE: &str = "attendance";
    pub const SERVANTS: &str = "servants";
    pub const MARATHONS: &str = "marathons";
    pub const MARATHON_GROUPS: &str = "marathon_groups";
    pub const MARATHON_POINTS: &str = "marathon_points";
    pub const CONFIG: &str = "config";
    pub const DIRTY: &str = "dirty";
    pub const LAST_SYNC: &str = "last_sync";
    pub const SESSION: &str = "session";
    pub const THEME: &str = "theme";
    pub const LANG: &str = "lang";
}

/// Flera nycklar som skrivs i samma transaktion
#[derive(Debug, Default)]
pub struct StoreBatch {
    entries: Vec<(&'static str, String)>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> AppResult<&mut Self> {
        self.entries.push((key, serde_json::to_string(value)?));
        Ok(self)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(key, _)| *key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.db.kv().get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Kunde inte läsa {}: {}", key, e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Trasig samling {} ersätts med tom: {}", key, e);
            Vec::new()
        })
    }

    fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.db.kv().set(key, &json)?;
        tracing::debug!("Sparade {} ({} byte)", key, json.len());
        Ok(())
    }

    pub fn get_youth(&self) -> Vec<Youth> {
        self.read_collection(keys::YOUTH)
    }

    pub fn save_youth(&self, youth: &[Youth]) -> AppResult<()> {
        self.write_value(keys::YOUTH, youth)
    }

    pub fn get_attendance(&self) -> Vec<AttendanceRecord> {
        self.read_collection(keys::ATTENDANCE)
    }

    pub fn save_attendance(&self, records: &[AttendanceRecord]) -> AppResult<()> {
        self.write_value(keys::ATTENDANCE, records)
    }

    pub fn get_servants(&self) -> Vec<Servant> {
        self.read_collection(keys::SERVANTS)
    }

    pub fn save_servants(&self, servants: &[Servant]) -> AppResult<()> {
        self.write_value(keys::SERVANTS, servants)
    }

    pub fn get_marathons(&self) -> Vec<Marathon> {
        self.read_collection(keys::MARATHONS)
    }

    pub fn save_marathons(&self, marathons: &[Marathon]) -> AppResult<()> {
        self.write_value(keys::MARATHONS, marathons)
    }

    pub fn get_marathon_groups(&self) -> Vec<MarathonGroup> {
        self.read_collection(keys::MARATHON_GROUPS)
    }

    pub fn save_marathon_groups(&self, groups: &[MarathonGroup]) -> AppResult<()> {
        self.write_value(keys::MARATHON_GROUPS, groups)
    }

    pub fn get_marathon_points(&self) -> Vec<ActivityPointEntry> {
        self.read_collection(keys::MARATHON_POINTS)
    }

    pub fn save_marathon_points(&self, points: &[ActivityPointEntry]) -> AppResult<()> {
        self.write_value(keys::MARATHON_POINTS, points)
    }

    /// Hämta konfigurationen, eller standardkonfigurationen om den saknas
    pub fn get_config(&self) -> SystemConfig {
        match self.db.kv().get(keys::CONFIG) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Trasig konfiguration, använder standard: {}", e);
                SystemConfig::default()
            }),
            Ok(None) => SystemConfig::default(),
            Err(e) => {
                tracing::warn!("Kunde inte läsa konfiguration: {}", e);
                SystemConfig::default()
            }
        }
    }

    pub fn save_config(&self, config: &SystemConfig) -> AppResult<()> {
        self.write_value(keys::CONFIG, config)
    }

    /// Skriv flera samlingar atomiskt
    pub fn commit(&self, batch: &StoreBatch) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let entries: Vec<(&str, String)> = batch
            .entries
            .iter()
            .map(|(key, value)| (*key, value.clone()))
            .collect();
        self.db.kv().set_many(&entries)?;
        tracing::debug!("Sparade {:?} i en transaktion", batch.keys());
        Ok(())
    }

    /// Bygg det sammansatta dokumentet av nuvarande lokala tillstånd
    pub fn snapshot(&self, updated_at: String) -> RemoteDocument {
        RemoteDocument {
            youth: self.get_youth(),
            attendance: self.get_attendance(),
            servants: self.get_servants(),
            marathons: self.get_marathons(),
            marathon_groups: self.get_marathon_groups(),
            marathon_points: self.get_marathon_points(),
            config: self.get_config(),
            updated_at,
        }
    }

    /// Skriv över varje igenkänd samling som finns och har rätt typ i
    /// fjärrdokumentet. Övriga lämnas orörda. Returnerar de nycklar som skrevs.
    pub fn apply_remote(&self, doc: &Map<String, Value>) -> AppResult<Vec<&'static str>> {
        let mut batch = StoreBatch::new();

        take_array::<Youth>(doc, "youth", keys::YOUTH, &mut batch)?;
        take_array::<AttendanceRecord>(doc, "attendance", keys::ATTENDANCE, &mut batch)?;
        take_array::<Servant>(doc, "servants", keys::SERVANTS, &mut batch)?;
        take_array::<Marathon>(doc, "marathons", keys::MARATHONS, &mut batch)?;
        take_array::<MarathonGroup>(doc, "marathonGroups", keys::MARATHON_GROUPS, &mut batch)?;
        take_array::<ActivityPointEntry>(doc, "marathonPoints", keys::MARATHON_POINTS, &mut batch)?;

        if let Some(value @ Value::Object(_)) = doc.get("config") {
            match serde_json::from_value::<SystemConfig>(value.clone()) {
                Ok(config) => {
                    batch.put(keys::CONFIG, &config)?;
                }
                Err(e) => tracing::warn!("Ignorerar ogiltig config från servern: {}", e),
            }
        }

        self.commit(&batch)?;
        Ok(batch.keys())
    }

    pub fn get_flag(&self, key: &str) -> bool {
        matches!(self.db.kv().get(key), Ok(Some(v)) if v == "true")
    }

    /// `false` tar bort nyckeln
    pub fn set_flag(&self, key: &str, value: bool) -> AppResult<()> {
        if value {
            self.db.kv().set(key, "true")?;
        } else {
            self.db.kv().remove(key)?;
        }
        Ok(())
    }

    pub fn last_sync(&self) -> Option<String> {
        self.db.kv().get(keys::LAST_SYNC).ok().flatten()
    }

    pub fn set_last_sync(&self, display: &str) -> AppResult<()> {
        self.db.kv().set(keys::LAST_SYNC, display)?;
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.read_preference(keys::THEME)
    }

    pub fn set_theme(&self, theme: Theme) -> AppResult<()> {
        self.write_value(keys::THEME, &theme)
    }

    pub fn lang(&self) -> Lang {
        self.read_preference(keys::LANG)
    }

    pub fn set_lang(&self, lang: Lang) -> AppResult<()> {
        self.write_value(keys::LANG, &lang)
    }

    fn read_preference<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.db
            .kv()
            .get(key)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Töm all lokal lagring
    pub fn clear_all(&self) -> AppResult<()> {
        self.db.kv().clear().map_err(AppError::from)
    }
}

fn take_array<T>(
    doc: &Map<String, Value>,
    wire_key: &str,
    local_key: &'static str,
    batch: &mut StoreBatch,
) -> AppResult<()>
where
    T: DeserializeOwned + Serialize,
{
    let Some(value @ Value::Array(_)) = doc.get(wire_key) else {
        return Ok(());
    };

    match serde_json::from_value::<Vec<T>>(value.clone()) {
        Ok(items) => {
            batch.put(local_key, &items)?;
        }
        Err(e) => tracing::warn!("Ignorerar ogiltig samling {} från servern: {}", wire_key, e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, AttendanceRecord, NewGroup, NewMarathon, NewServant, PersonRef};
    use serde_json::json;

    fn setup() -> (Database, LocalStore) {
        let db = Database::open_in_memory().unwrap();
        let store = LocalStore::new(db.clone());
        (db, store)
    }

    fn youth(id: &str, code: &str) -> Youth {
        Youth {
            id: id.into(),
            name: format!("Ungdom {}", id),
            grade: String::new(),
            phone: String::new(),
            code: code.into(),
            added_at: 0,
            image: None,
            pdf_doc: None,
            confession_father: None,
            address: None,
            region: None,
            father_phone: None,
            mother_phone: None,
            siblings_count: None,
        }
    }

    #[test]
    fn test_read_after_write() {
        let (_db, store) = setup();
        assert!(store.get_youth().is_empty());

        let list = vec![youth("a", "11111"), youth("b", "22222")];
        store.save_youth(&list).unwrap();
        assert_eq!(store.get_youth(), list);

        let mut record = AttendanceRecord::new(&PersonRef::Youth("a".into()), "2026-03-06");
        record.liturgy = true;
        store.save_attendance(&[record.clone()]).unwrap();
        assert_eq!(store.get_attendance(), vec![record]);

        store.save_attendance(&[]).unwrap();
        assert!(store.get_attendance().is_empty());

        let servants = vec![NewServant {
            name: "Abanoub".into(),
            role: "Ledare".into(),
            ..Default::default()
        }
        .into_servant("s1".into(), "33333".into(), 1_700_000_000_000)];
        store.save_servants(&servants).unwrap();
        assert_eq!(store.get_servants(), servants);

        let group = NewGroup {
            name: "Lag 1".into(),
            servant_name: "Abanoub".into(),
            youth_ids: vec!["a".into(), "b".into()],
        }
        .into_group("g1".into());
        let mut marathon = NewMarathon {
            name: "Fastan".into(),
            start_date: "2026-02-20".into(),
            end_date: "2026-04-10".into(),
            ..Default::default()
        }
        .into_marathon("m1".into());
        marathon.group_ids.push(group.id.clone());
        marathon.point_system.liturgy = 25;
        store.save_marathons(&[marathon.clone()]).unwrap();
        store.save_marathon_groups(&[group.clone()]).unwrap();
        assert_eq!(store.get_marathons(), vec![marathon]);
        assert_eq!(store.get_marathon_groups(), vec![group]);

        let points = vec![ActivityPointEntry {
            marathon_id: "m1".into(),
            youth_id: "a".into(),
            week_date: "2026-03-06".into(),
            activity: Activity::Fasting,
            points: 10,
            reason: "Fasta hela veckan".into(),
            timestamp: 1_700_000_000_000,
            manual: true,
        }];
        store.save_marathon_points(&points).unwrap();
        assert_eq!(store.get_marathon_points(), points);

        let config = SystemConfig {
            church_name: "S:t Markus".into(),
            grades: vec!["Årskurs 2".into()],
            last_cloud_sync: Some("2026-03-06 18:30".into()),
            ..Default::default()
        };
        store.save_config(&config).unwrap();
        assert_eq!(store.get_config(), config);
    }

    #[test]
    fn test_malformed_local_data_degrades_to_empty() {
        let (db, store) = setup();
        db.kv().set(keys::YOUTH, "{inte json").unwrap();
        db.kv().set(keys::CONFIG, "[]").unwrap();

        assert!(store.get_youth().is_empty());
        assert_eq!(store.get_config(), SystemConfig::default());
    }

    #[test]
    fn test_apply_remote_skips_missing_and_malformed() {
        let (_db, store) = setup();
        let local_youth = vec![youth("a", "11111")];
        store.save_youth(&local_youth).unwrap();
        store.save_servants(&[]).unwrap();

        let doc = json!({
            "youth": "inte en lista",
            "attendance": [{"id": "a-2026-03-06", "youthId": "a", "date": "2026-03-06", "meeting": true}],
            "servants": [{"bad": 1}],
            "config": {"churchName": "X", "meetingName": "Y", "adminPassword": "z", "grades": []}
        });

        let applied = store.apply_remote(doc.as_object().unwrap()).unwrap();

        assert_eq!(applied, vec![keys::ATTENDANCE, keys::CONFIG]);
        assert_eq!(store.get_youth(), local_youth);
        assert_eq!(store.get_attendance().len(), 1);
        assert!(store.get_attendance()[0].meeting);
        assert_eq!(store.get_config().church_name, "X");
    }

    #[test]
    fn test_flags_and_preferences() {
        let (_db, store) = setup();
        assert!(!store.get_flag(keys::SESSION));
        store.set_flag(keys::SESSION, true).unwrap();
        assert!(store.get_flag(keys::SESSION));
        store.set_flag(keys::SESSION, false).unwrap();
        assert!(!store.get_flag(keys::SESSION));

        assert_eq!(store.theme(), Theme::Light);
        store.set_theme(Theme::Dark).unwrap();
        assert_eq!(store.theme(), Theme::Dark);
        store.set_lang(Lang::En).unwrap();
        assert_eq!(store.lang(), Lang::En);
    }

    #[test]
    fn test_snapshot_contains_all_collections() {
        let (_db, store) = setup();
        store.save_youth(&[youth("a", "11111")]).unwrap();

        let doc = store.snapshot("2026-03-06T00:00:00Z".into());
        assert_eq!(doc.youth.len(), 1);
        assert!(doc.attendance.is_empty());
        assert_eq!(doc.config, SystemConfig::default());
        assert_eq!(doc.updated_at, "2026-03-06T00:00:00Z");
    }
}
