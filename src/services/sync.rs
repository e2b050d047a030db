//! Synkmotor: push och pull av hela dokumentet
//!
//! Lokala skrivningar är alltid klara innan något nätverksanrop görs.
//! Fel mot servern är aldrig fatala, de blir en `SyncFailed`-händelse och
//! ett falskt resultat.

use std::sync::Arc;

use chrono::{Local, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::dirty::DirtyTracker;
use super::events::{EventBus, StoreEvent};
use super::remote::RemoteStore;
use super::store::LocalStore;
use crate::models::RemoteDocument;
use crate::utils::SyncError;

/// Visningsformat för senaste synk
const LAST_SYNC_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullFailure {
    /// Osynkade lokala ändringar, en push gjordes i stället
    Dirty,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PullOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<PullFailure>,
}

impl PullOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    fn failed(reason: PullFailure) -> Self {
        Self {
            success: false,
            reason: Some(reason),
        }
    }
}

#[derive(Clone)]
pub struct SyncEngine {
    store: LocalStore,
    dirty: DirtyTracker,
    remote: Arc<dyn RemoteStore>,
    events: EventBus,
}

impl SyncEngine {
    pub fn new(store: LocalStore, dirty: DirtyTracker, remote: Arc<dyn RemoteStore>, events: EventBus) -> Self {
        Self {
            store,
            dirty,
            remote,
            events,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn last_sync(&self) -> Option<String> {
        self.store.last_sync()
    }

    /// Skicka hela det lokala tillståndet till servern
    pub async fn push(&self) -> bool {
        self.events.emit(StoreEvent::SyncStarted);

        let seen = self.dirty.generation();
        let stamp = sync_stamp();
        let mut doc = self.store.snapshot(now_iso());
        doc.config.last_cloud_sync = Some(stamp.clone());

        match self.remote.store(&doc).await {
            Ok(()) => {
                if let Err(e) = self.dirty.settle_push(seen) {
                    tracing::warn!("Kunde inte uppdatera smutsflaggan: {}", e);
                }
                self.record_sync(&stamp);
                tracing::info!(
                    "Push klar: {} ungdomar, {} närvaroposter",
                    doc.youth.len(),
                    doc.attendance.len()
                );
                self.events.emit(StoreEvent::SyncEnded);
                true
            }
            Err(e) => {
                tracing::warn!("Push misslyckades: {}", e);
                self.events.emit(StoreEvent::SyncFailed);
                self.events.emit(StoreEvent::SyncEnded);
                false
            }
        }
    }

    /// Hämta serverns dokument och skriv över lokala samlingar.
    ///
    /// Utan `force` vägrar den att skriva över osynkade ändringar och gör en
    /// push i stället.
    pub async fn pull(&self, force: bool) -> PullOutcome {
        if !force && self.dirty.is_dirty() {
            tracing::info!("Osynkade ändringar, pushar i stället för pull");
            self.push().await;
            return PullOutcome::failed(PullFailure::Dirty);
        }

        self.events.emit(StoreEvent::SyncStarted);
        let seen = self.dirty.generation();

        let body = match self.remote.fetch().await {
            Ok(body) => body,
            Err(e) => return self.pull_failed(e),
        };

        let Value::Object(doc) = body else {
            return self.pull_failed(SyncError::Malformed("dokumentet är inte ett objekt".into()));
        };

        if !force && self.dirty.generation() != seen {
            tracing::info!("Ändringar under hämtning, avbryter överskrivning");
            self.events.emit(StoreEvent::SyncEnded);
            self.push().await;
            return PullOutcome::failed(PullFailure::Dirty);
        }

        let applied = match self.store.apply_remote(&doc) {
            Ok(applied) => applied,
            Err(e) => return self.pull_failed(e.into()),
        };

        let cleared = if force {
            self.dirty.clear_dirty().map(|_| true)
        } else {
            self.dirty.clear_if_unchanged(seen)
        };
        if let Err(e) = cleared {
            tracing::warn!("Kunde inte rensa smutsflaggan: {}", e);
        }

        self.record_sync(&sync_stamp());
        tracing::info!("Pull klar, uppdaterade {:?}", applied);
        self.events.emit(StoreEvent::StoreChanged);
        self.events.emit(StoreEvent::SyncEnded);
        PullOutcome::ok()
    }

    /// Töm servern och all lokal lagring
    pub async fn factory_reset(&self) -> bool {
        self.events.emit(StoreEvent::SyncStarted);

        let empty = RemoteDocument::empty(now_iso());
        if let Err(e) = self.remote.store(&empty).await {
            tracing::warn!("Fabriksåterställning misslyckades: {}", e);
            self.events.emit(StoreEvent::SyncFailed);
            self.events.emit(StoreEvent::SyncEnded);
            return false;
        }

        if let Err(e) = self.store.clear_all() {
            tracing::error!("Servern tömdes men lokal lagring kunde inte rensas: {}", e);
            self.events.emit(StoreEvent::SyncFailed);
            self.events.emit(StoreEvent::SyncEnded);
            return false;
        }

        tracing::info!("Fabriksåterställning klar");
        self.events.emit(StoreEvent::StoreChanged);
        self.events.emit(StoreEvent::SyncEnded);
        true
    }

    fn pull_failed(&self, err: SyncError) -> PullOutcome {
        tracing::warn!("Pull misslyckades: {}", err);
        self.events.emit(StoreEvent::SyncFailed);
        self.events.emit(StoreEvent::SyncEnded);
        PullOutcome::failed(PullFailure::Failed)
    }

    /// Spara tiden både som lokal nyckel och i konfigurationen
    fn record_sync(&self, stamp: &str) {
        if let Err(e) = self.store.set_last_sync(stamp) {
            tracing::warn!("Kunde inte spara tid för senaste synk: {}", e);
        }
        let mut config = self.store.get_config();
        config.last_cloud_sync = Some(stamp.to_string());
        if let Err(e) = self.store.save_config(&config) {
            tracing::warn!("Kunde inte stämpla konfigurationen: {}", e);
        }
    }
}

fn sync_stamp() -> String {
    Local::now().format(LAST_SYNC_FORMAT).to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
