//! Repository layer over an injected key-value store
pub mod cache;

use crate::domain::{EquipmentProfile, Observation, Session};
use crate::engine::challenges::ChallengeState;
use crate::errors::ApiResult;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Whole-value JSON storage. Reads return the last written value; writes replace it.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn keys(&self, prefix: &str) -> Vec<String>;
}

/// Process-local store
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
    }

    fn keys(&self, prefix: &str) -> Vec<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

/// Fixed top-level keys; each is namespaced per device
#[derive(Debug, Clone, Copy)]
pub enum StoreKey {
    Observations,
    Equipment,
    ChallengeProgress,
    Sessions,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observations => "observations",
            Self::Equipment => "equipment",
            Self::ChallengeProgress => "challenge-progress",
            Self::Sessions => "sessions",
        }
    }

    pub fn for_device(&self, device_id: &str) -> String {
        format!("{}:{}", self.as_str(), device_id)
    }
}

/// Read a typed value, or its default when nothing was written yet
pub fn load_or_default<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    key: &str,
) -> ApiResult<T> {
    match store.get(key) {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}

/// Replace a typed value
pub fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> ApiResult<()> {
    store.set(key, serde_json::to_value(value)?);
    Ok(())
}

/// Observation log repository
#[derive(Clone)]
pub struct ObservationRepo {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ObservationRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn list(&self, device_id: &str) -> ApiResult<Vec<Observation>> {
        load_or_default(&*self.store, &StoreKey::Observations.for_device(device_id))
    }

    /// Upsert by observation id; returns how many were new
    pub fn upsert(&self, device_id: &str, incoming: Vec<Observation>) -> ApiResult<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut log = self.list(device_id)?;
        let mut created = 0;

        for obs in incoming {
            match log.iter_mut().find(|o| o.id == obs.id) {
                Some(existing) => *existing = obs,
                None => {
                    log.push(obs);
                    created += 1;
                }
            }
        }

        save(&*self.store, &StoreKey::Observations.for_device(device_id), &log)?;
        Ok(created)
    }

    /// Remove one observation; false when the device has no such entry
    pub fn delete(&self, device_id: &str, observation_id: &str) -> ApiResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut log = self.list(device_id)?;
        let before = log.len();
        log.retain(|o| o.id != observation_id);
        if log.len() == before {
            return Ok(false);
        }
        save(&*self.store, &StoreKey::Observations.for_device(device_id), &log)?;
        Ok(true)
    }

    /// Every device's log
    pub fn all(&self) -> ApiResult<Vec<Observation>> {
        let prefix = format!("{}:", StoreKey::Observations.as_str());
        let mut all = Vec::new();
        for key in self.store.keys(&prefix) {
            let log: Vec<Observation> = load_or_default(&*self.store, &key)?;
            all.extend(log);
        }
        Ok(all)
    }
}

/// Equipment repository
#[derive(Clone)]
pub struct EquipmentRepo {
    store: Arc<dyn KeyValueStore>,
}

impl EquipmentRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn list(&self, device_id: &str) -> ApiResult<Vec<EquipmentProfile>> {
        load_or_default(&*self.store, &StoreKey::Equipment.for_device(device_id))
    }

    pub fn replace(&self, device_id: &str, equipment: &[EquipmentProfile]) -> ApiResult<()> {
        save(&*self.store, &StoreKey::Equipment.for_device(device_id), &equipment)
    }
}

/// Weekly challenge progress repository
#[derive(Clone)]
pub struct ChallengeRepo {
    store: Arc<dyn KeyValueStore>,
}

impl ChallengeRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, device_id: &str) -> ApiResult<ChallengeState> {
        load_or_default(&*self.store, &StoreKey::ChallengeProgress.for_device(device_id))
    }

    pub fn save(&self, device_id: &str, state: &ChallengeState) -> ApiResult<()> {
        save(&*self.store, &StoreKey::ChallengeProgress.for_device(device_id), state)
    }
}

/// Observing session repository
#[derive(Clone)]
pub struct SessionRepo {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl SessionRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn list(&self, device_id: &str) -> ApiResult<Vec<Session>> {
        load_or_default(&*self.store, &StoreKey::Sessions.for_device(device_id))
    }

    /// Insert or replace by session id
    pub fn upsert(&self, device_id: &str, session: Session) -> ApiResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sessions = self.list(device_id)?;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session,
            None => sessions.push(session),
        }
        save(&*self.store, &StoreKey::Sessions.for_device(device_id), &sessions)
    }
}
