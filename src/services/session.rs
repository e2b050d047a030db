//! Inloggning och kodsökning
//!
//! Sessionen är en lokal flagga och synkas aldrig.

use super::store::{keys, LocalStore};
use crate::models::{Member, Servant, Youth};
use crate::utils::AppResult;

pub struct Session<'a> {
    store: &'a LocalStore,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Jämför mot adminlösenordet i konfigurationen
    pub fn login(&self, password: &str) -> AppResult<bool> {
        let ok = !password.is_empty() && password == self.store.get_config().admin_password;
        if ok {
            self.store.set_flag(keys::SESSION, true)?;
            tracing::info!("Inloggad som administratör");
        } else {
            tracing::warn!("Felaktigt lösenord");
        }
        Ok(ok)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.store.set_flag(keys::SESSION, false)
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.get_flag(keys::SESSION)
    }

    pub fn find_youth_by_code(&self, code: &str) -> Option<Youth> {
        find_by_code(self.store.get_youth(), code)
    }

    pub fn find_servant_by_code(&self, code: &str) -> Option<Servant> {
        find_by_code(self.store.get_servants(), code)
    }
}

fn find_by_code<M: Member>(members: Vec<M>, code: &str) -> Option<M> {
    let code = code.trim();
    members.into_iter().find(|m| m.code() == code)
}
