//! Operator preferences (selected tenant, dark mode) and the dashboard
//! context that carries them between commands.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, info};
use shared::Tenant;

use crate::api::tenants::resolve_tenant;
use crate::error::{ApiError, Result};

pub const SELECTED_TENANT_KEY: &str = "selectedTenantId";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Key/value persistence for preferences. Last write wins.
pub trait PreferenceStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Preferences kept for the lifetime of the process
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object in one file
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Storage(format!("Corrupt preferences file {}: {}", self.path.display(), e)))
    }

    fn write_all(&self, items: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, text)?;
        debug!("Wrote {} preferences to {}", items.len(), self.path.display());
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// What changed in the context
#[derive(Debug, Clone, PartialEq)]
pub enum ContextChange {
    TenantSelected(Option<String>),
    DarkModeChanged(bool),
}

/// Handle returned by [`DashboardContext::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&ContextChange) + Send>;

/// Selected tenant and theme, loaded from and written through to a
/// [`PreferenceStore`]. Observers hear about every change.
pub struct DashboardContext {
    store: Box<dyn PreferenceStore>,
    tenant_id: Option<String>,
    dark_mode: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

impl DashboardContext {
    /// Reads the stored preferences. Unreadable values fall back to defaults.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let tenant_id = match store.get_item(SELECTED_TENANT_KEY) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                error!("Failed to read selected tenant: {}", e);
                None
            }
        };
        let dark_mode = match store.get_item(DARK_MODE_KEY) {
            Ok(value) => value.map(|v| v == "true").unwrap_or(false),
            Err(e) => {
                error!("Failed to read dark mode preference: {}", e);
                false
            }
        };

        Self {
            store,
            tenant_id,
            dark_mode,
            observers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&ContextChange) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn select_tenant(&mut self, tenant_id: Option<String>) -> Result<()> {
        let tenant_id = tenant_id.filter(|t| !t.trim().is_empty());
        match &tenant_id {
            Some(id) => self.store.set_item(SELECTED_TENANT_KEY, id)?,
            None => self.store.remove_item(SELECTED_TENANT_KEY)?,
        }
        info!("Selected tenant: {}", tenant_id.as_deref().unwrap_or("none"));
        self.tenant_id = tenant_id.clone();
        self.notify(ContextChange::TenantSelected(tenant_id));
        Ok(())
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.store
            .set_item(DARK_MODE_KEY, if enabled { "true" } else { "false" })?;
        self.dark_mode = enabled;
        self.notify(ContextChange::DarkModeChanged(enabled));
        Ok(())
    }

    pub fn toggle_dark_mode(&mut self) -> Result<bool> {
        let enabled = !self.dark_mode;
        self.set_dark_mode(enabled)?;
        Ok(enabled)
    }

    /// Tenant to show: the stored selection if it still exists, else the
    /// first tenant. A changed selection is persisted.
    pub fn resolve_tenant<'a>(&mut self, tenants: &'a [Tenant]) -> Result<Option<&'a Tenant>> {
        let resolved = resolve_tenant(tenants, self.tenant_id());
        let resolved_id = resolved.map(|t| t.tenant_id.clone());
        if resolved_id != self.tenant_id {
            self.select_tenant(resolved_id)?;
        }
        Ok(resolved)
    }

    fn notify(&self, change: ContextChange) {
        for (_, observer) in &self.observers {
            observer(&change);
        }
    }
}
