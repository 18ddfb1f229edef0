//! Process-default configuration and shared client.
//!
//! The core API never requires these: every [`Client`] can be built from an
//! explicit [`Configuration`]. They exist for applications that want a single
//! ambient setup. Neither is meant for multi-tenant use; build one client per
//! tenant instead.

use crate::{Client, Configuration, Result};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

static CONFIGURATION: Lazy<RwLock<Configuration>> =
    Lazy::new(|| RwLock::new(Configuration::default()));

static SHARED_CLIENT: Lazy<Mutex<Option<Client>>> = Lazy::new(|| Mutex::new(None));

/// Modify the process-default configuration.
///
/// ```
/// anvil_core::configure(|config| {
///     config.set_api_key("my-api-key");
///     config.max_retries = 5;
/// });
/// ```
pub fn configure<F>(f: F)
where
    F: FnOnce(&mut Configuration),
{
    f(&mut CONFIGURATION.write());
    // The memoised client was built from the previous settings.
    SHARED_CLIENT.lock().take();
}

/// Get a copy of the process-default configuration.
pub fn configuration() -> Configuration {
    CONFIGURATION.read().clone()
}

/// Restore the process-default configuration to its defaults.
pub fn reset() {
    *CONFIGURATION.write() = Configuration::default();
    SHARED_CLIENT.lock().take();
}

/// Get the memoised client built from the process-default configuration.
pub(crate) fn shared_client() -> Result<Client> {
    let mut slot = SHARED_CLIENT.lock();
    if let Some(client) = slot.as_ref() {
        return Ok(client.clone());
    }
    let client = Client::new(configuration())?;
    *slot = Some(client.clone());
    Ok(client)
}
