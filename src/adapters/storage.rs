//! Persistent storage adapters.
//!
//! - [`NvsStorage`] implements [`StoragePort`]. On ESP-IDF it writes NVS
//!   blobs (atomic per `nvs_commit`); on the host it is an in-memory map
//!   for tests and simulation.
//! - [`StoredConfig`] implements [`ConfigPort`] on top of any
//!   [`StoragePort`], storing [`SystemConfig`] as a postcard blob.

use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

const CONFIG_NAMESPACE: &str = "hydrapurr";
const CONFIG_KEY: &str = "syscfg";

/// Largest config blob accepted on load.
pub const MAX_CONFIG_BLOB: usize = 2048;

/// NVS limits namespace and key names to 15 bytes plus NUL.
const NVS_NAME_MAX: usize = 15;

// ───────────────────────────────────────────────────────────────
// NvsStorage
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct NvsStorage {
    #[cfg_attr(target_os = "espidf", allow(dead_code))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsStorage {
    /// Initialise NVS flash, erasing the partition when it is full or was
    /// written by a newer IDF.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::{
                ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES, ESP_OK, nvs_flash_erase,
                nvs_flash_init,
            };
            // SAFETY: called once from the main task before any NVS access.
            let mut ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                    return Err(StorageError::IoError);
                }
                ret = unsafe { nvs_flash_init() };
            }
            if ret != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
            info!("NvsStorage: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsStorage: in-memory backend");

        Ok(Self::default())
    }

    #[cfg_attr(target_os = "espidf", allow(dead_code))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }
}

/// NUL-terminated, truncated copy of an NVS name.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn nvs_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
    let mut buf = [0u8; NVS_NAME_MAX + 1];
    let len = name.len().min(NVS_NAME_MAX);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

#[cfg(target_os = "espidf")]
mod nvs {
    use esp_idf_svc::sys::{
        ESP_OK, esp_err_t, nvs_close, nvs_handle_t, nvs_open, nvs_open_mode_t_NVS_READONLY,
        nvs_open_mode_t_NVS_READWRITE,
    };

    /// Open `namespace`, run `f` with the handle, then close it.
    pub(super) fn with_handle<T>(
        namespace: &str,
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, esp_err_t> {
        let ns = super::nvs_name(namespace);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }
}

impl StoragePort for NvsStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let data = self
                .store
                .get(&Self::composite_key(namespace, key))
                .ok_or(StorageError::NotFound)?;
            if data.len() > buf.len() {
                return Err(StorageError::Full);
            }
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::{ESP_ERR_NVS_INVALID_LENGTH, ESP_ERR_NVS_NOT_FOUND, ESP_OK, nvs_get_blob};
            let k = nvs_name(key);
            let result = nvs::with_handle(namespace, false, |handle| {
                let mut size = buf.len();
                // SAFETY: `buf` is valid for `size` bytes; `k` is NUL-terminated.
                let ret = unsafe {
                    nvs_get_blob(handle, k.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret == ESP_OK as i32 { Ok(size) } else { Err(ret) }
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_FOUND as i32 {
                    StorageError::NotFound
                } else if e == ESP_ERR_NVS_INVALID_LENGTH as i32 {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::{ESP_ERR_NVS_NOT_ENOUGH_SPACE, ESP_OK, nvs_commit, nvs_set_blob};
            let k = nvs_name(key);
            let result = nvs::with_handle(namespace, true, |handle| {
                // SAFETY: `data` is valid for its length; `k` is NUL-terminated.
                let ret = unsafe {
                    nvs_set_blob(handle, k.as_ptr().cast(), data.as_ptr().cast(), data.len())
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.remove(&Self::composite_key(namespace, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::{ESP_ERR_NVS_NOT_FOUND, ESP_OK, nvs_commit, nvs_erase_key};
            let k = nvs_name(key);
            nvs::with_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, k.as_ptr().cast()) };
                if ret != ESP_OK as i32 && ret != ESP_ERR_NVS_NOT_FOUND as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
            })
            .map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.contains_key(&Self::composite_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::{ESP_OK, nvs_get_blob};
            let k = nvs_name(key);
            nvs::with_handle(namespace, false, |handle| {
                let mut size = 0usize;
                // A null buffer only queries the length.
                let ret = unsafe {
                    nvs_get_blob(handle, k.as_ptr().cast(), core::ptr::null_mut(), &mut size)
                };
                if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
            })
            .is_ok()
        }
    }
}

// ───────────────────────────────────────────────────────────────
// StoredConfig
// ───────────────────────────────────────────────────────────────

/// [`ConfigPort`] backed by a postcard blob in any [`StoragePort`].
pub struct StoredConfig<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> StoredConfig<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Remove the stored config so the next load yields defaults.
    pub fn clear(&mut self) -> Result<(), ConfigError> {
        self.storage
            .delete(CONFIG_NAMESPACE, CONFIG_KEY)
            .map_err(ConfigError::from)
    }
}

impl<S: StoragePort> ConfigPort for StoredConfig<S> {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        let len = match self.storage.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("StoredConfig: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(StorageError::Full) => return Err(ConfigError::Corrupted),
            Err(e) => return Err(e.into()),
        };

        let cfg: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        if let Err(e) = cfg.validate() {
            warn!("StoredConfig: stored config rejected: {}", e);
            return Err(ConfigError::Corrupted);
        }
        info!("StoredConfig: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_CONFIG_BLOB {
            return Err(ConfigError::StorageFull);
        }
        self.storage.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)?;
        info!("StoredConfig: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
