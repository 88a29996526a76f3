//! Module lifecycle: the symbol the VM loader resolves and its callbacks.

use std::os::raw::{c_int, c_void};

use log::{debug, error, warn};

use crate::ffi::catch_panic;
use crate::host;
use crate::logging;
use crate::registry::{Callbacks, ENTRY, functions};
use crate::sys::{ERL_NIF_TERM, ErlNifEntry, ErlNifEnv};

const LOAD_OK: c_int = 0;
const LOAD_FAILED: c_int = 1;

pub(crate) fn callbacks() -> Callbacks {
    Callbacks {
        load,
        upgrade,
        unload,
    }
}

/// Entry point resolved by `erlang:load_nif/2`.
#[unsafe(no_mangle)]
pub extern "C" fn nif_init() -> *const ErlNifEntry {
    ENTRY.entry()
}

fn on_load() -> c_int {
    if let Err(err) = logging::init() {
        // Someone else owns the `log` facade; our records still reach it.
        warn!("{err}");
    }

    match host::api() {
        Ok(_) => {
            debug!("loaded module n with {} functions", functions().len());
            LOAD_OK
        }
        Err(err) => {
            error!("failed to load module n: {err}");
            LOAD_FAILED
        }
    }
}

unsafe extern "C" fn load(
    _env: *mut ErlNifEnv,
    _priv_data: *mut *mut c_void,
    _load_info: ERL_NIF_TERM,
) -> c_int {
    catch_panic(on_load).unwrap_or(LOAD_FAILED)
}

unsafe extern "C" fn upgrade(
    _env: *mut ErlNifEnv,
    _priv_data: *mut *mut c_void,
    _old_priv_data: *mut *mut c_void,
    _load_info: ERL_NIF_TERM,
) -> c_int {
    catch_panic(|| {
        debug!("upgrading module n");
        on_load()
    })
    .unwrap_or(LOAD_FAILED)
}

unsafe extern "C" fn unload(_env: *mut ErlNifEnv, _priv_data: *mut c_void) {
    debug!("unloading module n");
}
