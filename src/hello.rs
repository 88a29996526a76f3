//! The `n:hello/0` function.

use std::os::raw::c_int;

use crate::ffi::catch_panic;
use crate::host::{self, Env};
use crate::sys::{ERL_NIF_TERM, ErlNifEnv};

const GREETING: &str = "Hello world";

/// Returns the greeting `n:hello/0` hands back to Erlang.
pub fn hello() -> &'static str {
    GREETING
}

/// Native callback registered as `hello/0`.
///
/// # Safety
///
/// Must only be called by the VM (or a test harness standing in for it) with a
/// live environment. The VM dispatches here only after `load` returned 0, and
/// `load` fails unless the host API is pinned, so `host::api()` cannot fail on
/// this path. If that invariant is ever broken there is no term to return and
/// the process aborts.
pub unsafe extern "C" fn hello_nif(
    env: *mut ErlNifEnv,
    argc: c_int,
    _argv: *const ERL_NIF_TERM,
) -> ERL_NIF_TERM {
    let api = match host::api() {
        Ok(api) => api,
        Err(err) => {
            debug_assert!(false, "hello/0 dispatched before a successful load: {err}");
            log::error!("hello/0 called without a host API: {err}");
            std::process::abort();
        }
    };
    // Safety: `env` is the environment of the current call.
    let env = unsafe { Env::new(env, api) };

    if argc != 0 {
        log::warn!("hello/0 called with {argc} arguments");
        return env.make_badarg().as_raw();
    }

    match catch_panic(|| env.make_string(hello())) {
        Ok(term) => term.as_raw(),
        Err(message) => {
            log::error!("panic in hello/0: {message}");
            env.make_badarg().as_raw()
        }
    }
}
