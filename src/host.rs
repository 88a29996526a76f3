//! Calls back into the VM that loaded this library.
//!
//! The `enif_*` functions live in the BEAM executable, not in a library we can
//! link against. They are looked up in the running process when the module is
//! loaded, so building and testing this crate never needs an ERTS install.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::os::raw::c_char;

use once_cell::sync::OnceCell;

use crate::error::{NifError, Result};
use crate::ffi::cstring_from_str_lossy;
use crate::sys::{ERL_NIF_TERM, ErlNifCharEncoding, ErlNifEnv};

pub type MakeStringFn = unsafe extern "C" fn(
    env: *mut ErlNifEnv,
    string: *const c_char,
    encoding: ErlNifCharEncoding,
) -> ERL_NIF_TERM;

pub type MakeBadargFn = unsafe extern "C" fn(env: *mut ErlNifEnv) -> ERL_NIF_TERM;

static HOST_API: OnceCell<HostApi> = OnceCell::new();

/// The subset of the VM's NIF API this library calls.
#[derive(Clone, Copy, Debug)]
pub struct HostApi {
    pub make_string: MakeStringFn,
    pub make_badarg: MakeBadargFn,
}

impl HostApi {
    /// Looks up the VM's exported `enif_*` symbols in the current process.
    #[cfg(unix)]
    pub fn resolve() -> Result<Self> {
        // Safety: the symbols, when present, are the VM's `erl_nif.h` functions
        // and have exactly these signatures.
        unsafe {
            let make_string = lookup(c"enif_make_string", "enif_make_string")?;
            let make_badarg = lookup(c"enif_make_badarg", "enif_make_badarg")?;
            Ok(Self {
                make_string: std::mem::transmute::<*mut libc::c_void, MakeStringFn>(make_string),
                make_badarg: std::mem::transmute::<*mut libc::c_void, MakeBadargFn>(make_badarg),
            })
        }
    }

    #[cfg(not(unix))]
    pub fn resolve() -> Result<Self> {
        Err(NifError::UnsupportedPlatform)
    }
}

#[cfg(unix)]
unsafe fn lookup(symbol: &CStr, name: &'static str) -> Result<*mut libc::c_void> {
    // Safety: RTLD_DEFAULT searches the global symbol scope of the process.
    let address = unsafe { libc::dlsym(libc::RTLD_DEFAULT, symbol.as_ptr()) };
    if address.is_null() {
        return Err(NifError::MissingHostSymbol(name));
    }
    Ok(address)
}

/// Pins `api` as the host API for this process.
///
/// Returns `false` if another table was installed first; the existing table is kept.
pub fn install(api: HostApi) -> bool {
    HOST_API.set(api).is_ok()
}

/// Returns the installed host API, resolving it from the process on first use.
pub fn api() -> Result<&'static HostApi> {
    HOST_API.get_or_try_init(HostApi::resolve)
}

/// A term owned by the environment it was created in.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Term(ERL_NIF_TERM);

impl Term {
    pub fn as_raw(self) -> ERL_NIF_TERM {
        self.0
    }
}

/// Process-bound environment handed to a NIF call.
pub struct Env<'a> {
    raw: *mut ErlNifEnv,
    api: &'a HostApi,
    _env: PhantomData<&'a mut ErlNifEnv>,
}

impl<'a> Env<'a> {
    /// # Safety
    ///
    /// `raw` must be the environment the VM passed to the current call and must
    /// outlive `'a`.
    pub unsafe fn new(raw: *mut ErlNifEnv, api: &'a HostApi) -> Self {
        Self {
            raw,
            api,
            _env: PhantomData,
        }
    }

    /// Builds a charlist from UTF-8 text. Interior NULs become spaces.
    pub fn make_string(&self, value: &str) -> Term {
        let value = cstring_from_str_lossy(value);
        self.make_charlist(&value)
    }

    fn make_charlist(&self, value: &CStr) -> Term {
        // Safety: `raw` is live for `'a` and `value` is NUL-terminated.
        let raw = unsafe {
            (self.api.make_string)(self.raw, value.as_ptr(), ErlNifCharEncoding::ERL_NIF_UTF8)
        };
        Term(raw)
    }

    pub fn make_badarg(&self) -> Term {
        // Safety: `raw` is live for `'a`.
        Term(unsafe { (self.api.make_badarg)(self.raw) })
    }
}
