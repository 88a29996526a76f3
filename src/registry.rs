//! Registration table the VM reads when it loads module `n`.

use std::ffi::CStr;
use std::os::raw::{c_int, c_uint};

use once_cell::sync::Lazy;

use crate::hello::hello_nif;
use crate::sys::{
    ERL_NIF_DIRTY_NIF_OPTION, ERL_NIF_MAJOR_VERSION, ERL_NIF_MIN_ERTS_VERSION,
    ERL_NIF_MINOR_VERSION, ERL_NIF_NORMAL_JOB, ERL_NIF_VM_VARIANT, ErlNifEntry, ErlNifFunc,
    ErlNifResourceTypeInit, LoadCallback, NifCallback, UnloadCallback, UpgradeCallback,
};

pub const MODULE_NAME: &CStr = c"n";

/// One `name/arity` exported to Erlang.
#[derive(Clone, Copy, Debug)]
pub struct NifFunction {
    pub name: &'static CStr,
    pub arity: u32,
    pub callback: NifCallback,
    /// `ErlNifFunc::flags`; every export here runs on a normal scheduler.
    pub flags: c_uint,
}

impl NifFunction {
    fn to_raw(self) -> ErlNifFunc {
        ErlNifFunc {
            name: self.name.as_ptr(),
            arity: self.arity,
            fptr: self.callback,
            flags: self.flags,
        }
    }
}

static FUNCTIONS: [NifFunction; 1] = [NifFunction {
    name: c"hello",
    arity: 0,
    callback: hello_nif,
    flags: ERL_NIF_NORMAL_JOB,
}];

pub fn functions() -> &'static [NifFunction] {
    &FUNCTIONS
}

/// Finds the function exported as `name/arity`.
pub fn lookup(name: &str, arity: u32) -> Option<&'static NifFunction> {
    FUNCTIONS
        .iter()
        .find(|function| function.arity == arity && function.name.to_bytes() == name.as_bytes())
}

/// Lifecycle callbacks recorded in the loader entry.
pub(crate) struct Callbacks {
    pub load: LoadCallback,
    pub upgrade: UpgradeCallback,
    pub unload: UnloadCallback,
}

/// The loader entry and the function array it points into.
pub(crate) struct EntryTable {
    // Kept alive for `entry.funcs`.
    _funcs: Vec<ErlNifFunc>,
    entry: ErlNifEntry,
}

// Safety: every pointer in the table refers to 'static data or to `_funcs`,
// which is never mutated after construction.
unsafe impl Send for EntryTable {}
unsafe impl Sync for EntryTable {}

impl EntryTable {
    pub(crate) fn new(callbacks: Callbacks) -> Self {
        let funcs: Vec<ErlNifFunc> = functions().iter().map(|function| function.to_raw()).collect();
        let entry = ErlNifEntry {
            major: ERL_NIF_MAJOR_VERSION,
            minor: ERL_NIF_MINOR_VERSION,
            name: MODULE_NAME.as_ptr(),
            num_of_funcs: funcs.len() as c_int,
            funcs: funcs.as_ptr(),
            load: Some(callbacks.load),
            reload: None,
            upgrade: Some(callbacks.upgrade),
            unload: Some(callbacks.unload),
            vm_variant: ERL_NIF_VM_VARIANT.as_ptr(),
            options: ERL_NIF_DIRTY_NIF_OPTION,
            sizeof_ErlNifResourceTypeInit: std::mem::size_of::<ErlNifResourceTypeInit>(),
            min_erts: ERL_NIF_MIN_ERTS_VERSION.as_ptr(),
        };
        Self { _funcs: funcs, entry }
    }

    pub(crate) fn entry(&self) -> &ErlNifEntry {
        &self.entry
    }
}

pub(crate) static ENTRY: Lazy<EntryTable> = Lazy::new(|| EntryTable::new(crate::init::callbacks()));
