//! Raw `erl_nif.h` ABI types.

#![allow(non_camel_case_types, non_snake_case)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub const ERL_NIF_MAJOR_VERSION: c_int = 2;
pub const ERL_NIF_MINOR_VERSION: c_int = 17;
pub const ERL_NIF_VM_VARIANT: &std::ffi::CStr = c"beam.vanilla";
pub const ERL_NIF_MIN_ERTS_VERSION: &std::ffi::CStr = c"erts-14.0";

/// Marks the library as built with dirty NIF support.
pub const ERL_NIF_DIRTY_NIF_OPTION: c_uint = 1;

/// `ErlNifFunc::flags` value for a function run on a normal scheduler.
pub const ERL_NIF_NORMAL_JOB: c_uint = 0;

pub type ERL_NIF_TERM = usize;

/// Opaque VM environment.
#[repr(C)]
pub struct ErlNifEnv {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErlNifCharEncoding {
    ERL_NIF_LATIN1 = 1,
    ERL_NIF_UTF8 = 2,
}

pub type NifCallback = unsafe extern "C" fn(
    env: *mut ErlNifEnv,
    argc: c_int,
    argv: *const ERL_NIF_TERM,
) -> ERL_NIF_TERM;

pub type LoadCallback = unsafe extern "C" fn(
    env: *mut ErlNifEnv,
    priv_data: *mut *mut c_void,
    load_info: ERL_NIF_TERM,
) -> c_int;

pub type UpgradeCallback = unsafe extern "C" fn(
    env: *mut ErlNifEnv,
    priv_data: *mut *mut c_void,
    old_priv_data: *mut *mut c_void,
    load_info: ERL_NIF_TERM,
) -> c_int;

pub type UnloadCallback = unsafe extern "C" fn(env: *mut ErlNifEnv, priv_data: *mut c_void);

#[repr(C)]
pub struct ErlNifFunc {
    pub name: *const c_char,
    pub arity: c_uint,
    pub fptr: NifCallback,
    pub flags: c_uint,
}

/// Only the size of this struct is reported to the VM.
#[repr(C)]
pub struct ErlNifResourceTypeInit {
    pub dtor: *const c_void,
    pub stop: *const c_void,
    pub down: *const c_void,
    pub members: c_int,
    pub dyncall: *const c_void,
}

#[repr(C)]
pub struct ErlNifEntry {
    pub major: c_int,
    pub minor: c_int,
    pub name: *const c_char,
    pub num_of_funcs: c_int,
    pub funcs: *const ErlNifFunc,
    pub load: Option<LoadCallback>,
    pub reload: Option<LoadCallback>,
    pub upgrade: Option<UpgradeCallback>,
    pub unload: Option<UnloadCallback>,
    pub vm_variant: *const c_char,
    pub options: c_uint,
    pub sizeof_ErlNifResourceTypeInit: usize,
    pub min_erts: *const c_char,
}
