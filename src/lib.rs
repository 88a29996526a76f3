//! Erlang NIF library for module `n`.
//!
//! Exports `n:hello/0`, which returns the charlist `"Hello world"`.

mod error;
mod ffi;
mod hello;
pub mod host;
mod init;
pub mod logging;
pub mod registry;
pub mod sys;

pub use error::{NifError, Result};
pub use hello::{hello, hello_nif};
pub use init::nif_init;
