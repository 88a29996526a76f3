//! Shared utilities for the NIF boundary.

use std::ffi::CString;
use std::panic::{self, AssertUnwindSafe};

pub(crate) fn cstring_from_str_lossy(value: &str) -> CString {
    if value.as_bytes().contains(&0) {
        let sanitized: String = value.chars().map(|c| if c == '\0' { ' ' } else { c }).collect();
        CString::new(sanitized).unwrap_or_default()
    } else {
        CString::new(value).unwrap_or_default()
    }
}

/// Runs `body`, turning a panic into `Err` with the panic message.
///
/// Nothing may unwind into the VM's scheduler threads.
pub(crate) fn catch_panic<T>(body: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(body)).map_err(|payload| {
        if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_nul_is_replaced() {
        assert_eq!(cstring_from_str_lossy("a\0b").as_bytes(), b"a b");
        assert_eq!(cstring_from_str_lossy("Hello world").as_bytes(), b"Hello world");
    }

    #[test]
    fn panic_message_is_captured() {
        let err = catch_panic(|| -> u8 { panic!("boom") }).unwrap_err();
        assert_eq!(err, "boom");
        assert_eq!(catch_panic(|| 7).unwrap(), 7);
    }
}
