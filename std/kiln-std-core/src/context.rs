//!
//! Execution Context
//!
//! One context per batch evaluation. It owns the batch arena and a sticky error
//! slot shared by every kernel invocation of that batch. The first error wins:
//! once set, later messages are dropped until `reset()`.
//!
//! A context is deliberately `!Sync`; concurrent batch evaluations each get
//! their own context.
//!
//! Exported stubs:
//! - `kiln_context_set_error_msg(ctx, msg, len)`
//! - `kiln_context_arena_malloc(ctx, size) -> ptr` (null on failure)
//! - `kiln_context_has_error(ctx) -> bool`
//!

use std::alloc::Layout;
use std::cell::RefCell;

use crate::abi::StubSignature;
use crate::arena::Arena;
use crate::config::{LimitsConfig, RuntimeConfig};
use crate::handle;

pub const ALLOC_FAILED: &str = "Could not allocate memory for output string";

pub struct ExecutionContext {
    arena: Arena,
    error: RefCell<Option<String>>,
    limits: LimitsConfig,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::with_config(&RuntimeConfig::default())
    }

    pub fn with_config(config: &RuntimeConfig) -> Self {
        Self {
            arena: Arena::new(&config.arena),
            error: RefCell::new(None),
            limits: config.limits,
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Record an error. Only the first message since the last reset is kept.
    pub fn set_error(&self, message: impl Into<String>) {
        let mut slot = self.error.borrow_mut();
        let message = message.into();
        match slot.as_ref() {
            None => {
                tracing::debug!(error = %message, "execution context error");
                *slot = Some(message);
            }
            Some(first) => {
                tracing::trace!(first = %first, ignored = %message, "execution context already failed");
            }
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.borrow().is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    /// Clear the error and recycle the arena for the next batch.
    pub fn reset(&mut self) {
        self.error.get_mut().take();
        self.arena.reset();
    }

    /// Allocate an output buffer, recording an allocation failure on the context.
    #[allow(clippy::mut_from_ref)]
    pub fn allocate(&self, size: usize) -> Option<&mut [u8]> {
        let out = self.arena.allocate(size);
        if out.is_none() {
            self.set_error(ALLOC_FAILED);
        }
        out
    }

    /// Copy `data` into the arena. On allocation failure the error is recorded
    /// and the static empty slice is returned.
    pub fn copy(&self, data: &[u8]) -> &[u8] {
        if data.is_empty() {
            return &[];
        }
        match self.arena.copy(data) {
            Some(out) => out,
            None => {
                self.set_error(ALLOC_FAILED);
                &[]
            }
        }
    }

    /// Gather `parts` into one arena buffer.
    pub fn concat(&self, parts: &[&[u8]]) -> &[u8] {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        if total == 0 {
            return &[];
        }
        let Some(out) = self.allocate(total) else {
            return &[];
        };
        let mut offset = 0;
        for part in parts {
            out[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        out
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Record an error message on the context (first error wins)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_context_set_error_msg(context_ptr: i64, msg: *const u8, msg_len: i32) {
    unsafe {
        let ctx = handle::context(context_ptr);
        let msg = handle::bytes(msg, msg_len);
        ctx.set_error(String::from_utf8_lossy(msg));
    }
}

/// Allocate `size` bytes from the batch arena, 8-byte aligned; null on failure
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_context_arena_malloc(context_ptr: i64, size: i32) -> *mut u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let Ok(layout) = Layout::from_size_align(size.max(0) as usize, 8) else {
            ctx.set_error(ALLOC_FAILED);
            return std::ptr::null_mut();
        };
        match ctx.arena.allocate_layout(layout) {
            Some(ptr) => ptr.as_ptr(),
            None => {
                ctx.set_error(ALLOC_FAILED);
                std::ptr::null_mut()
            }
        }
    }
}

/// Whether an error has been recorded since the last reset
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_context_has_error(context_ptr: i64) -> bool {
    unsafe { handle::context(context_ptr).has_error() }
}

pub fn signatures() -> Vec<StubSignature> {
    vec![
        crate::stub!(kiln_context_set_error_msg, [I64, Ptr, I32]),
        crate::stub!(kiln_context_arena_malloc, [I64, I32] -> Ptr),
        crate::stub!(kiln_context_has_error, [I64] -> Bool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;

    #[test]
    fn test_first_error_wins() {
        let ctx = ExecutionContext::new();
        assert!(!ctx.has_error());
        ctx.set_error("first");
        ctx.set_error("second");
        assert_eq!(ctx.error().as_deref(), Some("first"));
    }

    #[test]
    fn test_reset_clears_error() {
        let mut ctx = ExecutionContext::new();
        ctx.set_error("boom");
        ctx.reset();
        assert!(!ctx.has_error());
        ctx.set_error("again");
        assert_eq!(ctx.error().as_deref(), Some("again"));
    }

    #[test]
    fn test_allocation_failure_sets_error() {
        let config = RuntimeConfig {
            arena: ArenaConfig { block_size: 128, capacity: 512 },
            ..Default::default()
        };
        let ctx = ExecutionContext::with_config(&config);
        assert!(ctx.allocate(1 << 20).is_none());
        assert_eq!(ctx.error().as_deref(), Some(ALLOC_FAILED));
        let big = vec![b'x'; 1 << 20];
        assert_eq!(ctx.copy(&big), b"");
    }

    #[test]
    fn test_concat() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.concat(&[b"ab", b"", b"cd"]), b"abcd");
        assert_eq!(ctx.concat(&[b"", b""]), b"");
    }

    #[test]
    fn test_stubs() {
        let ctx = ExecutionContext::new();
        let h = handle::to_handle(&ctx);
        unsafe {
            let p = kiln_context_arena_malloc(h, 24);
            assert!(!p.is_null());
            assert_eq!(p as usize % 8, 0);
            assert!(!kiln_context_has_error(h));
            let msg = b"bad row";
            kiln_context_set_error_msg(h, msg.as_ptr(), msg.len() as i32);
            assert!(kiln_context_has_error(h));
        }
        assert_eq!(ctx.error().as_deref(), Some("bad row"));
    }
}
