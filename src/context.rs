// Copyright 2026 Parrot
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Scoped, branch-local logging context.
//!
//! Every execution branch (an OS thread, or an async task wrapped in
//! [`WithContext`]) carries its own [`ContextFrame`]: a mapping of ad hoc
//! key/value fields that the enricher attaches to every record emitted while
//! the frame is active. Frames are invisible across branches; concurrent
//! branches never observe each other's in-flight mutations.
//!
//! All mutation goes through the single merge-and-restore primitive
//! [`update_context`]. The scoped forms layer on top of it:
//!
//! - [`scope`] returns a [`ContextScope`] guard that restores the exact frame
//!   captured at entry when dropped. Drop runs on panic unwind too, so
//!   restoration cannot be skipped by an exceptional exit.
//! - [`with_scope`] is the closure convenience over [`scope`].
//! - [`scope_with_keys`] takes a fixed set of declared field names and an
//!   explicit caller-built map, and binds only the declared names present in
//!   the map. Undeclared keys never enter the context; declared names absent
//!   from the call are silently skipped.
//!
//! # Example
//!
//! ```rust
//! use otelog::context;
//!
//! let _outer = otelog::context::scope(context! { "request_id" => "abc" });
//! {
//!     let _inner = otelog::context::scope(context! { "user_id" => 42 });
//!     // records emitted here carry context.request_id and context.user_id
//! }
//! // user_id is gone again; request_id remains until _outer drops
//! ```
//!
//! # Async
//!
//! The store is thread-local. A future that suspends and resumes on a
//! different worker thread does not carry its frame along unless wrapped in
//! [`WithContext`], which installs the captured frame around every poll and
//! captures mutations back out afterwards. This is the documented propagation
//! strategy: frames follow the thread by default, and follow the task when the
//! future is wrapped.

use std::cell::RefCell;
use std::future::Future;
use std::mem::ManuallyDrop;
use std::pin::Pin;
use std::task::Poll;

/// The active mapping of contextual fields for one execution branch.
///
/// Values are JSON scalars in practice (strings, numbers, booleans), matching
/// what the output schema can carry under `attributes`.
pub type ContextFrame = serde_json::Map<String, serde_json::Value>;

thread_local! {
    static CURRENT: RefCell<ContextFrame> = RefCell::new(ContextFrame::new());
}

/// Build a [`ContextFrame`] from literal key/value pairs.
///
/// Values go through [`serde_json::json!`], so anything serializable works:
///
/// ```rust
/// use otelog::context;
///
/// let frame = context! { "user_id" => 42, "tenant" => "acme" };
/// assert_eq!(frame["user_id"], 42);
/// ```
#[macro_export]
macro_rules! context {
    ($($key:literal => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut frame = $crate::context::ContextFrame::new();
        $(frame.insert($key.to_string(), ::serde_json::json!($value));)*
        frame
    }};
}

/// Returns a copy of the frame currently active for the calling branch.
///
/// Empty if nothing was ever bound on this branch.
pub fn current_frame() -> ContextFrame {
    CURRENT.with(|current| current.borrow().clone())
}

/// Replaces the active frame for the calling branch.
pub fn set_current_frame(frame: ContextFrame) {
    CURRENT.with(|current| *current.borrow_mut() = frame);
}

/// Unconditionally resets the calling branch's frame to empty.
///
/// Does not merge or restore anything; meant for full resets, e.g. at the top
/// of a request handler or between tests.
pub fn clear_context() {
    set_current_frame(ContextFrame::new());
}

/// Merges `fields` into the current frame and returns the exact previous frame.
///
/// New keys are added, existing keys overwritten. The returned frame is the
/// caller's restoration value; the scoped forms below capture it so unwinding
/// puts it back verbatim. This is the only field-level mutation primitive.
pub fn update_context(fields: ContextFrame) -> ContextFrame {
    CURRENT.with(|current| {
        let mut frame = current.borrow_mut();
        let previous = frame.clone();
        for (key, value) in fields {
            frame.insert(key, value);
        }
        previous
    })
}

/// Guard that restores the frame captured at scope entry when dropped.
///
/// Returned by [`scope`] and [`scope_with_keys`]. Each guard restores its own
/// entry-time frame, not whatever is active at exit, so interleaved nested
/// scopes each unwind to their correct enclosing state (strict LIFO within a
/// branch when guards drop in declaration order).
#[must_use = "the context binding is reverted as soon as this guard is dropped"]
#[derive(Debug)]
pub struct ContextScope {
    previous: Option<ContextFrame>,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            set_current_frame(previous);
        }
    }
}

/// Binds `fields` into the current frame for the lifetime of the returned guard.
pub fn scope(fields: ContextFrame) -> ContextScope {
    ContextScope {
        previous: Some(update_context(fields)),
    }
}

/// Runs `f` with `fields` bound into the current frame, restoring afterwards.
///
/// Restoration happens on every exit path, including panic unwind.
pub fn with_scope<T>(fields: ContextFrame, f: impl FnOnce() -> T) -> T {
    let _guard = scope(fields);
    f()
}

/// Binds only the declared `keys` found in `call_fields`, for the guard's lifetime.
///
/// The explicit-map replacement for argument-introspecting decorators: the
/// declared key set is fixed at the wrapping site, the field map is built by
/// the caller per call. Declared keys missing from `call_fields` are skipped,
/// and keys present in `call_fields` but not declared never reach the context.
pub fn scope_with_keys(keys: &[&str], call_fields: &ContextFrame) -> ContextScope {
    let mut selected = ContextFrame::new();
    for key in keys {
        if let Some(value) = call_fields.get(*key) {
            selected.insert((*key).to_string(), value.clone());
        }
    }
    scope(selected)
}

/// A [`Future`] wrapper that carries a [`ContextFrame`] across poll boundaries.
///
/// Work-stealing executors resume a task on whichever worker thread is free,
/// and the thread-local frame does not follow. `WithContext` saves the polling
/// thread's frame, installs the task's own frame, polls the inner future, then
/// captures the (possibly mutated) task frame back out and restores the
/// thread's prior frame. The task therefore observes one coherent frame across
/// its whole lifetime, and the worker threads observe none of it.
///
/// The swap-back runs from a drop guard, so it happens even when the inner
/// future panics mid-poll (runtimes like tokio catch task panics and keep the
/// worker thread alive). Dropping a `WithContext` mid-flight likewise installs
/// the task frame around the inner future's drop, so [`ContextScope`] guards
/// still alive inside it unwind against the task's frame, not the dropping
/// thread's.
///
/// ```rust
/// use otelog::context::{self, WithContext};
///
/// # async fn handle_request() {}
/// # async fn example() {
/// let task = WithContext::new(
///     otelog::context! { "request_id" => "abc" },
///     handle_request(),
/// );
/// task.await;
/// # }
/// ```
#[derive(Debug)]
pub struct WithContext<F> {
    frame: ContextFrame,
    inner: ManuallyDrop<F>,
}

impl<F> WithContext<F> {
    /// Wraps `inner` so that `frame` is active whenever it is polled.
    pub fn new(frame: ContextFrame, inner: F) -> Self {
        Self {
            frame,
            inner: ManuallyDrop::new(inner),
        }
    }

    /// Wraps `inner` with a copy of the calling branch's current frame.
    ///
    /// The usual spawn-side call: capture here, then hand the wrapped future
    /// to the executor.
    pub fn inherit(inner: F) -> Self {
        Self::new(current_frame(), inner)
    }
}

/// Swaps the task frame back out and reinstalls the thread's frame on drop,
/// so an unwinding poll cannot leave task fields in the worker's thread-local.
struct FrameSwap<'a> {
    task_frame: &'a mut ContextFrame,
    thread_frame: ContextFrame,
}

impl Drop for FrameSwap<'_> {
    fn drop(&mut self) {
        *self.task_frame = current_frame();
        set_current_frame(std::mem::take(&mut self.thread_frame));
    }
}

impl<F> Future for WithContext<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        // Safety: `frame` is never pinned; `inner` is structurally pinned and
        // never moved out of.
        let this = unsafe { self.get_unchecked_mut() };
        let inner = unsafe { Pin::new_unchecked(&mut *this.inner) };

        let thread_frame = current_frame();
        set_current_frame(std::mem::take(&mut this.frame));
        let _restore = FrameSwap {
            task_frame: &mut this.frame,
            thread_frame,
        };
        inner.poll(cx)
    }
}

impl<F> Drop for WithContext<F> {
    fn drop(&mut self) {
        let thread_frame = current_frame();
        set_current_frame(std::mem::take(&mut self.frame));
        let _restore = FrameSwap {
            task_frame: &mut self.frame,
            thread_frame,
        };
        // Safety: `inner` is dropped in place exactly once, with the task
        // frame installed so any scope guards still alive inside it unwind
        // against the task's frame.
        unsafe { ManuallyDrop::drop(&mut self.inner) };
    }
}
