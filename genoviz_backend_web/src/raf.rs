// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` driver for chart transitions.
//!
//! [`AnimationLoop`] calls its callback once per animation frame with the
//! frame's [`DOMHighResTimeStamp`][mdn] converted to [`HostTime`]. The
//! callback returns whether another frame is wanted, which is exactly what
//! `Chart::advance` reports, so the loop goes idle once transitions settle.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use genoviz_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window/Performance objects are fetched (and unwrapped) every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// A `requestAnimationFrame` loop that runs while its callback asks for
/// more frames.
///
/// Create with [`AnimationLoop::new`], then call [`start`](Self::start)
/// whenever a chart begins a transition. Starting a running loop is a no-op.
pub struct AnimationLoop {
    inner: Rc<LoopInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct LoopInner {
    /// The JS closure registered with `requestAnimationFrame`.
    closure: RefCell<Option<RafClosure>>,
    callback: RefCell<Box<dyn FnMut(HostTime) -> bool>>,
    frames: Cell<u64>,
    running: Cell<bool>,
    /// ID of the pending `requestAnimationFrame` call.
    raf_id: Cell<i32>,
}

impl AnimationLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(HostTime) -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frames: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Requests frames until the callback returns `false` or
    /// [`stop`](Self::stop) is called.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
                if !inner.running.get() {
                    return;
                }
                inner.frames.set(inner.frames.get() + 1);

                let more = inner.callback.borrow_mut()(HostTime::from_millis_f64(timestamp_ms));
                if !more {
                    inner.running.set(false);
                    return;
                }

                if inner.running.get()
                    && let Some(ref closure) = *inner.closure.borrow()
                {
                    let id = request_animation_frame(closure.as_ref().unchecked_ref());
                    inner.raf_id.set(id);
                }
            }) as Box<dyn FnMut(f64)>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
        }
    }

    /// Stops the loop, cancelling the pending frame.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Returns `true` while frames are being requested.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Returns how many frames the callback has seen.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an `Rc` to `inner`; dropping it breaks the cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for AnimationLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnimationLoop")
            .field("running", &self.inner.running.get())
            .field("frames", &self.inner.frames.get())
            .finish_non_exhaustive()
    }
}
