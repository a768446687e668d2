//! `requestAnimationFrame` as a [`FrameScheduler`].

use std::future::Future;

use futures::channel::oneshot;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use crate::scroll::FrameScheduler;

use super::js_error;

#[derive(Clone, Debug)]
pub struct AnimationFrames {
    window: Window,
}

impl AnimationFrames {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl FrameScheduler for AnimationFrames {
    fn next_frame(&self) -> impl Future<Output = ()> {
        let (tx, rx) = oneshot::channel::<()>();
        let callback = Closure::once(move |_timestamp: f64| {
            if tx.send(()).is_err() {
                debug!("animation frame fired after its waiter was dropped");
            }
        });
        let scheduled = self.window.request_animation_frame(callback.as_ref().unchecked_ref());

        async move {
            match scheduled {
                Ok(_handle) => {
                    if rx.await.is_err() {
                        debug!("animation frame cancelled");
                    }
                }
                // Without rAF there is nothing to wait for; continue immediately.
                Err(e) => warn!("requestAnimationFrame failed: {}", js_error(&e)),
            }
            drop(callback);
        }
    }
}
