use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::window;

type FrameCallback = Closure<dyn FnMut(f64)>;

struct Shared {
    handle: Cell<Option<i32>>,
    running: Cell<bool>,
    // The closure reschedules itself through a `Weak`, so dropping the
    // `FrameLoop` frees it instead of leaking a cycle.
    callback: RefCell<Option<FrameCallback>>,
}

impl Shared {
    fn schedule(&self) -> Result<(), JsValue> {
        let window = window().ok_or("no window")?;
        let callback = self.callback.borrow();
        let callback = callback.as_ref().ok_or("frame callback released")?;
        let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.handle.set(Some(id));
        Ok(())
    }
}

/// A `requestAnimationFrame` loop calling `tick` once per display refresh
/// until cancelled or dropped.
pub struct FrameLoop {
    shared: Rc<Shared>,
}

impl FrameLoop {
    pub fn start(mut tick: impl FnMut(f64) + 'static) -> Result<Self, JsValue> {
        let shared = Rc::new(Shared {
            handle: Cell::new(None),
            running: Cell::new(false),
            callback: RefCell::new(None),
        });
        let weak: Weak<Shared> = Rc::downgrade(&shared);
        *shared.callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared.handle.set(None);
            if !shared.running.get() {
                return;
            }
            tick(timestamp);
            // schedule next
            if shared.running.get() {
                if let Err(e) = shared.schedule() {
                    log::error!("frame loop stopped: {:?}", e);
                    shared.running.set(false);
                }
            }
        }) as Box<dyn FnMut(f64)>));

        let frame = Self { shared };
        frame.resume()?;
        Ok(frame)
    }

    /// Restart a cancelled loop. No-op while running.
    pub fn resume(&self) -> Result<(), JsValue> {
        if self.shared.running.get() && self.shared.handle.get().is_some() {
            return Ok(());
        }
        self.shared.running.set(true);
        self.shared.schedule()
    }

    pub fn cancel(&self) {
        self.shared.running.set(false);
        if let Some(id) = self.shared.handle.take() {
            if let Some(window) = window() {
                window.cancel_animation_frame(id).ok();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
        self.shared.callback.borrow_mut().take();
    }
}
