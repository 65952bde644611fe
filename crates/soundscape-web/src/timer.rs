use crate::backend::WebBackend;
use instant::Instant;
use soundscape_core::Session;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Repeating `setInterval` that feeds elapsed time to the session scheduler.
/// Dropping it clears the interval.
pub struct ControlTimer {
    window: web::Window,
    handle: i32,
    _closure: Closure<dyn FnMut()>,
}

impl ControlTimer {
    pub fn start(session: Rc<RefCell<Session<WebBackend>>>, period_ms: i32) -> anyhow::Result<Self> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let mut last = Instant::now();
        let closure = Closure::wrap(Box::new(move || {
            let now = Instant::now();
            let dt = now - last;
            last = now;
            if let Ok(mut s) = session.try_borrow_mut() {
                s.advance(dt);
            }
        }) as Box<dyn FnMut()>);
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms,
            )
            .map_err(|e| anyhow::anyhow!("setInterval: {:?}", e))?;
        log::info!("[timer] control interval {}ms", period_ms);
        Ok(Self {
            window,
            handle,
            _closure: closure,
        })
    }
}

impl Drop for ControlTimer {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.handle);
    }
}
