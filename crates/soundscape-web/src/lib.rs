#![cfg(target_arch = "wasm32")]
use soundscape_core::{AssetError, AssetKind, Session, SessionConfig};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod assets;
mod backend;
mod constants;
mod dom;
mod events;
mod timer;

use backend::WebBackend;
use constants::*;

struct App {
    _session: Rc<RefCell<Session<WebBackend>>>,
    _timer: timer::ControlTimer,
}

thread_local! {
    // Lives for the page lifetime; the timer is cleared only if this is dropped
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("soundscape-web starting");

    static STARTED: AtomicBool = AtomicBool::new(false);
    if STARTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    if let Err(e) = init() {
        log::error!("init error: {:?}", e);
    }
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let surface = dom::surface_element(&document, SURFACE_ELEMENT_ID)?;

    let backend = WebBackend::new()?;
    let ctx = backend.context().clone();
    let session = Session::new(backend, SessionConfig::default())
        .map_err(|e| anyhow::anyhow!("session: {}", e))?;
    let session = Rc::new(RefCell::new(session));

    // Wind starts silent right away; the context leaves suspension on the first gesture
    session
        .borrow_mut()
        .start()
        .map_err(|e| anyhow::anyhow!("wind: {}", e))?;

    let pointer = session.borrow().pointer();
    events::wire_input_handlers(events::InputWiring {
        surface,
        pointer,
        session: session.clone(),
    });

    let timer = timer::ControlTimer::start(session.clone(), CONTROL_TIMER_MS)?;

    load_asset(ctx.clone(), session.clone(), AssetKind::ImpulseResponse, IMPULSE_RESPONSE_URL);
    load_asset(ctx, session.clone(), AssetKind::Sample, SAMPLE_URL);

    APP.with(|app| {
        *app.borrow_mut() = Some(App {
            _session: session,
            _timer: timer,
        });
    });
    Ok(())
}

fn load_asset(
    ctx: web_sys::AudioContext,
    session: Rc<RefCell<Session<WebBackend>>>,
    kind: AssetKind,
    url: &'static str,
) {
    spawn_local(async move {
        match assets::fetch_audio(&ctx, url).await {
            Ok(buffer) => {
                log::info!("[assets] {} loaded from {}", kind, url);
                let mut s = session.borrow_mut();
                // failures are logged by the session
                _ = match kind {
                    AssetKind::ImpulseResponse => s.attach_impulse_response(buffer),
                    AssetKind::Sample => s.attach_sample(buffer),
                };
            }
            Err(e) => session.borrow().asset_failed(&AssetError::Decode {
                asset: kind,
                reason: e.to_string(),
            }),
        }
    });
}
