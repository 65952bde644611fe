use crate::backend::WebBackend;
use soundscape_core::{AudioBackend, PointerCell, PointerState, Session, SurfaceRect};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[derive(Clone)]
pub struct InputWiring {
    pub surface: web::Element,
    pub pointer: Arc<PointerCell>,
    pub session: Rc<RefCell<Session<WebBackend>>>,
}

pub fn wire_input_handlers(w: InputWiring) {
    wire_pointer_move(&w);
    wire_pointer_leave(&w);
    wire_click(&w);
}

#[inline]
fn surface_rect(el: &web::Element) -> SurfaceRect {
    let rect = el.get_bounding_client_rect();
    SurfaceRect {
        left: rect.left() as f32,
        top: rect.top() as f32,
        width: rect.width() as f32,
        height: rect.height() as f32,
    }
}

fn add_listener(target: &web::Element, event: &str, closure: Closure<dyn FnMut(web::MouseEvent)>) {
    _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_pointer_move(w: &InputWiring) {
    let w = w.clone();
    let surface = w.surface.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::MouseEvent| {
        let state = PointerState::from_surface(
            ev.client_x() as f32,
            ev.client_y() as f32,
            surface_rect(&w.surface),
        );
        w.pointer.store(state);
        if let Ok(s) = w.session.try_borrow() {
            if !s.backend().is_running() {
                _ = s.backend().resume();
            }
        }
    }) as Box<dyn FnMut(_)>);
    add_listener(&surface, "mousemove", closure);
}

fn wire_pointer_leave(w: &InputWiring) {
    let pointer = w.pointer.clone();
    let closure = Closure::wrap(Box::new(move |_ev: web::MouseEvent| {
        pointer.clear();
    }) as Box<dyn FnMut(_)>);
    add_listener(&w.surface, "mouseleave", closure);
}

fn wire_click(w: &InputWiring) {
    let session = w.session.clone();
    let closure = Closure::wrap(Box::new(move |_ev: web::MouseEvent| {
        match session.try_borrow_mut() {
            Ok(mut s) => {
                let id = s.trigger_note();
                log::debug!("[click] voice {}", id.0);
            }
            Err(_) => log::warn!("[click] session busy; note dropped"),
        }
    }) as Box<dyn FnMut(_)>);
    add_listener(&w.surface, "click", closure);
}
