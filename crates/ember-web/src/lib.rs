#![cfg(target_arch = "wasm32")]
use ember_core::{Detector, DetectorParams, FieldParams, Layer, ParticleField, PlaybackState};
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod dom;
mod frame;
mod glow;
mod render;

const AUDIO_ID: &str = "audioPlayer";
const BUTTON_ID: &str = "playButton";
const BACK_CANVAS_ID: &str = "particleCanvas-back";
const FRONT_CANVAS_ID: &str = "particleCanvas-front";
const PLAYING_CLASS: &str = "playing";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("ember-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

fn canvases(
    document: &web::Document,
) -> anyhow::Result<(web::HtmlCanvasElement, web::HtmlCanvasElement)> {
    Ok((
        dom::element_by_id(document, BACK_CANVAS_ID)?,
        dom::element_by_id(document, FRONT_CANVAS_ID)?,
    ))
}

fn viewport_size(canvas: Option<&web::HtmlCanvasElement>) -> (u32, u32) {
    if let Some(c) = canvas {
        return (c.width(), c.height());
    }
    web::window()
        .map(|w| {
            let dim = |v: Result<JsValue, JsValue>| {
                v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0) as u32
            };
            (dim(w.inner_width()), dim(w.inner_height()))
        })
        .unwrap_or((1, 1))
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;

    let audio_el: web::HtmlAudioElement = dom::element_by_id(&document, AUDIO_ID)?;
    let button: web::HtmlElement = dom::element_by_id(&document, BUTTON_ID)?;

    // Sparks are optional; the player keeps working without them
    let canvases = match canvases(&document) {
        Ok(pair) => Some(pair),
        Err(e) => {
            log::error!("[init] {:?}; rendering disabled", e);
            None
        }
    };
    if let Some((back, front)) = canvases.as_ref() {
        dom::sync_canvas_backing_size(back);
        dom::sync_canvas_backing_size(front);
    }

    let field = Rc::new(RefCell::new(ParticleField::new(
        FieldParams::default(),
        StdRng::from_entropy(),
    )));
    {
        let (w, h) = viewport_size(canvases.as_ref().map(|(b, _)| b));
        field.borrow_mut().handle_resize(w, h);
    }

    {
        let canvases = canvases.clone();
        let field = field.clone();
        dom::add_event_listener(&window, "resize", move || {
            if let Some((back, front)) = canvases.as_ref() {
                dom::sync_canvas_backing_size(back);
                dom::sync_canvas_backing_size(front);
            }
            let (w, h) = viewport_size(canvases.as_ref().map(|(b, _)| b));
            field.borrow_mut().handle_resize(w, h);
        });
    }

    let detector = Rc::new(RefCell::new(Detector::new(DetectorParams::default())));
    {
        let field = field.clone();
        detector
            .borrow_mut()
            .on_beat(move |beat| field.borrow_mut().apply_beat(beat.peak));
    }

    // Context is created on the first click and reused for later resumes
    let audio_ctx: Rc<RefCell<Option<web::AudioContext>>> = Rc::new(RefCell::new(None));
    {
        let detector = detector.clone();
        let audio_el = audio_el.clone();
        let button_el = button.clone();
        dom::add_event_listener(&button, "click", move || {
            let slot = audio_ctx.clone();
            let el = audio_el.clone();
            let toggled = detector.borrow_mut().toggle(move |params| {
                let spectrum = audio::connect(&el, params)?;
                *slot.borrow_mut() = Some(spectrum.context().clone());
                Ok(spectrum)
            });
            match toggled {
                Ok(PlaybackState::Playing) => {
                    if let Some(ctx) = audio_ctx.borrow().as_ref() {
                        audio::resume_if_suspended(ctx);
                    }
                    audio::play(&audio_el);
                    dom::set_class(&button_el, PLAYING_CLASS, true);
                }
                Ok(_) => {
                    audio::pause(&audio_el);
                    dom::set_class(&button_el, PLAYING_CLASS, false);
                }
                Err(e) => log::error!("[audio] init failed: {}", e),
            }
        });
    }
    {
        let detector = detector.clone();
        let button_el = button.clone();
        dom::add_event_listener(&audio_el, "ended", move || {
            detector.borrow_mut().stop();
            dom::set_class(&button_el, PLAYING_CLASS, false);
        });
    }

    let gpu = match canvases.as_ref() {
        Some((back, front)) => {
            let (back_n, front_n) = {
                let f = field.borrow();
                (
                    f.layer_points(Layer::Back).len(),
                    f.layer_points(Layer::Front).len(),
                )
            };
            match render::GpuState::new(back, front, back_n, front_n).await {
                Ok(g) => Some(g),
                Err(e) => {
                    log::error!("[gpu] init failed: {:?}; rendering disabled", e);
                    None
                }
            }
        }
        None => None,
    };

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        detector,
        field,
        document,
        back_canvas: canvases.map(|(back, _)| back),
        gpu,
        last_report: Instant::now(),
        frames_since_report: 0,
    }));
    frame::start_loop(frame_ctx);
    log::info!("[init] ready");
    Ok(())
}
