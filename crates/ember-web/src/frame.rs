use crate::audio::AnalyserSpectrum;
use crate::glow;
use crate::render::GpuState;
use ember_core::{Detector, ParticleField};
use instant::Instant;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

const REPORT_INTERVAL_SECS: f32 = 5.0;

pub struct FrameContext {
    pub detector: Rc<RefCell<Detector<AnalyserSpectrum>>>,
    pub field: Rc<RefCell<ParticleField<StdRng>>>,

    pub document: web::Document,
    pub back_canvas: Option<web::HtmlCanvasElement>,
    pub gpu: Option<GpuState>,

    pub last_report: Instant,
    pub frames_since_report: u32,
}

impl FrameContext {
    pub fn frame(&mut self) {
        // the beat listener borrows the field, so tick before touching it
        self.detector.borrow_mut().tick();
        let bass = self.detector.borrow().current_bass();

        {
            let mut field = self.field.borrow_mut();
            match (self.gpu.as_mut(), self.back_canvas.as_ref()) {
                (Some(gpu), Some(canvas)) => {
                    gpu.resize_if_needed(canvas.width(), canvas.height());
                    field.tick(bass, gpu);
                }
                _ => field.update(bass),
            }
        }

        glow::apply(&self.document, bass);
        self.report();
    }

    fn report(&mut self) {
        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed < REPORT_INTERVAL_SECS {
            return;
        }
        let field = self.field.borrow();
        log::debug!(
            "[frame] fps={:.1} active={}/{} bass={:.2} state={:?}",
            self.frames_since_report as f32 / elapsed,
            field.active_count(),
            field.pool_size(),
            self.detector.borrow().current_bass(),
            self.detector.borrow().state()
        );
        self.last_report = Instant::now();
        self.frames_since_report = 0;
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(window: &web::Window, tick: &FrameCallback) {
    if let Some(cb) = tick.borrow().as_ref() {
        if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            log::error!("requestAnimationFrame error: {:?}", e);
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: FrameCallback = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx_tick.borrow_mut().frame();
        if let Some(w) = web::window() {
            request_frame(&w, &tick_clone);
        }
    }) as Box<dyn FnMut()>));
    if let Some(w) = web::window() {
        request_frame(&w, &tick);
    }
}
