use ember_core::{DetectorParams, EmberError, SpectrumSource};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

/// Analyser tapped between the media element and the speakers.
pub struct AnalyserSpectrum {
    ctx: web::AudioContext,
    analyser: web::AnalyserNode,
    _source: web::MediaElementAudioSourceNode,
}

impl AnalyserSpectrum {
    pub fn context(&self) -> &web::AudioContext {
        &self.ctx
    }
}

impl SpectrumSource for AnalyserSpectrum {
    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn read_bytes(&mut self, out: &mut [u8]) {
        self.analyser.get_byte_frequency_data(out);
    }
}

/// Route `element` -> analyser -> destination.
///
/// Must run inside a user gesture; browsers keep the context suspended otherwise.
/// A failed attempt closes its context. An element binds to one source node for
/// life, so only failures before `create_media_element_source` succeeds can be
/// retried.
pub fn connect(
    element: &web::HtmlAudioElement,
    params: &DetectorParams,
) -> Result<AnalyserSpectrum, EmberError> {
    let ctx = web::AudioContext::new().map_err(|e| EmberError::AudioInit(format!("{:?}", e)))?;
    match wire(&ctx, element, params) {
        Ok((analyser, source)) => {
            log::info!(
                "[audio] analyser fft={} bins={}",
                params.fft_size,
                analyser.frequency_bin_count()
            );
            Ok(AnalyserSpectrum {
                ctx,
                analyser,
                _source: source,
            })
        }
        Err(e) => {
            if let Ok(p) = ctx.close() {
                watch("close", p);
            }
            Err(e)
        }
    }
}

fn wire(
    ctx: &web::AudioContext,
    element: &web::HtmlAudioElement,
    params: &DetectorParams,
) -> Result<(web::AnalyserNode, web::MediaElementAudioSourceNode), EmberError> {
    let analyser = ctx
        .create_analyser()
        .map_err(|e| EmberError::Analyser(format!("{:?}", e)))?;
    analyser.set_fft_size(params.fft_size);
    analyser.set_smoothing_time_constant(params.smoothing);

    let source = ctx
        .create_media_element_source(element)
        .map_err(|e| EmberError::MediaElement(format!("{:?}", e)))?;
    source
        .connect_with_audio_node(&analyser)
        .map_err(|e| EmberError::Analyser(format!("{:?}", e)))?;
    analyser
        .connect_with_audio_node(&ctx.destination())
        .map_err(|e| EmberError::Analyser(format!("{:?}", e)))?;
    Ok((analyser, source))
}

fn watch(label: &'static str, promise: js_sys::Promise) {
    spawn_local(async move {
        if let Err(e) = JsFuture::from(promise).await {
            log::warn!("[audio] {} rejected: {:?}", label, e);
        }
    });
}

pub fn resume_if_suspended(ctx: &web::AudioContext) {
    if ctx.state() == web::AudioContextState::Suspended {
        if let Ok(p) = ctx.resume() {
            watch("resume", p);
        }
    }
}

pub fn play(element: &web::HtmlAudioElement) {
    match element.play() {
        Ok(p) => watch("play", p),
        Err(e) => log::error!("[audio] play error: {:?}", e),
    }
}

pub fn pause(element: &web::HtmlAudioElement) {
    if let Err(e) = element.pause() {
        log::error!("[audio] pause error: {:?}", e);
    }
}
