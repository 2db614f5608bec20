use wasm_bindgen::JsCast;
use web_sys as web;

const ALBUM_ART_ID: &str = "albumArt";

/// Drive the album-art halo from the smoothed bass level in \[0, 1\].
/// Missing element is a no-op.
pub fn apply(document: &web::Document, level: f32) {
    let Some(el) = document
        .get_element_by_id(ALBUM_ART_ID)
        .and_then(|e| e.dyn_into::<web::HtmlElement>().ok())
    else {
        return;
    };
    let level = level.clamp(0.0, 1.0);
    let blur = 10.0 + 50.0 * level;
    let alpha = 0.2 + 0.6 * level;
    let shadow = format!(
        "0 0 {:.0}px rgba(255, 80, 20, {:.2}), 0 0 {:.0}px rgba(255, 160, 60, {:.2})",
        blur,
        alpha,
        blur * 2.0,
        alpha * 0.5
    );
    let style = el.style();
    _ = style.set_property("box-shadow", &shadow);
    _ = style.set_property("filter", &format!("brightness({:.2})", 1.0 + 0.3 * level));
}
