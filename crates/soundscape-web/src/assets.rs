//! Fetch and decode audio assets into WebAudio buffers.

use anyhow::anyhow;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub async fn fetch_audio(ctx: &web::AudioContext, url: &str) -> anyhow::Result<web::AudioBuffer> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let resp: web::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| anyhow!("fetch {}: {:?}", url, e))?
        .dyn_into()
        .map_err(|e| anyhow!("fetch {}: not a Response: {:?}", url, e))?;
    if !resp.ok() {
        anyhow::bail!("fetch {}: HTTP {}", url, resp.status());
    }
    let bytes: js_sys::ArrayBuffer = JsFuture::from(
        resp.array_buffer()
            .map_err(|e| anyhow!("read {}: {:?}", url, e))?,
    )
    .await
    .map_err(|e| anyhow!("read {}: {:?}", url, e))?
    .dyn_into()
    .map_err(|e| anyhow!("read {}: not an ArrayBuffer: {:?}", url, e))?;
    let decoded = JsFuture::from(
        ctx.decode_audio_data(&bytes)
            .map_err(|e| anyhow!("decode {}: {:?}", url, e))?,
    )
    .await
    .map_err(|e| anyhow!("decode {}: {:?}", url, e))?;
    decoded
        .dyn_into::<web::AudioBuffer>()
        .map_err(|e| anyhow!("decode {}: not an AudioBuffer: {:?}", url, e))
}
