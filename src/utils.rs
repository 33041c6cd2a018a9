use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(d: Duration) {
    tokio::time::sleep(d).await;
}

#[cfg(target_arch = "wasm32")]
pub async fn sleep(d: Duration) {
    let Some(window) = web_sys::window() else {
        log::warn!("no window to set a timeout on");
        return;
    };

    let mut cb = |resolve: js_sys::Function, _| {
        let res = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            &resolve,
            d.as_millis().try_into().unwrap_or(i32::MAX),
        );
        if res.is_err() {
            log::warn!("could not set a timeout");
        }
    };

    let fut = js_sys::Promise::new(&mut cb);
    if wasm_bindgen_futures::JsFuture::from(fut).await.is_err() {
        log::warn!("timeout promise rejected");
    }
}
