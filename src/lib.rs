// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

use model::{ModelRegistry, Scene};
use utils::MeshBuffer;

/// Upload the meshes every scene instance may refer to
pub fn register_models(device: &wgpu::Device) -> ModelRegistry<MeshBuffer> {
    let mut registry = ModelRegistry::new();
    registry.register("cube", utils::create_cube_mesh().upload(device, "cube"));
    registry
}

/// The scene shown at startup
pub fn initial_scene() -> Scene {
    Scene::cube_field()
}

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tracing::{error, info, warn};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, Window};

    use crate::config::SimConfig;
    use crate::controller::input::wasm::key_name;
    use crate::controller::{FrameLoop, InputEvent, InputProcessor, InputState};
    use crate::model::SimulationState;
    use crate::ui::{self, HudInfo};
    use crate::view::{DrawStats, GpuContext, RenderState};
    use crate::logging;

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();
        let (window, document, canvas) = init_canvas()?;
        setup_app(&window, &document, &canvas).await
    }

    /// Main application setup for WASM
    async fn setup_app(window: &Window, document: &Document, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
        let width = canvas.width();
        let height = canvas.height();

        // Missing WebGPU/WebGL support is fatal, the frame loop never starts
        let mut gpu = GpuContext::new(canvas, width, height)
            .await
            .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

        let registry = crate::register_models(gpu.device.as_ref());
        let scene = crate::initial_scene();
        let mut render_state = RenderState::new(gpu.device.as_ref(), gpu.format, width, height, registry, scene.len());

        let mut frame_loop = FrameLoop::new(SimConfig::default(), width, height);
        let input_state = Rc::new(RefCell::new(InputState::new()));
        let mut state = SimulationState::new();
        let egui_ctx = egui::Context::default();
        let mut last_stats = DrawStats::default();
        let mut last_time = now_ms(window);

        setup_input_listeners(document, window, canvas, input_state.clone())?;
        info!(instances = scene.len(), "starting frame loop");

        let f = RcCellCallback::new(window.clone(), {
            let window = window.clone();
            let canvas = canvas.clone();

            move || {
                let now = now_ms(&window);
                let dt_ms = now - last_time;
                last_time = now;

                handle_resize(&window, &canvas, &mut gpu, &mut render_state, &mut frame_loop);

                let frame = frame_loop.step(&mut state, &mut input_state.borrow_mut(), dt_ms);

                let mut raw_input = egui::RawInput::default();
                raw_input.time = Some(now / 1000.0);
                raw_input.screen_rect = Some(egui::Rect::from_min_size(
                    egui::Pos2::ZERO,
                    egui::vec2(render_state.width as f32, render_state.height as f32),
                ));
                let hud = HudInfo {
                    state: &state,
                    stats: last_stats,
                    pointer_attached: input_state.borrow().pointer_attached(),
                    dt_ms: frame.dt_ms,
                };
                let full_output = ui::build_ui(&egui_ctx, raw_input, &hud);
                let (overlay, _) = ui::into_overlay(&egui_ctx, full_output);

                match render_state.draw_frame(
                    gpu.device.as_ref(),
                    gpu.queue.as_ref(),
                    &gpu.surface,
                    scene.instances(),
                    &frame,
                    Some(overlay),
                ) {
                    Ok(stats) => last_stats = stats,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (w, h) = (gpu.config.width, gpu.config.height);
                        gpu.resize(w, h);
                    }
                    Err(e) => warn!("surface error: {e:?}"),
                }
            }
        });
        f.start();

        Ok(())
    }

    fn now_ms(window: &Window) -> f64 {
        window.performance().map(|p| p.now()).unwrap_or(0.0)
    }

    fn handle_resize(
        window: &Window,
        canvas: &HtmlCanvasElement,
        gpu: &mut GpuContext,
        render_state: &mut RenderState,
        frame_loop: &mut FrameLoop,
    ) {
        let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) else {
            return;
        };
        let nw = w.as_f64().unwrap_or(800.0) as u32;
        let nh = h.as_f64().unwrap_or(600.0) as u32;
        if nw == 0 || nh == 0 || (nw == render_state.width && nh == render_state.height) {
            return;
        }
        canvas.set_width(nw);
        canvas.set_height(nh);
        gpu.resize(nw, nh);
        render_state.resize(gpu.device.as_ref(), nw, nh);
        frame_loop.resize(nw, nh);
    }

    /// Setup all input event listeners with platform-agnostic abstractions
    fn setup_input_listeners(
        document: &Document,
        window: &Window,
        canvas: &HtmlCanvasElement,
        input_state: Rc<RefCell<InputState>>,
    ) -> Result<(), JsValue> {
        let input_processor = InputProcessor::default();

        // Keyboard down
        {
            let input_state = input_state.clone();
            let input_processor = input_processor.clone();
            let document_for_exit = document.clone();
            let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                let key = key_name(&e);
                if input_processor.is_release_pointer(&key) {
                    document_for_exit.exit_pointer_lock();
                } else if let Some(event) = input_processor.key_event(&key, true) {
                    input_state.borrow_mut().process_event(&event);
                    e.prevent_default();
                }
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
            keydown.forget();
        }

        // Keyboard up
        {
            let input_state = input_state.clone();
            let input_processor = input_processor.clone();
            let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                if let Some(event) = input_processor.key_event(&key_name(&e), false) {
                    input_state.borrow_mut().process_event(&event);
                }
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
            keyup.forget();
        }

        // Focus loss and visibility change - release all keys
        let focus_targets: [(&EventTarget, &str); 2] = [(window.as_ref(), "blur"), (document.as_ref(), "visibilitychange")];
        for (target, name) in focus_targets {
            let input_state = input_state.clone();
            let cb = Closure::wrap(Box::new(move |_e: Event| {
                input_state.borrow_mut().process_event(&InputEvent::FocusLost);
            }) as Box<dyn FnMut(Event)>);
            target.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref())?;
            cb.forget();
        }

        // Pointer lock change attaches or detaches the mouse
        {
            let input_state = input_state.clone();
            let doc_pl = document.clone();
            let plc = Closure::wrap(Box::new(move |_e: Event| {
                let locked = doc_pl.pointer_lock_element().is_some();
                input_state.borrow_mut().process_event(&InputEvent::PointerLockChanged { locked });
            }) as Box<dyn FnMut(Event)>);
            document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
            plc.forget();
        }

        // Canvas click to enter pointer lock
        {
            let canvas_click = canvas.clone();
            let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
                if let Ok(html_el) = canvas_click.clone().dyn_into::<HtmlElement>() {
                    html_el.request_pointer_lock();
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
            click.forget();
        }

        // Mouse move
        {
            let input_state = input_state.clone();
            let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
                let event = InputEvent::MouseMove { dx: e.movement_x() as f32, dy: e.movement_y() as f32 };
                input_state.borrow_mut().process_event(&event);
            }) as Box<dyn FnMut(MouseEvent)>);
            document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
            mm.forget();
        }

        Ok(())
    }

    fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;
        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        let width = window.inner_width()?.as_f64().unwrap_or(800.0) as u32;
        let height = window.inner_height()?.as_f64().unwrap_or(600.0) as u32;
        canvas_el.set_width(width.max(1));
        canvas_el.set_height(height.max(1));
        body.append_child(&canvas_el)?;
        Ok((window, document, canvas_el))
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    /// Drives a closure from requestAnimationFrame until the page goes away
    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Schedule next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        error!("requestAnimationFrame failed: {e:?}");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    error!("requestAnimationFrame failed to start: {e:?}");
                }
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
        }
    }
}
