use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

// Import from the library crate
use cubeflight::{
    config::SimConfig,
    error::InitError,
    logging, ui,
    model::{Scene, SimulationState},
    view::{DrawStats, GpuContext, RenderState},
    controller::{input::native::key_name, FrameLoop, InputEvent, InputProcessor, InputState},
};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    size: winit::dpi::PhysicalSize<u32>,

    // Rendering state
    render_state: RenderState,
    scene: Scene,
    last_stats: DrawStats,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Flight state
    frame_loop: FrameLoop,
    state: SimulationState,
    input_state: InputState,
    input_processor: InputProcessor,

    last_frame_time: Instant,
}

impl App {
    async fn new(window: Arc<Window>) -> Result<Self, InitError> {
        let size = window.inner_size();
        let gpu = GpuContext::new_native(window.clone(), size.width, size.height).await?;

        let registry = cubeflight::register_models(gpu.device.as_ref());
        let scene = cubeflight::initial_scene();
        let render_state = RenderState::new(gpu.device.as_ref(), gpu.format, size.width, size.height, registry, scene.len());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        info!(instances = scene.len(), width = size.width, height = size.height, "app initialised");

        Ok(Self {
            frame_loop: FrameLoop::new(SimConfig::default(), size.width, size.height),
            window,
            gpu,
            size,
            render_state,
            scene,
            last_stats: DrawStats::default(),
            egui_state,
            egui_ctx,
            state: SimulationState::new(),
            input_state: InputState::new(),
            input_processor: InputProcessor::default(),
            last_frame_time: Instant::now(),
        })
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // First let egui process the event
        if self.egui_state.on_window_event(self.window.as_ref(), event).consumed {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key: PhysicalKey::Code(code), .. }, .. } => {
                let Some(name) = key_name(*code) else {
                    return false;
                };
                let pressed = *state == ElementState::Pressed;
                if self.input_processor.is_release_pointer(name) {
                    if pressed {
                        self.set_pointer_lock(false);
                    }
                } else if let Some(event) = self.input_processor.key_event(name, pressed) {
                    self.input_state.process_event(&event);
                }
                true
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if !self.input_state.pointer_attached() {
                    self.set_pointer_lock(true);
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.input_state.process_event(&InputEvent::FocusLost);
                self.set_pointer_lock(false);
                true
            }
            _ => false,
        }
    }

    /// Grab or release the cursor and tell the input state about it
    fn set_pointer_lock(&mut self, locked: bool) {
        if locked {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                warn!("cursor grab failed: {e}");
                return;
            }
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
        self.window.set_cursor_visible(!locked);
        self.input_state.process_event(&InputEvent::PointerLockChanged { locked });
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.input_state.process_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.gpu.resize(new_size.width, new_size.height);
            self.render_state.resize(self.gpu.device.as_ref(), new_size.width, new_size.height);
            self.frame_loop.resize(new_size.width, new_size.height);
        }
    }

    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt_ms = (now - self.last_frame_time).as_secs_f64() * 1000.0;
        self.last_frame_time = now;

        let frame = self.frame_loop.step(&mut self.state, &mut self.input_state, dt_ms);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let hud = ui::HudInfo {
            state: &self.state,
            stats: self.last_stats,
            pointer_attached: self.input_state.pointer_attached(),
            dt_ms: frame.dt_ms,
        };
        let full_output = ui::build_ui(&self.egui_ctx, raw_input, &hud);
        let (overlay, platform_output) = ui::into_overlay(&self.egui_ctx, full_output);
        self.egui_state.handle_platform_output(&self.window, platform_output);

        self.last_stats = self.render_state.draw_frame(
            self.gpu.device.as_ref(),
            self.gpu.queue.as_ref(),
            &self.gpu.surface,
            self.scene.instances(),
            &frame,
            Some(overlay),
        )?;
        Ok(())
    }
}

fn main() {
    logging::init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    let window_attributes = Window::default_attributes()
        .with_title("cubeflight")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = match event_loop.create_window(window_attributes) {
        Ok(window) => Arc::new(window),
        Err(e) => {
            error!("failed to create window: {e}");
            std::process::exit(1);
        }
    };

    // No rendering context means no frame loop
    let mut app = match pollster::block_on(App::new(window)) {
        Ok(app) => app,
        Err(e) => {
            error!("GPU init failed: {e}");
            std::process::exit(1);
        }
    };

    let result = event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => match app.redraw() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => app.resize(app.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                error!("surface out of memory");
                                elwt.exit();
                            }
                            Err(e) => warn!("surface error: {e:?}"),
                        },
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    });

    if let Err(e) = result {
        error!("event loop error: {e}");
    }
}
