//! Flow control and application event loop.
//!
//! A "flow" is a scene that reacts to input, advances its own simulation and
//! hands renderable objects to the engine each frame. The engine owns the
//! [`Context`] and coordinates everything else.
//!
//! # Lifecycle
//!
//! The event loop follows this pattern each frame:
//! 1. Forward window/device events to the camera controller and every flow
//! 2. Call `on_update` on all flows with the frame time
//! 3. Advance the renderer (clock, camera, light and sky uniforms)
//! 4. Collect every flow's `on_render` output
//! 5. Draw through the active render path and present

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window},
};

use crate::{
    config::Settings,
    context::{Context, InitContext},
    render::Instanced,
};
pub use crate::render::Render;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Output of every lifecycle hook.
///
/// `Out::Configure` modifies the [`Context`] after the hook returns, for
/// instance to switch the camera mode or the render path.
///
/// `Out::Exit` asks the event loop to shut down.
///
/// `Empty` is the default output when nothing needs to happen.
pub enum Out {
    Configure(Box<dyn FnOnce(&mut Context)>),
    Exit,
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

impl Debug for Out {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configure(_) => f.write_str("Configure(|&mut Context| {...})"),
            Self::Exit => f.write_str("Exit"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

/// Trait for implementing a renderable scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after the flow is constructed
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame before the renderer advances
/// 4. `on_render()` is called each frame and specifies how to render `self`
pub trait GraphicsFlow {
    /// The only hook with mutable access to the context.
    fn on_init(&mut self, ctx: &mut Context) -> Out;

    /// Called every frame with the elapsed time `dt`.
    fn on_update(&mut self, ctx: &Context, dt: Duration) -> Out;

    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent) -> Out;

    fn on_device_events(&mut self, ctx: &Context, event: &DeviceEvent) -> Out;

    fn on_render(&self) -> Render<'_>;
}

// Dummy impl to make wasm work
impl Debug for dyn GraphicsFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Builds a flow from the GPU handles once the context exists. Asset loading
/// happens inside the returned future.
pub type FlowConstructor =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow>>>>>;

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized {
        ctx: Context,
        flows: Vec<Box<dyn GraphicsFlow>>,
    },
    #[allow(dead_code)]
    Exit,
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { ctx: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Exit => f.write_str("Exit"),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    settings: Settings,
    ctx: Option<Context>,
    graphics_flows: Vec<Box<dyn GraphicsFlow>>,
    // Taken on the first `resumed`
    constructors: Option<Vec<FlowConstructor>>,
    last_time: Instant,
    mouse_look: MouseLook,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        settings: Settings,
        constructors: Vec<FlowConstructor>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            settings,
            ctx: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            mouse_look: MouseLook::default(),
        })
    }

    fn init_flows(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let size = ctx.window.inner_size();
        ctx.resize(size.width, size.height);
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_init(ctx);
            handle_flow_output(event_loop, ctx, out);
        }
        if ctx.settings.capture_cursor {
            self.mouse_look.grabbed = grab_cursor(&ctx.window);
        }
        self.last_time = Instant::now();
        ctx.window.request_redraw();
    }
}

/// Whether mouse motion should turn the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MouseLook {
    grabbed: bool,
    right_button_held: bool,
}

impl MouseLook {
    fn active(&self) -> bool {
        self.grabbed || self.right_button_held
    }

    /// The window no longer sees the button release, so both are dropped.
    fn focus_lost(&mut self) {
        *self = Self::default();
    }
}

/// Locks the cursor to the window, or confines it where locking is not
/// supported. Returns whether either worked.
fn grab_cursor(window: &Window) -> bool {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    match grabbed {
        Ok(()) => {
            window.set_cursor_visible(false);
            true
        }
        Err(e) => {
            log::warn!("cursor capture unavailable ({e}), hold the right mouse button to look around");
            false
        }
    }
}

fn release_cursor(window: &Window) {
    if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("could not release the cursor: {e}");
    }
    window.set_cursor_visible(true);
}

fn render_frame(ctx: &Context, flows: &[Box<dyn GraphicsFlow>]) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut draws: Vec<Instanced> = Vec::new();
    flows
        .iter()
        .for_each(|flow| flow.on_render().flatten_into(&mut draws));
    draws.retain(|draw| {
        let empty = draw.amount == 0 || draw.instance.size() == 0;
        if empty {
            log::warn!("you attempted to render something with zero instances");
        }
        !empty
    });

    let renderer = &ctx.renderer;
    let mut encoder = renderer
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    renderer.render(&mut encoder, &view, &draws);
    renderer.queue.submit(iter::once(encoder.finish()));

    ctx.window.pre_present_notify();
    output.present();
    Ok(())
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Already running, e.g. resumed again on mobile
        if self.ctx.is_some() {
            return;
        }
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.settings.width,
                self.settings.height,
            ));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let settings = self.settings.clone();
        let init_future = async move {
            let ctx = Context::new(window, settings).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                .map(|constructor| constructor((&ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((ctx, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((ctx, flows)) => {
                    self.ctx = Some(ctx);
                    self.graphics_flows = flows;
                    self.init_flows(event_loop);
                }
                Err(e) => {
                    log::error!("start-up failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((ctx, flows)) => {
                        assert!(proxy.send_event(FlowEvent::Initialized { ctx, flows }).is_ok());
                    }
                    Err(e) => {
                        log::error!("start-up failed: {e:#}");
                        assert!(proxy.send_event(FlowEvent::Exit).is_ok());
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized { ctx, flows } => {
                // This is the message from our wasm `spawn_local`
                self.ctx = Some(ctx);
                self.graphics_flows = flows;
                self.init_flows(event_loop);
            }
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn device_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.mouse_look.active() {
                ctx.renderer.camera.controller.handle_mouse(dx, dy);
            }
        }
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_device_events(ctx, &event);
            handle_flow_output(event_loop, ctx, out);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        ctx.renderer.camera.controller.handle_window_events(&event);

        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_window_events(ctx, &event);
            handle_flow_output(event_loop, ctx, out);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => ctx.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Right,
                ..
            } => self.mouse_look.right_button_held = button_state.is_pressed(),
            WindowEvent::Focused(true) if ctx.settings.capture_cursor => {
                self.mouse_look.grabbed = grab_cursor(&ctx.window);
            }
            WindowEvent::Focused(false) => {
                if self.mouse_look.grabbed {
                    release_cursor(&ctx.window);
                }
                self.mouse_look.focus_lost();
            }
            WindowEvent::RedrawRequested => {
                // invoke main render loop
                ctx.window.request_redraw();

                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                for flow in self.graphics_flows.iter_mut() {
                    let out = flow.on_update(ctx, dt);
                    handle_flow_output(event_loop, ctx, out);
                }
                ctx.renderer.update(dt);

                match render_frame(ctx, &self.graphics_flows) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        ctx.reconfigure();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

fn handle_flow_output(event_loop: &ActiveEventLoop, ctx: &mut Context, out: Out) {
    match out {
        Out::Configure(f) => f(ctx),
        Out::Exit => event_loop.exit(),
        Out::Empty => (),
    }
}

/// Opens the window and runs `constructors` until the window closes or a
/// flow returns [`Out::Exit`].
pub fn run(settings: Settings, constructors: Vec<FlowConstructor>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    log::info!("starting with {settings:?}");

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, settings, constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
