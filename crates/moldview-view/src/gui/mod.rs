use anyhow::{Result, anyhow};
use egui_wgpu::winit::Painter;
use egui_wgpu::{RendererOptions, WgpuConfiguration, WgpuSetup, WgpuSetupCreateNew};
use egui_winit::State as EguiWinitState;
use moldview_view::ViewerConfig;
use std::num::NonZeroU32;
use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::Window;

use self::app::MoldviewApp;

mod app;

struct GuiHost {
    window: Arc<Window>,
    ctx: egui::Context,
    painter: Painter,
    egui_state: EguiWinitState,
    render_state: egui_wgpu::RenderState,
    app: MoldviewApp,
}

impl GuiHost {
    fn fit_to_window(&mut self) {
        let size = self.window.inner_size();
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            self.painter
                .on_window_resized(egui::ViewportId::ROOT, width, height);
        }
    }

    fn redraw(&mut self) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let app = &mut self.app;
        let render_state = &self.render_state;
        let output = self.ctx.run(raw_input, |ctx| app.ui(ctx, render_state));
        self.egui_state
            .handle_platform_output(&self.window, output.platform_output);

        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let clear = egui::Rgba::from(self.ctx.style().visuals.window_fill).to_array();
        let _ = self.painter.paint_and_update_textures(
            egui::ViewportId::ROOT,
            output.pixels_per_point,
            clear,
            &primitives,
            &output.textures_delta,
            Vec::new(),
        );
    }

    /// Returns false once the window asked to close.
    fn on_window_event(&mut self, event: WindowEvent) -> bool {
        if matches!(event, WindowEvent::CloseRequested) {
            self.app.shutdown();
            return false;
        }
        if self.egui_state.on_window_event(&self.window, &event).repaint {
            self.window.request_redraw();
        }
        match event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.fit_to_window();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
        true
    }
}

pub fn run_gui(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!(err.to_string()))?;
    let attributes = Window::default_attributes()
        .with_title("Moldview")
        .with_inner_size(LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .with_min_inner_size(LogicalSize::new(640.0, 480.0));
    let window = Arc::new(
        event_loop
            .create_window(attributes)
            .map_err(|err| anyhow!(err.to_string()))?,
    );

    let ctx = egui::Context::default();
    let mut painter = create_painter(ctx.clone());
    pollster::block_on(painter.set_window(egui::ViewportId::ROOT, Some(window.clone())))
        .map_err(|err| anyhow!(err.to_string()))?;
    let render_state = painter
        .render_state()
        .ok_or_else(|| anyhow!("wgpu render state not initialized"))?;
    let scale = window.scale_factor() as f32;
    let egui_state = EguiWinitState::new(
        ctx.clone(),
        egui::ViewportId::ROOT,
        &event_loop,
        Some(scale),
        window.theme(),
        painter.max_texture_side(),
    );
    let app = MoldviewApp::new(&config, &render_state, scale)?;
    let mut host = GuiHost {
        window,
        ctx,
        painter,
        egui_state,
        render_state,
        app,
    };

    #[allow(deprecated)]
    event_loop
        .run(move |event, event_loop| {
            event_loop.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, window_id } if window_id == host.window.id() => {
                    if !host.on_window_event(event) {
                        event_loop.exit();
                    }
                }
                Event::AboutToWait => host.window.request_redraw(),
                Event::LoopExiting => host.app.shutdown(),
                _ => {}
            }
        })
        .map_err(|err| anyhow!(err.to_string()))
}

fn power_preference() -> wgpu::PowerPreference {
    let value = std::env::var("MOLDVIEW_POWER_PREF").unwrap_or_default();
    match value.trim().to_ascii_lowercase().as_str() {
        "high" | "high_performance" | "high-performance" => wgpu::PowerPreference::HighPerformance,
        "default" => wgpu::PowerPreference::default(),
        _ => wgpu::PowerPreference::LowPower,
    }
}

fn create_painter(ctx: egui::Context) -> Painter {
    let configuration = WgpuConfiguration {
        wgpu_setup: WgpuSetup::CreateNew(WgpuSetupCreateNew {
            power_preference: power_preference(),
            device_descriptor: Arc::new(|adapter| wgpu::DeviceDescriptor {
                label: Some("moldview"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::default(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    pollster::block_on(Painter::new(
        ctx,
        configuration,
        false,
        RendererOptions::default(),
    ))
}
