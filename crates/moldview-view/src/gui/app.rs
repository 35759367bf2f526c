use anyhow::Result;
use egui_wgpu::RenderState;
use moldview_io::FileGeometrySource;
use moldview_view::ViewerConfig;
use moldview_view::viewer::ui::Vec2;
use moldview_view::viewer::{
    Axis, CameraKind, SurfaceSize, TruckRenderer, ViewDirection, ViewerInput, ViewportController,
    ViewportPhase,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

const SIDE_PANEL_WIDTH: f32 = 300.0;

pub struct MoldviewApp {
    viewport: ViewportController<TruckRenderer>,
    render_texture_id: Option<egui::TextureId>,
    render_texture_revision: u64,
    path_text: String,
    color_text: String,
    unit_text: String,
    color_error: Option<String>,
    shut_down: bool,
}

impl MoldviewApp {
    pub fn new(
        config: &ViewerConfig,
        render_state: &RenderState,
        pixel_ratio: f32,
    ) -> Result<Self> {
        let options = config.viewport_options()?;
        let renderer = TruckRenderer::new(
            render_state.adapter.clone(),
            render_state.device.clone(),
            render_state.queue.clone(),
        );
        let surface = SurfaceSize::new(
            config.window.width.saturating_sub(SIDE_PANEL_WIDTH as u32).max(1),
            config.window.height.max(1),
            pixel_ratio,
        );
        let path_text = options.asset_path.display().to_string();
        let color_text = options.color.to_hex();
        let unit_text = options.unit.label().to_string();
        let mut viewport =
            ViewportController::new(surface, options, renderer, Arc::new(FileGeometrySource));
        viewport.on_ready();
        Ok(Self {
            viewport,
            render_texture_id: None,
            render_texture_revision: 0,
            path_text,
            color_text,
            unit_text,
            color_error: None,
            shut_down: false,
        })
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.viewport.on_teardown();
        self.shut_down = true;
    }

    pub fn ui(&mut self, ctx: &egui::Context, render_state: &RenderState) {
        if self.shut_down {
            return;
        }
        self.viewport.poll_loads();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing = egui::vec2(10.0, 0.0);
                ui.heading("Moldview");
                ui.add(egui::Separator::default().vertical());
                for direction in ViewDirection::ALL {
                    if ui.button(view_button_label(direction)).clicked() {
                        self.viewport.set_view(direction);
                    }
                }
                ui.add(egui::Separator::default().vertical());
                ui.label(self.status_text());
            });
        });

        egui::SidePanel::left("side_panel")
            .resizable(false)
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(8.0, 8.0);
                    ui.add_space(12.0);
                    ui.group(|ui| self.model_panel(ui));
                    ui.group(|ui| self.display_panel(ui));
                    ui.group(|ui| self.annotation_panel(ui));
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let size = ui.available_size();
                let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
                self.draw_viewport(ctx, ui, rect, render_state);
            });
    }

    fn status_text(&self) -> String {
        let state = self.viewport.state();
        match (state.phase, self.viewport.last_error()) {
            (ViewportPhase::Loading, _) => "Loading...".to_string(),
            (_, Some(err)) => format!("Error: {err}"),
            (phase, None) => match self.viewport.model() {
                Some(model) => format!(
                    "{} ({} triangles)",
                    model.path.display(),
                    model.triangles
                ),
                None => phase.label().to_string(),
            },
        }
    }

    fn model_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Model");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.path_text);
            if ui.button("Load").clicked() {
                let path = PathBuf::from(self.path_text.trim());
                self.viewport.request_load(path);
            }
        });
        if let Some(dims) = self.viewport.dimensions() {
            let unit = self.viewport.state().unit.clone();
            egui::Grid::new("dimensions_grid").num_columns(2).show(ui, |ui| {
                ui.label("Width");
                ui.label(format!("{:.2} {unit}", dims.width));
                ui.end_row();
                ui.label("Height");
                ui.label(format!("{:.2} {unit}", dims.height));
                ui.end_row();
                ui.label("Depth");
                ui.label(format!("{:.2} {unit}", dims.depth));
                ui.end_row();
            });
        }
    }

    fn display_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Display");
        ui.horizontal(|ui| {
            ui.label("Color");
            let edit = ui.text_edit_singleline(&mut self.color_text);
            let apply = ui.button("Apply").clicked();
            if edit.lost_focus() || apply {
                match self.viewport.set_color(self.color_text.trim()) {
                    Ok(()) => self.color_error = None,
                    Err(err) => {
                        warn!(error = %err, "rejected model color");
                        self.color_error = Some(err.to_string());
                    }
                }
            }
        });
        if let Some(err) = &self.color_error {
            ui.colored_label(egui::Color32::RED, err);
        }

        let state = self.viewport.state().clone();
        let mut wireframe = state.wireframe;
        if ui.checkbox(&mut wireframe, "Wireframe").changed() {
            self.viewport.toggle_wireframe();
        }
        let mut bbox = state.bounding_box_visible;
        if ui.checkbox(&mut bbox, "Bounding box").changed() {
            self.viewport.toggle_bounding_box();
        }

        ui.horizontal(|ui| {
            ui.label("Camera");
            for kind in [CameraKind::Perspective, CameraKind::Orthographic] {
                if ui
                    .selectable_label(state.camera_kind == kind, kind.label())
                    .clicked()
                {
                    self.viewport.set_camera_type(kind);
                }
            }
        });
    }

    fn annotation_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Annotations");
        let state = self.viewport.state().clone();

        let mut dims = state.dimensions_visible;
        if ui.checkbox(&mut dims, "Dimensions").changed() {
            self.viewport.set_dimensions_visible(dims);
        }
        ui.horizontal(|ui| {
            ui.label("Unit");
            let edit = ui.text_edit_singleline(&mut self.unit_text);
            if edit.lost_focus() && self.unit_text.trim() != state.unit.label() {
                self.viewport.set_unit(self.unit_text.trim());
            }
        });

        let mut demolding = state.demolding_visible;
        if ui.checkbox(&mut demolding, "Demolding direction").changed() {
            self.viewport.set_demolding_visible(demolding);
        }
        ui.horizontal(|ui| {
            ui.label("Axis");
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                if ui
                    .selectable_label(state.demolding_axis == axis, axis.label())
                    .clicked()
                {
                    self.viewport.set_demolding_direction(axis);
                }
            }
        });
    }

    fn draw_viewport(
        &mut self,
        ctx: &egui::Context,
        ui: &mut egui::Ui,
        rect: egui::Rect,
        render_state: &RenderState,
    ) {
        let bg = ui.visuals().panel_fill;
        ui.painter().rect_filled(rect, 0.0, bg);

        let surface = SurfaceSize::new(
            rect.width().max(1.0) as u32,
            rect.height().max(1.0) as u32,
            ctx.pixels_per_point(),
        );
        if surface != self.viewport.surface() {
            self.viewport.on_resize(surface);
        }

        let input = build_input(ctx, rect);
        self.viewport.apply_input(&input);
        self.viewport.tick();
        self.sync_render_texture(render_state);

        if let Some(texture_id) = self.render_texture_id {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter().image(texture_id, rect, uv, egui::Color32::WHITE);
        }
    }

    fn sync_render_texture(&mut self, render_state: &RenderState) {
        let revision = self.viewport.renderer().target_revision();
        if self.render_texture_revision == revision && self.render_texture_id.is_some() {
            return;
        }

        let view = self.viewport.renderer().target_view();
        let mut renderer = render_state.renderer.write();
        let texture_id = if let Some(id) = self.render_texture_id {
            renderer.update_egui_texture_from_wgpu_texture(
                &render_state.device,
                view,
                wgpu::FilterMode::Linear,
                id,
            );
            id
        } else {
            renderer.register_native_texture(&render_state.device, view, wgpu::FilterMode::Linear)
        };
        self.render_texture_id = Some(texture_id);
        self.render_texture_revision = revision;
    }
}

fn build_input(ctx: &egui::Context, rect: egui::Rect) -> ViewerInput {
    let hovered = ctx
        .input(|i| i.pointer.interact_pos())
        .map(|pos| rect.contains(pos))
        .unwrap_or(false);
    if !hovered {
        return ViewerInput {
            viewport_height: rect.height(),
            ..Default::default()
        };
    }
    let delta = ctx.input(|i| i.pointer.delta());
    ViewerInput {
        viewport_height: rect.height(),
        pointer_delta: Vec2::new(delta.x, delta.y),
        primary_down: ctx.input(|i| i.pointer.button_down(egui::PointerButton::Primary)),
        secondary_down: ctx.input(|i| i.pointer.button_down(egui::PointerButton::Secondary)),
        middle_down: ctx.input(|i| i.pointer.button_down(egui::PointerButton::Middle)),
        scroll_delta: ctx.input(|i| i.raw_scroll_delta.y),
        hovered,
    }
}

fn view_button_label(direction: ViewDirection) -> &'static str {
    match direction {
        ViewDirection::Front => "Front",
        ViewDirection::Top => "Top",
        ViewDirection::Side => "Side",
        ViewDirection::Reset => "Reset",
    }
}
