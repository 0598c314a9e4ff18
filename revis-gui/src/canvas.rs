use crate::lights::LightDialog;
use crate::GuiError;
use eframe::egui;
use figure::RenderOptions;
use revis_core::{InlineFigure, WidgetGeometry};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

const ROTATE_DEGREES_PER_POINT: f64 = 0.5;
const ZOOM_PER_SCROLL_POINT: f64 = 0.002;
const MAX_TEXTURE_SCALE: u32 = 4;

/// Shows one inline figure: a toolbar above the rendered snapshot.
pub struct FigureCanvas {
    figure: Arc<InlineFigure>,
    render_options: RenderOptions,
    texture: Option<egui::TextureHandle>,
    // (revision, scale factor) of the uploaded texture.
    rendered: Option<(u64, u32)>,
    lights: LightDialog,
    save_dialog_rx: Option<Receiver<Option<PathBuf>>>,
    status: Option<String>,
}

impl FigureCanvas {
    pub fn new(figure: Arc<InlineFigure>, render_options: RenderOptions) -> Self {
        Self {
            figure,
            render_options,
            texture: None,
            rendered: None,
            lights: LightDialog::default(),
            save_dialog_rx: None,
            status: None,
        }
    }

    pub fn figure(&self) -> &Arc<InlineFigure> {
        &self.figure
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn needs_render(&self, scale_factor: u32) -> bool {
        self.rendered != Some((self.figure.revision(), scale_factor))
    }

    /// Drag rotation. Only 3D figures have a camera worth moving.
    pub fn rotate_by(&self, delta: egui::Vec2) {
        if !self.figure.with_figure(|f| f.is_3d()) {
            return;
        }
        let d_azimuth = -f64::from(delta.x) * ROTATE_DEGREES_PER_POINT;
        let d_elevation = f64::from(delta.y) * ROTATE_DEGREES_PER_POINT;
        self.figure
            .with_figure_mut(|f| f.camera_mut().rotate(d_azimuth, d_elevation));
    }

    pub fn zoom_by_scroll(&self, scroll_y: f32) {
        if scroll_y == 0.0 || !self.figure.with_figure(|f| f.is_3d()) {
            return;
        }
        let factor = (1.0 + f64::from(scroll_y) * ZOOM_PER_SCROLL_POINT).max(0.1);
        self.figure.with_figure_mut(|f| f.camera_mut().zoom_by(factor));
    }

    pub fn save_to(&self, path: &Path) -> Result<(), GuiError> {
        let options = RenderOptions {
            scale_factor: 1,
            ..self.render_options
        };
        self.figure
            .with_figure(|f| figure::save_png(f, path, &options))?;
        Ok(())
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) -> egui::Response {
        self.poll_save_dialog();
        ui.vertical(|ui| {
            self.toolbar(ui);
            if let Some(status) = &self.status {
                ui.small(status.as_str());
            }
            let response = self.image(ui);
            self.lights.show(ui.ctx(), &self.figure);
            response
        })
        .inner
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.save_dialog_rx.is_none(), egui::Button::new("Save..."))
                .clicked()
            {
                self.open_save_dialog();
            }
            if ui.button("Reset view").clicked() {
                self.figure.with_figure_mut(|f| f.reset_view());
            }
            let mut grid = self.figure.with_figure(|f| f.grid());
            if ui.checkbox(&mut grid, "Grid").changed() {
                self.figure.with_figure_mut(|f| f.set_grid(grid));
            }
            if ui.button("Lights").clicked() {
                self.lights.open_for(&self.figure);
            }
        });
    }

    fn image(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (width, height) = self.figure.with_figure(|f| f.size());
        let size = egui::vec2(width as f32, height as f32);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let response = response.on_hover_cursor(egui::CursorIcon::Default);

        if response.dragged() {
            self.rotate_by(response.drag_delta());
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            self.zoom_by_scroll(scroll);
        }

        self.figure.set_widget_geometry(WidgetGeometry {
            x: f64::from(rect.min.x),
            y: f64::from(rect.min.y),
            width: f64::from(rect.width()),
            height: f64::from(rect.height()),
        });

        self.refresh_texture(ui.ctx());
        match &self.texture {
            Some(texture) => {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                ui.painter()
                    .image(texture.id(), rect, uv, egui::Color32::WHITE);
            }
            None => {
                ui.painter()
                    .rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);
            }
        }
        response
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let scale = (ctx.pixels_per_point().ceil() as u32).clamp(1, MAX_TEXTURE_SCALE);
        if !self.needs_render(scale) {
            return;
        }
        let revision = self.figure.revision();
        let options = RenderOptions {
            scale_factor: scale,
            ..self.render_options
        };
        match self.figure.snapshot(options) {
            Ok(snapshot) => {
                let image = crate::color::color_image(&snapshot.image);
                match &mut self.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture = Some(ctx.load_texture(
                            format!("revis_figure_{}", self.figure.id()),
                            image,
                            egui::TextureOptions::LINEAR,
                        ));
                    }
                }
            }
            Err(err) => {
                log::warn!("figure {} render failed: {err}", self.figure.id());
                self.status = Some(format!("Render failed: {err}"));
            }
        }
        self.rendered = Some((revision, scale));
    }

    fn open_save_dialog(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.save_dialog_rx = Some(rx);
        let file_name = format!("figure_{}.png", self.figure.id());
        std::thread::spawn(move || {
            let file = rfd::FileDialog::new()
                .add_filter("PNG image", &["png"])
                .set_file_name(&file_name)
                .save_file();
            let _ = tx.send(file);
        });
    }

    fn poll_save_dialog(&mut self) {
        let result = match &self.save_dialog_rx {
            Some(rx) => rx.try_recv().ok(),
            None => None,
        };
        if let Some(selection) = result {
            self.save_dialog_rx = None;
            if let Some(path) = selection {
                self.status = Some(match self.save_to(&path) {
                    Ok(()) => format!("Saved {}", path.display()),
                    Err(err) => format!("Save failed: {err}"),
                });
            }
        }
    }
}
