use crate::color::{from_color32, to_color32};
use eframe::egui;
use figure::{Light, MAX_LIGHTS};
use revis_core::InlineFigure;

/// Window for editing the lights of one figure.
///
/// The dialog works on a copy of the lights and writes them back only when
/// something changed, so the figure revision is not bumped every frame.
#[derive(Debug, Default)]
pub struct LightDialog {
    pub open: bool,
    lights: Vec<Light>,
    selected: usize,
}

impl LightDialog {
    pub fn open_for(&mut self, figure: &InlineFigure) {
        self.lights = figure.with_figure(|f| f.lights().to_vec());
        self.selected = self.selected.min(self.lights.len().saturating_sub(1));
        self.open = true;
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, index: usize) {
        if index < self.lights.len() {
            self.selected = index;
        }
    }

    /// Adds a light that starts switched off. Returns false at the limit.
    pub fn add_light(&mut self) -> bool {
        if self.lights.len() >= MAX_LIGHTS {
            return false;
        }
        self.lights.push(Light::off());
        self.selected = self.lights.len() - 1;
        true
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    /// Copies the edited lights into `figure`.
    pub fn apply(&self, figure: &InlineFigure) {
        let lights = self.lights.clone();
        figure.with_figure_mut(|f| *f.lights_mut() = lights);
    }

    pub fn show(&mut self, ctx: &egui::Context, figure: &InlineFigure) {
        if !self.open {
            return;
        }
        let mut open = self.open;
        let mut changed = false;
        egui::Window::new(format!("Lights (figure {})", figure.id()))
            .id(egui::Id::new(("revis-lights", figure.id())))
            .resizable(false)
            .default_size(egui::vec2(320.0, 240.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for index in 0..self.lights.len() {
                        if ui
                            .selectable_label(self.selected == index, format!("Light {index}"))
                            .clicked()
                        {
                            self.selected = index;
                        }
                    }
                    if ui
                        .add_enabled(self.lights.len() < MAX_LIGHTS, egui::Button::new("+"))
                        .clicked()
                    {
                        changed |= self.add_light();
                    }
                });
                ui.separator();

                let Some(light) = self.lights.get_mut(self.selected) else {
                    ui.label("No lights");
                    return;
                };
                changed |= ui.checkbox(&mut light.on, "On").changed();
                changed |= color_row(ui, "Ambient", &mut light.ambient);
                changed |= color_row(ui, "Diffuse", &mut light.diffuse);
                changed |= color_row(ui, "Specular", &mut light.specular);
                ui.horizontal(|ui| {
                    ui.label("Position:");
                    for value in light.position.iter_mut() {
                        changed |= ui
                            .add(egui::DragValue::new(value).speed(0.05))
                            .changed();
                    }
                });
            });
        self.open = open;
        if changed {
            self.apply(figure);
        }
    }
}

fn color_row(ui: &mut egui::Ui, label: &str, color: &mut figure::Rgba) -> bool {
    ui.horizontal(|ui| {
        ui.label(format!("{label}:"));
        let mut value = to_color32(*color);
        let changed = ui.color_edit_button_srgba(&mut value).changed();
        if changed {
            *color = from_color32(value);
        }
        changed
    })
    .inner
}

#[cfg(test)]
mod tests {
    use super::*;
    use revis_core::{figure_with, FigureOptions};

    #[test]
    fn edits_reach_the_figure_on_apply() {
        let fig = figure_with(FigureOptions {
            disable_output: true,
            size: (10, 10),
        });
        let mut dialog = LightDialog::default();
        dialog.open_for(&fig);
        assert!(dialog.open);
        assert_eq!(dialog.lights().len(), 1);

        let before = fig.revision();
        dialog.light_mut(0).expect("camera light").on = false;
        dialog.apply(&fig);
        assert!(fig.revision() > before);
        assert!(!fig.with_figure(|f| f.lights()[0].on));
    }

    #[test]
    fn light_count_is_capped() {
        let mut dialog = LightDialog::default();
        for _ in 0..MAX_LIGHTS {
            assert!(dialog.add_light());
        }
        assert!(!dialog.add_light());
        assert_eq!(dialog.selected(), MAX_LIGHTS - 1);
        dialog.select(MAX_LIGHTS + 3);
        assert_eq!(dialog.selected(), MAX_LIGHTS - 1);
    }
}
