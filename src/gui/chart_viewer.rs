//! Chart Viewer Widget
//! Central panel that shows one rendered chart, scaled to fit.

use crate::charts::RenderedChart;
use egui::{RichText, TextureHandle, TextureOptions};

/// Holds the rendered charts and uploads each to the GPU on first display.
pub struct ChartViewer {
    charts: Vec<RenderedChart>,
    textures: Vec<Option<TextureHandle>>,
}

impl ChartViewer {
    pub fn new(charts: Vec<RenderedChart>) -> Self {
        let textures = vec![None; charts.len()];
        Self { charts, textures }
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn title(&self, index: usize) -> &str {
        self.charts
            .get(index)
            .map(|chart| chart.title.as_str())
            .unwrap_or("")
    }

    fn texture(&mut self, ctx: &egui::Context, index: usize) -> Option<TextureHandle> {
        let chart = self.charts.get(index)?;
        let slot = self.textures.get_mut(index)?;

        if slot.is_none() {
            let image = egui::ColorImage::from_rgb(
                [chart.width as usize, chart.height as usize],
                &chart.rgb,
            );
            *slot = Some(ctx.load_texture(chart.kind.slug(), image, TextureOptions::LINEAR));
        }

        slot.clone()
    }

    /// Draw the chart at `index`
    pub fn show(&mut self, ctx: &egui::Context, ui: &mut egui::Ui, index: usize) {
        let Some(texture) = self.texture(ctx, index) else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Charts").size(20.0));
            });
            return;
        };

        ui.centered_and_justified(|ui| {
            ui.add(egui::Image::new(&texture).shrink_to_fit());
        });
    }
}
