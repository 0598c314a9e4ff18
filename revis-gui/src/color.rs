use eframe::egui;
use figure::Rgba;

pub fn to_color32(color: Rgba) -> egui::Color32 {
    let [r, g, b, a] = color.to_rgba8();
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn from_color32(color: egui::Color32) -> Rgba {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Rgba::from_rgba8(r, g, b, a)
}

/// egui's `Rgba` is linear and premultiplied; the conversion goes through
/// `Color32` so gamma is handled by egui.
pub fn to_egui_rgba(color: Rgba) -> egui::Rgba {
    egui::Rgba::from(to_color32(color))
}

pub fn from_egui_rgba(color: egui::Rgba) -> Rgba {
    from_color32(egui::Color32::from(color))
}

/// Converts a snapshot into an image egui can upload.
pub fn color_image(image: &image::RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color32_keeps_bytes() {
        let color = Rgba::from_rgba8(0, 114, 189, 255);
        let converted = to_color32(color);
        assert_eq!(converted, egui::Color32::from_rgb(0, 114, 189));
        assert_eq!(from_color32(converted).to_rgba8(), [0, 114, 189, 255]);
    }

    #[test]
    fn egui_rgba_is_linear() {
        let mid = Rgba::from_rgb8(128, 128, 128);
        let linear = to_egui_rgba(mid);
        assert!(linear.r() < 0.5 && linear.r() > 0.1);
        assert_eq!(from_egui_rgba(linear).to_rgb8(), [128, 128, 128]);
    }

    #[test]
    fn color_image_matches_dimensions() {
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let converted = color_image(&image);
        assert_eq!(converted.size, [3, 2]);
        assert_eq!(converted.pixels[0], egui::Color32::from_rgb(1, 2, 3));
    }
}
