use crate::RevisError;
use figure::Rgba;
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Drawing target a result prints onto, modelled after a 2D context with a
/// save/restore transform stack.
pub trait DisplaySurface {
    fn save(&mut self);
    fn restore(&mut self);
    fn scale(&mut self, sx: f64, sy: f64);
    fn translate(&mut self, dx: f64, dy: f64);
    /// Paints `image` with its top-left corner at user coordinates `(x, y)`.
    fn paint_image(&mut self, image: &RgbaImage, x: f64, y: f64) -> Result<(), RevisError>;
}

pub trait PrintContext {
    fn surface(&mut self) -> &mut dyn DisplaySurface;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    sx: f64,
    sy: f64,
    tx: f64,
    ty: f64,
}

impl Transform {
    const IDENTITY: Self = Self {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };
}

/// In-memory surface backed by an RGBA image.
pub struct RasterContext {
    target: RgbaImage,
    transform: Transform,
    stack: Vec<Transform>,
}

impl RasterContext {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        let fill = image::Rgba(background.to_rgba8());
        Self {
            target: RgbaImage::from_pixel(width.max(1), height.max(1), fill),
            transform: Transform::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_image(self) -> RgbaImage {
        self.target
    }
}

impl DisplaySurface for RasterContext {
    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.transform.sx *= sx;
        self.transform.sy *= sy;
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform.tx += self.transform.sx * dx;
        self.transform.ty += self.transform.sy * dy;
    }

    fn paint_image(&mut self, image: &RgbaImage, x: f64, y: f64) -> Result<(), RevisError> {
        let t = self.transform;
        if !(t.sx > 0.0 && t.sy > 0.0 && t.sx.is_finite() && t.sy.is_finite()) {
            return Err(RevisError::Surface(format!(
                "cannot paint with scale ({}, {})",
                t.sx, t.sy
            )));
        }
        let width = (f64::from(image.width()) * t.sx).round().max(1.0) as u32;
        let height = (f64::from(image.height()) * t.sy).round().max(1.0) as u32;
        let left = (t.tx + t.sx * x).round() as i64;
        let top = (t.ty + t.sy * y).round() as i64;

        if (width, height) == image.dimensions() {
            imageops::overlay(&mut self.target, image, left, top);
        } else {
            let resized = imageops::resize(image, width, height, FilterType::Triangle);
            imageops::overlay(&mut self.target, &resized, left, top);
        }
        Ok(())
    }
}

impl PrintContext for RasterContext {
    fn surface(&mut self) -> &mut dyn DisplaySurface {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba(rgba))
    }

    #[test]
    fn half_scale_downsamples_onto_target() {
        let mut ctx = RasterContext::new(10, 10, Rgba::gray(1.0));
        ctx.save();
        ctx.scale(0.5, 0.5);
        ctx.paint_image(&solid(8, 8, [0, 0, 0, 255]), 0.0, 0.0).unwrap();
        ctx.restore();

        let img = ctx.image();
        assert_eq!(img.get_pixel(3, 3).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn translate_follows_current_scale() {
        let mut ctx = RasterContext::new(10, 10, Rgba::gray(1.0));
        ctx.scale(2.0, 2.0);
        ctx.translate(2.0, 1.0);
        ctx.scale(0.5, 0.5);
        ctx.paint_image(&solid(1, 1, [255, 0, 0, 255]), 0.0, 0.0).unwrap();
        assert_eq!(ctx.image().get_pixel(4, 2).0, [255, 0, 0, 255]);
    }

    #[test]
    fn restore_without_save_is_ignored() {
        let mut ctx = RasterContext::new(2, 2, Rgba::gray(1.0));
        ctx.restore();
        ctx.scale(0.0, 1.0);
        assert!(ctx.paint_image(&solid(1, 1, [0, 0, 0, 255]), 0.0, 0.0).is_err());
    }
}
