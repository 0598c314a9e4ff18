//! The worksheet both `render` and `view` evaluate.

use figure::Rgba;
use revis_core::functions::{
    bar, grid, hist, imshow, plot_xy, polarplot, solid_box, solid_sphere, surf, title, xlabel,
    ylabel,
};
use revis_core::{figure, RevisError, Worksheet};
use std::f64::consts::PI;

type StatementBody = fn() -> Result<Option<String>, RevisError>;

pub struct DemoStatement {
    pub source: &'static str,
    pub body: StatementBody,
}

pub fn statements() -> Vec<DemoStatement> {
    vec![
        DemoStatement {
            source: "x = linspace(0, 2*pi, 64); plot(x, sin(x))",
            body: sine,
        },
        DemoStatement {
            source: "hist(samples, 12)",
            body: histogram,
        },
        DemoStatement {
            source: "with figure(): surf(peaks); title('peaks')",
            body: peaks,
        },
        DemoStatement {
            source: "1 + 1",
            body: || Ok(Some("2".to_string())),
        },
        DemoStatement {
            source: "bar([3, 1, 4, 1, 5])",
            body: || {
                bar(&[3.0, 1.0, 4.0, 1.0, 5.0])?;
                Ok(None)
            },
        },
        DemoStatement {
            source: "with figure(): solid_sphere(); solid_box((1.5, 0, 0))",
            body: solids,
        },
        DemoStatement {
            source: "imshow(gradient)",
            body: gradient,
        },
        DemoStatement {
            source: "polarplot(theta, 1 + cos(4*theta))",
            body: rose,
        },
    ]
}

pub fn run(sheet: &mut Worksheet) -> Result<Vec<u64>, RevisError> {
    statements()
        .into_iter()
        .map(|statement| sheet.run(statement.source, statement.body))
        .collect()
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / (count.max(2) - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

fn sine() -> Result<Option<String>, RevisError> {
    let x = linspace(0.0, 2.0 * PI, 64);
    let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
    let fig = figure();
    let _session = fig.enter();
    plot_xy(&x, &y)?;
    xlabel("x")?;
    ylabel("sin(x)")?;
    grid(true)?;
    Ok(None)
}

fn histogram() -> Result<Option<String>, RevisError> {
    // Deterministic pseudo-normal samples: sums of a few uniform LCG draws.
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut uniform = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    let samples: Vec<f64> = (0..500)
        .map(|_| (0..4).map(|_| uniform()).sum::<f64>() - 2.0)
        .collect();
    hist(&samples, 12)?;
    Ok(Some(format!("{} samples", samples.len())))
}

fn peaks() -> Result<Option<String>, RevisError> {
    let axis = linspace(-3.0, 3.0, 25);
    let z: Vec<Vec<f64>> = axis
        .iter()
        .map(|&y| {
            axis.iter()
                .map(|&x| {
                    3.0 * (1.0 - x).powi(2) * (-x * x - (y + 1.0).powi(2)).exp()
                        - 10.0 * (x / 5.0 - x.powi(3) - y.powi(5)) * (-x * x - y * y).exp()
                        - (-(x + 1.0).powi(2) - y * y).exp() / 3.0
                })
                .collect()
        })
        .collect();
    let fig = figure();
    let _session = fig.enter();
    surf(z)?;
    title("peaks")?;
    Ok(None)
}

fn solids() -> Result<Option<String>, RevisError> {
    let fig = figure();
    let _session = fig.enter();
    solid_sphere([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    solid_box([1.5, 0.0, 0.0], [0.8, 0.8, 0.8])?;
    fig.with_figure_mut(|f| {
        if let Some(light) = f.lights_mut().first_mut() {
            light.diffuse = Rgba::new(1.0, 0.85, 0.6, 1.0);
        }
    });
    Ok(None)
}

fn gradient() -> Result<Option<String>, RevisError> {
    let (width, height) = (32u32, 24u32);
    let (w, h) = (f64::from(width - 1), f64::from(height - 1));
    let pixels: Vec<f64> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (f64::from(x) / w + f64::from(y) / h) / 2.0))
        .collect();
    imshow(width, height, &pixels)?;
    Ok(None)
}

fn rose() -> Result<Option<String>, RevisError> {
    let theta = linspace(0.0, 2.0 * PI, 181);
    let radius: Vec<f64> = theta.iter().map(|t| 1.0 + (4.0 * t).cos()).collect();
    polarplot(&theta, &radius)?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let values = linspace(0.0, 1.0, 5);
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn every_statement_has_source() {
        assert!(statements().iter().all(|s| !s.source.is_empty()));
    }
}
