// ============================================================
// Layer 6 — Field Figures
// ============================================================
// Writes one PNG with three stacked panels:
//
//   ┌──────────────┐
//   │ ground truth │   shared colour scale
//   ├──────────────┤
//   │  prediction  │   shared colour scale
//   ├──────────────┤
//   │ |truth−pred| │   own scale, 0 → max error
//   └──────────────┘
//
// Each grid cell becomes a `scale × scale` block of pixels.
// Vorticity is signed, so truth and prediction use a diverging
// blue–white–red map centred on zero.

use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

/// Pixels per grid cell
const CELL_PX: u32 = 3;

/// Plot `truth` and `pred` (row-major, `height × width`) to `path`.
pub fn plot_fields(truth: &[f32], pred: &[f32], height: usize, width: usize, path: &Path) -> Result<()> {
    let cells = height * width;
    anyhow::ensure!(
        truth.len() == cells && pred.len() == cells,
        "plot expects {cells} values, got truth={} pred={}",
        truth.len(),
        pred.len()
    );

    let error: Vec<f32> = truth.iter().zip(pred).map(|(t, p)| (t - p).abs()).collect();
    let signed_max = truth.iter().chain(pred).fold(0f32, |m, v| m.max(v.abs())).max(f32::EPSILON);
    let error_max  = error.iter().fold(0f32, |m, &v| m.max(v)).max(f32::EPSILON);

    let size = (width as u32 * CELL_PX, 3 * height as u32 * CELL_PX);
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow::anyhow!("backend error: {e}"))?;

    let panels = root.split_evenly((3, 1));
    draw_panel(&panels[0], truth, width, |v| diverging_color(v / signed_max))?;
    draw_panel(&panels[1], pred, width, |v| diverging_color(v / signed_max))?;
    draw_panel(&panels[2], &error, width, |v| sequential_color(v / error_max))?;

    root.present().map_err(|e| anyhow::anyhow!("render error: {e}"))?;
    tracing::debug!("Wrote figure '{}'", path.display());
    Ok(())
}

fn draw_panel<DB, F>(area: &DrawingArea<DB, plotters::coord::Shift>, values: &[f32], width: usize, color: F) -> Result<()>
where
    DB: DrawingBackend,
    F: Fn(f32) -> RGBColor,
{
    let px = CELL_PX as i32;
    for (i, &v) in values.iter().enumerate() {
        let (r, c) = ((i / width) as i32, (i % width) as i32);
        let rect = Rectangle::new([(c * px, r * px), ((c + 1) * px, (r + 1) * px)], color(v).filled());
        area.draw(&rect).map_err(|e| anyhow::anyhow!("draw error: {e}"))?;
    }
    Ok(())
}

/// -1 → blue, 0 → white, 1 → red
fn diverging_color(norm: f32) -> RGBColor {
    let t = norm.clamp(-1.0, 1.0);
    let fade = |x: f32| (255.0 * (1.0 - x)) as u8;
    if t >= 0.0 {
        RGBColor(255, fade(t), fade(t))
    } else {
        RGBColor(fade(-t), fade(-t), 255)
    }
}

/// 0 → dark blue, 1 → yellow
fn sequential_color(norm: f32) -> RGBColor {
    let t = norm.clamp(0.0, 1.0);
    RGBColor((255.0 * t) as u8, (40.0 + 200.0 * t) as u8, (120.0 * (1.0 - t)) as u8)
}
