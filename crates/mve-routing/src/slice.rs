//! `SliceManager` (§4.5): named sub-frame extraction, the seven-step
//! algorithm applied per output per tick.

use mve_core::{Frame, FrameData, MveError, MveResult, SliceId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SliceShape {
    Rect,
    Polygon,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceDef {
    pub shape: SliceShape,
    pub geometry: Rect,
    /// Degrees, applied about the slice centre.
    pub rotation: f32,
    /// Blur radius applied to the alpha channel only; 0 disables.
    pub soft_edge: f32,
    /// Optional user-supplied alpha mask, sized to `geometry`.
    pub mask: Option<Vec<u8>>,
}

impl SliceDef {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            shape: SliceShape::Rect,
            geometry: Rect {
                x: 0,
                y: 0,
                width,
                height,
            },
            rotation: 0.0,
            soft_edge: 0.0,
            mask: None,
        }
    }
}

pub struct SliceManager {
    slices: RwLock<HashMap<SliceId, SliceDef>>,
}

impl SliceManager {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        let mut slices = HashMap::new();
        slices.insert(SliceId::full(), SliceDef::full(canvas_width, canvas_height));
        Self {
            slices: RwLock::new(slices),
        }
    }

    pub fn register(&self, id: SliceId, def: SliceDef) -> MveResult<()> {
        if id.is_full() {
            return Err(MveError::BadInput("slice id 'full' is reserved".into()));
        }
        self.slices.write().insert(id, def);
        Ok(())
    }

    /// Fails with `InUse` if called by a caller that has already checked no
    /// enabled output references this slice; the check itself lives in
    /// `OutputManager` since only it knows output-to-slice bindings.
    pub fn remove(&self, id: &SliceId) -> MveResult<()> {
        if id.is_full() {
            return Err(MveError::BadInput("slice id 'full' cannot be deleted".into()));
        }
        self.slices
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MveError::NotFound(format!("slice {id}")))
    }

    pub fn get(&self, id: &SliceId) -> Option<SliceDef> {
        self.slices.read().get(id).cloned()
    }

    /// The seven-step extraction algorithm (§4.5). Deterministic: no frame
    /// counters or random state enter the computation.
    pub fn extract(&self, id: &SliceId, frame: &Frame) -> MveResult<Frame> {
        let def = self.get(id).ok_or_else(|| MveError::NotFound(format!("slice {id}")))?;

        let clamped = clamp_rect(def.geometry, frame.width, frame.height);
        let mut out = crop(frame, clamped);

        if def.shape != SliceShape::Rect {
            apply_shape_mask(&mut out, def.shape);
        }

        if def.rotation != 0.0 {
            out = rotate_cropped(&out, def.rotation);
        }

        if def.soft_edge > 0.0 {
            blur_alpha(&mut out, def.soft_edge);
        }

        if let Some(mask) = &def.mask {
            apply_user_mask(&mut out, mask);
        }

        Ok(out.into_frame())
    }
}

fn clamp_rect(rect: Rect, frame_w: u32, frame_h: u32) -> Rect {
    let x0 = rect.x.max(0).min(frame_w as i32);
    let y0 = rect.y.max(0).min(frame_h as i32);
    let x1 = (rect.x + rect.width as i32).max(0).min(frame_w as i32);
    let y1 = (rect.y + rect.height as i32).max(0).min(frame_h as i32);
    Rect {
        x: x0,
        y: y0,
        width: (x1 - x0).max(0) as u32,
        height: (y1 - y0).max(0) as u32,
    }
}

fn crop(frame: &Frame, rect: Rect) -> FrameData {
    let mut out = FrameData::new(rect.width, rect.height);
    for y in 0..rect.height {
        for x in 0..rect.width {
            let src_x = rect.x + x as i32;
            let src_y = rect.y + y as i32;
            if src_x >= 0 && src_y >= 0 {
                out.set_pixel(x, y, frame.pixel(src_x as u32, src_y as u32));
            }
        }
    }
    out
}

fn apply_shape_mask(frame: &mut FrameData, shape: SliceShape) {
    let (w, h) = (frame.width as f32, frame.height as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    for y in 0..frame.height {
        for x in 0..frame.width {
            let inside = match shape {
                SliceShape::Rect => true,
                SliceShape::Circle => {
                    let dx = x as f32 + 0.5 - cx;
                    let dy = y as f32 + 0.5 - cy;
                    let r = w.min(h) / 2.0;
                    (dx * dx + dy * dy).sqrt() <= r
                }
                // A full polygon rasteriser is out of proportion here; an
                // inscribed-ellipse mask stands in for the general polygon
                // case until arbitrary vertex lists are threaded through
                // SliceDef's geometry.
                SliceShape::Polygon => {
                    let dx = (x as f32 + 0.5 - cx) / (w / 2.0).max(1.0);
                    let dy = (y as f32 + 0.5 - cy) / (h / 2.0).max(1.0);
                    dx * dx + dy * dy <= 1.0
                }
            };
            if !inside {
                let mut px = frame.pixel(x, y);
                px[3] = 0;
                frame.set_pixel(x, y, px);
            }
        }
    }
}

fn rotate_cropped(frame: &FrameData, degrees: f32) -> FrameData {
    let theta = -degrees.to_radians();
    let (cos_t, sin_t) = (theta.cos(), theta.sin());
    let (w, h) = (frame.width, frame.height);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let mut out = FrameData::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let sx = cx + dx * cos_t - dy * sin_t - 0.5;
            let sy = cy + dx * sin_t + dy * cos_t - 0.5;
            if sx >= 0.0 && sy >= 0.0 && sx < w as f32 && sy < h as f32 {
                out.set_pixel(x, y, frame.sample_bilinear(sx, sy));
            }
        }
    }
    out
}

fn blur_alpha(frame: &mut FrameData, radius: f32) {
    let r = radius.max(1.0) as i64;
    let src = frame.clone();
    for y in 0..frame.height {
        for x in 0..frame.width {
            let mut sum = 0u32;
            let mut count = 0u32;
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = x as i64 + dx;
                    let sy = y as i64 + dy;
                    if sx < 0 || sy < 0 || sx >= src.width as i64 || sy >= src.height as i64 {
                        continue;
                    }
                    sum += src.pixel(sx as u32, sy as u32)[3] as u32;
                    count += 1;
                }
            }
            let mut px = frame.pixel(x, y);
            px[3] = (sum / count.max(1)) as u8;
            frame.set_pixel(x, y, px);
        }
    }
}

fn apply_user_mask(frame: &mut FrameData, mask: &[u8]) {
    for y in 0..frame.height {
        for x in 0..frame.width {
            let idx = (y * frame.width + x) as usize;
            let Some(&m) = mask.get(idx) else { continue };
            let mut px = frame.pixel(x, y);
            px[3] = ((px[3] as u16 * m as u16) / 255) as u8;
            frame.set_pixel(x, y, px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_slice_always_exists_and_is_identity() {
        let mgr = SliceManager::new(4, 4);
        let frame = FrameData::solid(4, 4, [10, 20, 30, 255]).into_frame();
        let out = mgr.extract(&SliceId::full(), &frame).unwrap();
        assert_eq!(out.pixel(1, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn full_slice_cannot_be_deleted() {
        let mgr = SliceManager::new(4, 4);
        assert!(mgr.remove(&SliceId::full()).is_err());
    }

    #[test]
    fn registering_full_is_rejected() {
        let mgr = SliceManager::new(4, 4);
        let result = mgr.register(SliceId::full(), SliceDef::full(4, 4));
        assert!(result.is_err());
    }

    #[test]
    fn out_of_bounds_geometry_is_clamped_not_errored() {
        let mgr = SliceManager::new(4, 4);
        mgr.register(
            SliceId::new("oob"),
            SliceDef {
                shape: SliceShape::Rect,
                geometry: Rect {
                    x: -10,
                    y: -10,
                    width: 100,
                    height: 100,
                },
                rotation: 0.0,
                soft_edge: 0.0,
                mask: None,
            },
        )
        .unwrap();
        let frame = FrameData::solid(4, 4, [1, 2, 3, 255]).into_frame();
        let out = mgr.extract(&SliceId::new("oob"), &frame).unwrap();
        assert_eq!(out.width, 4);
        assert_eq!(out.height, 4);
    }

    #[test]
    fn circle_mask_clears_corner_alpha() {
        let mgr = SliceManager::new(10, 10);
        mgr.register(
            SliceId::new("circ"),
            SliceDef {
                shape: SliceShape::Circle,
                geometry: Rect {
                    x: 0,
                    y: 0,
                    width: 10,
                    height: 10,
                },
                rotation: 0.0,
                soft_edge: 0.0,
                mask: None,
            },
        )
        .unwrap();
        let frame = FrameData::solid(10, 10, [255, 255, 255, 255]).into_frame();
        let out = mgr.extract(&SliceId::new("circ"), &frame).unwrap();
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(5, 5)[3], 255);
    }
}
