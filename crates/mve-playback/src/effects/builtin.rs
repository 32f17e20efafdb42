//! Concrete built-in effects.
//!
//! Each is a small typed-parameter unit implementing one trait method,
//! grounded in the teacher's `daw-backend::effects` idiom (`gain.rs`,
//! `pan.rs`, `eq.rs`: one struct per effect, parameters read by name,
//! `apply` producing a new buffer) translated from per-sample DSP to
//! per-pixel frame transforms.

use super::Effect;
use mve_core::{Frame, FrameData};
use mve_registry::{EffectInstance, ParamSpec, ParamValue};
use std::sync::Arc;

pub fn all() -> Vec<Arc<dyn Effect>> {
    vec![
        Arc::new(BrightnessContrast),
        Arc::new(HueRotate),
        Arc::new(GaussianBlur),
        Arc::new(ChromaKey),
        Arc::new(Invert),
        Arc::new(Mirror),
    ]
}

fn f(instance: &EffectInstance, name: &str, default: f64) -> f64 {
    instance.param(name).map(|p| p.value.as_f64()).unwrap_or(default)
}

fn b(instance: &EffectInstance, name: &str, default: bool) -> bool {
    instance
        .param(name)
        .map(|p| matches!(p.value, ParamValue::Bool(true)))
        .unwrap_or(default)
}

pub struct BrightnessContrast;
impl Effect for BrightnessContrast {
    fn plugin_id(&self) -> &'static str {
        "brightness_contrast"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("brightness", ParamValue::Float(0.0), ParamValue::Float(-255.0), ParamValue::Float(255.0)),
            ParamSpec::new("contrast", ParamValue::Float(1.0), ParamValue::Float(0.0), ParamValue::Float(4.0)),
        ]
    }

    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String> {
        let brightness = f(instance, "brightness", 0.0) as f32;
        let contrast = f(instance, "contrast", 1.0) as f32;
        if brightness == 0.0 && contrast == 1.0 {
            return Ok(frame.clone());
        }
        let mut out = (**frame).clone();
        for px in out.bytes.chunks_exact_mut(4) {
            for c in 0..3 {
                let v = (px[c] as f32 - 128.0) * contrast + 128.0 + brightness;
                px[c] = v.clamp(0.0, 255.0) as u8;
            }
        }
        Ok(out.into_frame())
    }
}

pub struct HueRotate;
impl Effect for HueRotate {
    fn plugin_id(&self) -> &'static str {
        "hue_rotate"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("degrees", ParamValue::Float(0.0), ParamValue::Float(0.0), ParamValue::Float(360.0))]
    }

    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String> {
        let degrees = f(instance, "degrees", 0.0);
        if degrees == 0.0 {
            return Ok(frame.clone());
        }
        let theta = degrees.to_radians();
        let (cos_a, sin_a) = (theta.cos(), theta.sin());
        // Standard YIQ hue-rotation matrix.
        let mut out = (**frame).clone();
        for px in out.bytes.chunks_exact_mut(4) {
            let (r, g, bl) = (px[0] as f64, px[1] as f64, px[2] as f64);
            let nr = (0.299 + cos_a * 0.701 + sin_a * 0.168) * r
                + (0.587 - cos_a * 0.587 + sin_a * 0.330) * g
                + (0.114 - cos_a * 0.114 - sin_a * 0.497) * bl;
            let ng = (0.299 - cos_a * 0.299 - sin_a * 0.328) * r
                + (0.587 + cos_a * 0.413 + sin_a * 0.035) * g
                + (0.114 - cos_a * 0.114 + sin_a * 0.292) * bl;
            let nb = (0.299 - cos_a * 0.3 + sin_a * 1.25) * r
                + (0.587 - cos_a * 0.588 - sin_a * 1.05) * g
                + (0.114 + cos_a * 0.886 - sin_a * 0.203) * bl;
            px[0] = nr.clamp(0.0, 255.0) as u8;
            px[1] = ng.clamp(0.0, 255.0) as u8;
            px[2] = nb.clamp(0.0, 255.0) as u8;
        }
        Ok(out.into_frame())
    }
}

pub struct GaussianBlur;
impl Effect for GaussianBlur {
    fn plugin_id(&self) -> &'static str {
        "gaussian_blur"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("radius", ParamValue::Float(0.0), ParamValue::Float(0.0), ParamValue::Float(32.0))]
    }

    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String> {
        let radius = f(instance, "radius", 0.0);
        if radius <= 0.0 {
            return Ok(frame.clone());
        }
        Ok(box_blur(frame, radius as u32).into_frame())
    }
}

/// Two-pass box blur approximating a Gaussian; cheap enough to run per-tick
/// for the small radii the parameter range allows (§4.13).
fn box_blur(frame: &Frame, radius: u32) -> FrameData {
    let radius = radius.max(1);
    let horiz = box_blur_pass(frame, radius, true);
    box_blur_pass(&horiz.into_frame(), radius, false)
}

fn box_blur_pass(frame: &Frame, radius: u32, horizontal: bool) -> FrameData {
    let mut out = FrameData::new(frame.width, frame.height);
    let r = radius as i64;
    for y in 0..frame.height {
        for x in 0..frame.width {
            let mut sum = [0u32; 4];
            let mut count = 0u32;
            for d in -r..=r {
                let (sx, sy) = if horizontal {
                    (x as i64 + d, y as i64)
                } else {
                    (x as i64, y as i64 + d)
                };
                if sx < 0 || sy < 0 || sx >= frame.width as i64 || sy >= frame.height as i64 {
                    continue;
                }
                let px = frame.pixel(sx as u32, sy as u32);
                for c in 0..4 {
                    sum[c] += px[c] as u32;
                }
                count += 1;
            }
            let mut avg = [0u8; 4];
            for c in 0..4 {
                avg[c] = (sum[c] / count.max(1)) as u8;
            }
            out.set_pixel(x, y, avg);
        }
    }
    out
}

pub struct ChromaKey;
impl Effect for ChromaKey {
    fn plugin_id(&self) -> &'static str {
        "chroma_key"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "threshold",
            ParamValue::Float(60.0),
            ParamValue::Float(0.0),
            ParamValue::Float(255.0),
        )]
    }

    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String> {
        let threshold = f(instance, "threshold", 60.0) as f32;
        let mut out = (**frame).clone();
        // Green-screen key: pixels close to pure green become transparent.
        for px in out.bytes.chunks_exact_mut(4) {
            let dist = ((px[0] as f32 - 0.0).powi(2)
                + (px[1] as f32 - 255.0).powi(2)
                + (px[2] as f32 - 0.0).powi(2))
            .sqrt();
            if dist < threshold {
                px[3] = 0;
            }
        }
        Ok(out.into_frame())
    }
}

pub struct Invert;
impl Effect for Invert {
    fn plugin_id(&self) -> &'static str {
        "invert"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("enabled", ParamValue::Bool(true), ParamValue::Bool(false), ParamValue::Bool(true))]
    }

    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String> {
        if !b(instance, "enabled", true) {
            return Ok(frame.clone());
        }
        let mut out = (**frame).clone();
        for px in out.bytes.chunks_exact_mut(4) {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        }
        Ok(out.into_frame())
    }
}

pub struct Mirror;
impl Effect for Mirror {
    fn plugin_id(&self) -> &'static str {
        "mirror"
    }

    fn param_specs(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new(
            "horizontal",
            ParamValue::Bool(true),
            ParamValue::Bool(false),
            ParamValue::Bool(true),
        )]
    }

    fn apply(&self, frame: &Frame, instance: &EffectInstance) -> Result<Frame, String> {
        let horizontal = b(instance, "horizontal", true);
        let mut out = FrameData::new(frame.width, frame.height);
        for y in 0..frame.height {
            for x in 0..frame.width {
                let (sx, sy) = if horizontal {
                    (frame.width - 1 - x, y)
                } else {
                    (x, frame.height - 1 - y)
                };
                out.set_pixel(x, y, frame.pixel(sx, sy));
            }
        }
        Ok(out.into_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mve_registry::EffectParameter;

    fn instance(plugin: &str, params: Vec<(&str, ParamValue)>) -> EffectInstance {
        let mut ei = EffectInstance::new(plugin, vec![]);
        for (name, value) in params {
            ei.parameters.push(EffectParameter::new(
                name,
                mve_core::Uid::new("u"),
                value,
                ParamValue::Float(f64::MIN),
                ParamValue::Float(f64::MAX),
            ));
        }
        ei
    }

    #[test]
    fn brightness_contrast_identity_returns_same_buffer() {
        let frame = FrameData::solid(2, 2, [10, 20, 30, 255]).into_frame();
        let effect = BrightnessContrast;
        let inst = instance(
            "brightness_contrast",
            vec![("brightness", ParamValue::Float(0.0)), ("contrast", ParamValue::Float(1.0))],
        );
        let out = effect.apply(&frame, &inst).unwrap();
        assert!(std::sync::Arc::ptr_eq(&frame, &out));
    }

    #[test]
    fn invert_flips_channels() {
        let frame = FrameData::solid(1, 1, [10, 20, 30, 255]).into_frame();
        let effect = Invert;
        let inst = instance("invert", vec![("enabled", ParamValue::Bool(true))]);
        let out = effect.apply(&frame, &inst).unwrap();
        assert_eq!(out.pixel(0, 0), [245, 235, 225, 255]);
    }

    #[test]
    fn mirror_horizontal_swaps_columns() {
        let mut data = FrameData::new(2, 1);
        data.set_pixel(0, 0, [1, 0, 0, 255]);
        data.set_pixel(1, 0, [0, 1, 0, 255]);
        let frame = data.into_frame();
        let effect = Mirror;
        let inst = instance("mirror", vec![("horizontal", ParamValue::Bool(true))]);
        let out = effect.apply(&frame, &inst).unwrap();
        assert_eq!(out.pixel(0, 0), [0, 1, 0, 255]);
        assert_eq!(out.pixel(1, 0), [1, 0, 0, 255]);
    }
}
