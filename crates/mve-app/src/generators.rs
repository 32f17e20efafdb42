//! Maps a `ClipSource` to a concrete `FrameDecoder`.
//!
//! Generator ids are small colon-separated strings so they can be typed at
//! the command prompt: `solid:r,g,b,a`, `bars`, `checker:cell`,
//! `gradient:r,g,b,a:r,g,b,a`. Unrecognised ids fall back to a mid-grey
//! solid so a typo doesn't take the whole command down.

use mve_decode::procedural::{GeneratorKind, ProceduralDecoder};
use mve_decode::FrameDecoder;
use mve_registry::ClipSource;

pub fn build_decoder(source: &ClipSource, duration: u64, width: u32, height: u32) -> anyhow::Result<Box<dyn FrameDecoder>> {
    match source {
        ClipSource::Path(path) => build_file_decoder(path),
        ClipSource::Generator(id) => Ok(Box::new(ProceduralDecoder::new(parse_generator(id), width, height, duration))),
    }
}

fn parse_generator(id: &str) -> GeneratorKind {
    let mut parts = id.split(':');
    match parts.next().unwrap_or("") {
        "solid" => GeneratorKind::SolidColor(parse_rgba(parts.next()).unwrap_or([128, 128, 128, 255])),
        "bars" => GeneratorKind::ColorBars,
        "checker" => GeneratorKind::Checkerboard {
            cell: parts.next().and_then(|s| s.parse().ok()).unwrap_or(16),
        },
        "gradient" => GeneratorKind::Gradient {
            from: parse_rgba(parts.next()).unwrap_or([0, 0, 0, 255]),
            to: parse_rgba(parts.next()).unwrap_or([255, 255, 255, 255]),
        },
        other => {
            log::warn!("unknown generator '{other}', falling back to a mid-grey solid");
            GeneratorKind::SolidColor([128, 128, 128, 255])
        }
    }
}

fn parse_rgba(spec: Option<&str>) -> Option<[u8; 4]> {
    let spec = spec?;
    let mut channels = spec.split(',').map(|c| c.parse::<u8>().ok());
    Some([channels.next()??, channels.next()??, channels.next()??, channels.next()??])
}

#[cfg(not(feature = "ffmpeg"))]
fn build_file_decoder(_path: &str) -> anyhow::Result<Box<dyn FrameDecoder>> {
    anyhow::bail!("file-backed clips require the 'ffmpeg' feature")
}

#[cfg(feature = "ffmpeg")]
fn build_file_decoder(path: &str) -> anyhow::Result<Box<dyn FrameDecoder>> {
    Ok(Box::new(mve_decode::file::FileFrameDecoder::open(path, 32)?))
}
