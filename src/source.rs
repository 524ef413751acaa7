//! Graphic sources and the rule that sizes them for the screen.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Image,
    Video,
}

/// A resolved graphic source with its natural pixel size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphicSource {
    pub kind: SourceKind,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl GraphicSource {
    /// Whether a video source has played to its end and must be rewound to
    /// keep looping. Always `false` for images.
    pub fn should_rewind(&self, position: Duration, duration: Duration) -> bool {
        self.kind == SourceKind::Video && position >= duration
    }
}

/// How far a playing video has got, as reported by the host's player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Playback {
    pub position: Duration,
    pub duration: Duration,
}

/// Resolves a source identifier to a [`GraphicSource`].
pub trait SourceLoader {
    fn load(&self, url: &str) -> Result<GraphicSource, SourceError>;
}

/// Loads still images from the local filesystem, reading only the header.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl SourceLoader for ImageFileLoader {
    fn load(&self, url: &str) -> Result<GraphicSource, SourceError> {
        let (width, height) =
            image::image_dimensions(Path::new(url)).map_err(|source| SourceError::Unreadable {
                path: url.into(),
                source,
            })?;
        Ok(GraphicSource {
            kind: SourceKind::Image,
            url: url.to_string(),
            width,
            height,
        })
    }
}

/// A loader that always hands back the same, already known source.
#[derive(Clone, Debug)]
pub struct KnownSource(pub GraphicSource);

impl SourceLoader for KnownSource {
    fn load(&self, url: &str) -> Result<GraphicSource, SourceError> {
        Ok(GraphicSource {
            url: url.to_string(),
            ..self.0.clone()
        })
    }
}

/// How the source is resized before it is cut.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum ScalePolicy {
    /// Shrink to the available area only when the source does not fit.
    #[default]
    AutoShrinkIfLarger,
    /// Use the natural size.
    KeepOriginal,
    /// Always scale to the available area.
    FitWindow,
}

impl ScalePolicy {
    /// Numeric code used by older saved states and the query-string form.
    pub fn code(self) -> u8 {
        match self {
            ScalePolicy::AutoShrinkIfLarger => 0,
            ScalePolicy::KeepOriginal => 1,
            ScalePolicy::FitWindow => 2,
        }
    }
}

impl TryFrom<u8> for ScalePolicy {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ScalePolicy::AutoShrinkIfLarger),
            1 => Ok(ScalePolicy::KeepOriginal),
            2 => Ok(ScalePolicy::FitWindow),
            other => Err(other),
        }
    }
}

/// The host window and where the puzzle zone sits inside it.
///
/// `margin_*` is the zone's offset before it was sized, `padding_*` after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub margin_x: i32,
    pub margin_y: i32,
    pub padding_x: i32,
    pub padding_y: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            margin_x: 0,
            margin_y: 0,
            padding_x: 0,
            padding_y: 0,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Room left for the puzzle once the zone's margins are taken off both
    /// sides. May be zero or negative on tiny windows.
    pub fn available(&self) -> (i64, i64) {
        (
            self.width as i64 - 2 * self.margin_x as i64,
            self.height as i64 - 2 * self.margin_y as i64,
        )
    }
}

/// Applies `policy` to a `width x height` source, preserving its aspect
/// ratio. Fractional results are truncated to whole pixels.
pub fn scaled_size(width: u32, height: u32, policy: ScalePolicy, viewport: &Viewport) -> (u32, u32) {
    let (available_w, available_h) = viewport.available();
    let too_large = width as i64 > available_w || height as i64 > available_h;
    let resize = match policy {
        ScalePolicy::KeepOriginal => false,
        ScalePolicy::FitWindow => true,
        ScalePolicy::AutoShrinkIfLarger => too_large,
    };
    if !resize {
        return (width, height);
    }

    let (w, h) = (width as f64, height as f64);
    let (available_w, available_h) = (available_w.max(0) as f64, available_h.max(0) as f64);
    let height_ratio = available_h / h;
    let width_ratio = available_w / w;

    let (w, h) = if h * width_ratio > available_h {
        (w * height_ratio, available_h)
    } else {
        (available_w, h * width_ratio)
    };
    (w as u32, h as u32)
}
