use anyhow::{bail, Context, Result};
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::rank::{ranked_words, RankedEntry};
use crate::report::{write_atomic, RunStamp};

const FALLBACK_FONT_FAMILY: &str = "sans-serif";
const EMBEDDED_FONT_FAMILY: &str = "CloudFont";
const MIN_FONT_PX: f32 = 10.0;
const SHRINK: f32 = 0.85;
const SPIRAL_STEP: f32 = 0.1;
const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CloudOptions {
    pub max_words: usize,
    pub width: u32,
    pub height: u32,
    pub background: String,
    /// `None` means render with the fallback font family.
    pub font: Option<PathBuf>,
}

impl CloudOptions {
    /// Options from settings; a configured font that does not exist is dropped.
    pub fn from_settings(settings: &Settings) -> Self {
        let font = PathBuf::from(&settings.font_path);
        let font = if font.exists() {
            Some(font)
        } else {
            warn!(
                "Font file not found, falling back to default font - path={}",
                font.display()
            );
            None
        };
        Self {
            max_words: settings.wordcloud_max_words,
            width: settings.wordcloud_width,
            height: settings.wordcloud_height,
            background: settings.wordcloud_background_color.clone(),
            font,
        }
    }
}

/// A rendered image, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

pub trait CloudRenderer {
    fn render(&self, words: &[(&str, u64)], options: &CloudOptions) -> Result<CloudImage>;
}

/// What happened to the word cloud; none of these abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudOutcome {
    Saved(PathBuf),
    /// Rendered (and possibly shown) but saving was disabled.
    Rendered,
    NoData,
    Failed(String),
}

impl CloudOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            CloudOutcome::Saved(p) => Some(p),
            _ => None,
        }
    }
}

/// Render the ranked words (pseudo-labels excluded) and persist/show per settings.
pub fn generate_wordcloud(
    ranked: &[RankedEntry],
    settings: &Settings,
    renderer: &dyn CloudRenderer,
    out_dir: &Path,
    stamp: &RunStamp,
) -> CloudOutcome {
    let words: Vec<(&str, u64)> = ranked_words(ranked).collect();
    if words.is_empty() {
        info!("Not enough data for a word cloud");
        return CloudOutcome::NoData;
    }

    match try_generate(&words, settings, renderer, out_dir, stamp) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Word cloud generation failed - {:#}", e);
            CloudOutcome::Failed(format!("{:#}", e))
        }
    }
}

fn try_generate(
    words: &[(&str, u64)],
    settings: &Settings,
    renderer: &dyn CloudRenderer,
    out_dir: &Path,
    stamp: &RunStamp,
) -> Result<CloudOutcome> {
    let start = std::time::Instant::now();
    let options = CloudOptions::from_settings(settings);
    let image = renderer.render(words, &options)?;
    debug!(
        "Word cloud rendered - duration={:.2}s, words={}, bytes={}",
        start.elapsed().as_secs_f32(),
        words.len().min(options.max_words),
        image.bytes.len()
    );

    let file_name = format!("词云_{}.{}", stamp.file_suffix(), image.extension);
    let saved = if settings.save_wordcloud {
        let path = out_dir.join(&file_name);
        write_image(&path, &image.bytes)?;
        info!("Word cloud saved - path={}", path.display());
        Some(path)
    } else {
        None
    };

    if settings.show_wordcloud {
        let shown = match &saved {
            Some(p) => p.clone(),
            None => {
                let tmp = preview_path(image.extension);
                write_image(&tmp, &image.bytes)?;
                tmp
            }
        };
        if let Err(e) = open_in_viewer(&shown) {
            warn!("Could not display word cloud - {:#}", e);
        }
    }

    Ok(match saved {
        Some(p) => CloudOutcome::Saved(p),
        None => CloudOutcome::Rendered,
    })
}

/// Display-only copy when saving is off. The viewer runs detached and may read
/// the file after we exit, so it is kept, and each run overwrites the last one.
fn preview_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("chat_freq_wordcloud.{}", extension))
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic(path, bytes)
}

fn open_in_viewer(path: &Path) -> Result<()> {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(path)
        .spawn()
        .with_context(|| format!("spawn viewer for {:?}", path))?;
    Ok(())
}

/* -------------------------------------------------------------------------- */
/* SVG renderer                                                               */
/* -------------------------------------------------------------------------- */

/// Frequency-weighted SVG cloud laid out along an Archimedean spiral.
#[derive(Debug, Clone, Copy)]
pub struct SvgCloudRenderer {
    pub max_font_px: f32,
}

impl Default for SvgCloudRenderer {
    fn default() -> Self {
        Self { max_font_px: 96.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect {
    fn overlaps(&self, o: &Rect) -> bool {
        self.x < o.x + o.w && o.x < self.x + self.w && self.y < o.y + o.h && o.y < self.y + self.h
    }

    fn inside(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x + self.w <= width && self.y + self.h <= height
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Placed<'a> {
    word: &'a str,
    size: f32,
    rect: Rect,
    color: &'static str,
}

fn text_width(word: &str, size: f32) -> f32 {
    word.chars()
        .map(|c| if c.is_ascii() { 0.6 } else { 1.0 })
        .sum::<f32>()
        * size
}

impl SvgCloudRenderer {
    fn font_size(&self, count: u64, lo: u64, hi: u64) -> f32 {
        if hi == lo {
            return self.max_font_px;
        }
        let t = (count - lo) as f32 / (hi - lo) as f32;
        MIN_FONT_PX + t * (self.max_font_px - MIN_FONT_PX)
    }

    fn layout<'a>(&self, words: &[(&'a str, u64)], options: &CloudOptions) -> Vec<Placed<'a>> {
        let (w, h) = (options.width as f32, options.height as f32);
        let (cx, cy) = (w / 2.0, h / 2.0);
        // radius == t, so nothing past the half-diagonal can land on the canvas
        let max_t = cx.hypot(cy);

        let mut words: Vec<(&'a str, u64)> = words.to_vec();
        words.sort_by(|a, b| b.1.cmp(&a.1));
        words.truncate(options.max_words);
        let hi = words.first().map(|(_, c)| *c).unwrap_or(0);
        let lo = words.last().map(|(_, c)| *c).unwrap_or(0);

        let mut placed: Vec<Placed<'a>> = Vec::with_capacity(words.len());
        for (i, (word, count)) in words.into_iter().enumerate() {
            let mut size = self.font_size(count, lo, hi);
            'sizes: while size >= MIN_FONT_PX {
                let (bw, bh) = (text_width(word, size), size);
                let mut t = 0.0f32;
                while t < max_t {
                    let rect = Rect {
                        x: cx + t * t.cos() - bw / 2.0,
                        y: cy + t * t.sin() - bh / 2.0,
                        w: bw,
                        h: bh,
                    };
                    if rect.inside(w, h) && !placed.iter().any(|p| p.rect.overlaps(&rect)) {
                        placed.push(Placed {
                            word,
                            size,
                            rect,
                            color: PALETTE[i % PALETTE.len()],
                        });
                        break 'sizes;
                    }
                    t += SPIRAL_STEP;
                }
                size *= SHRINK;
            }
        }
        placed
    }
}

impl CloudRenderer for SvgCloudRenderer {
    fn render(&self, words: &[(&str, u64)], options: &CloudOptions) -> Result<CloudImage> {
        if options.width == 0 || options.height == 0 {
            bail!("invalid canvas {}x{}", options.width, options.height);
        }
        let placed = self.layout(words, options);
        let skipped = words.len().min(options.max_words) - placed.len();
        if skipped > 0 {
            debug!("Word cloud layout skipped {} words that did not fit", skipped);
        }

        let family = match &options.font {
            Some(_) => format!("'{}', {}", EMBEDDED_FONT_FAMILY, FALLBACK_FONT_FAMILY),
            None => FALLBACK_FONT_FAMILY.to_string(),
        };

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = options.width,
            h = options.height
        )?;
        if let Some(font) = &options.font {
            let url = font.canonicalize().unwrap_or_else(|_| font.clone());
            writeln!(
                svg,
                "<style>@font-face {{ font-family: '{}'; src: url('file://{}'); }}</style>",
                EMBEDDED_FONT_FAMILY,
                xml_escape(&url.to_string_lossy().replace('\\', "/"))
            )?;
        }
        writeln!(
            svg,
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            xml_escape(&options.background)
        )?;
        for p in &placed {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{:.1}" fill="{}">{}</text>"#,
                p.rect.x,
                p.rect.y + p.rect.h * 0.85,
                xml_escape(&family),
                p.size,
                p.color,
                xml_escape(p.word)
            )?;
        }
        svg.push_str("</svg>\n");

        Ok(CloudImage {
            bytes: svg.into_bytes(),
            extension: "svg",
        })
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
