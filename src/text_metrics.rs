//! Text width measurement used by the node sizer.
//!
//! The layout pipeline never measures text itself; it asks a [`TextMeasure`]
//! for the advance width of a single line. [`HeuristicMetrics`] is fully
//! deterministic and is what [`crate::layout::compute_layout`] uses.
//! [`FontMetrics`] resolves a real face from the system font database.

/// Width of one line of text rendered at `font_size` in `font_family`.
pub trait TextMeasure {
    fn line_width(&self, text: &str, font_size: f32, font_family: &str) -> f32;

    fn average_char_width(&self, font_size: f32, _font_family: &str) -> f32 {
        font_size * 0.56
    }
}

/// Per-glyph width factors calibrated against a 16px sans-serif baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMetrics;

impl TextMeasure for HeuristicMetrics {
    fn line_width(&self, text: &str, font_size: f32, _font_family: &str) -> f32 {
        if font_size <= 0.0 {
            return 0.0;
        }
        text.chars().map(char_width_factor).sum::<f32>() * font_size
    }
}

pub fn char_width_factor(ch: char) -> f32 {
    match ch {
        '\t' => 0.306 * 4.0,
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' => 0.652,
        'B' => 0.648,
        'C' => 0.734,
        'D' => 0.723,
        'E' => 0.594,
        'F' => 0.575,
        'G' | 'H' => 0.742,
        'I' => 0.272,
        'J' => 0.557,
        'K' => 0.648,
        'L' => 0.559,
        'M' => 0.903,
        'N' => 0.763,
        'O' => 0.754,
        'P' => 0.623,
        'Q' => 0.755,
        'R' => 0.637,
        'S' => 0.633,
        'T' => 0.599,
        'U' => 0.746,
        'V' => 0.661,
        'W' => 0.958,
        'X' => 0.655,
        'Y' => 0.646,
        'Z' => 0.621,
        'a' => 0.550,
        'b' => 0.603,
        'c' => 0.547,
        'd' => 0.609,
        'e' => 0.570,
        'f' => 0.340,
        'g' | 'h' => 0.600,
        'i' => 0.235,
        'j' => 0.227,
        'k' => 0.522,
        'l' => 0.239,
        'm' => 0.867,
        'n' | 'q' | 'u' => 0.585,
        'o' => 0.574,
        'p' => 0.595,
        'r' => 0.364,
        's' => 0.523,
        't' => 0.305,
        'v' => 0.545,
        'w' => 0.811,
        'x' => 0.538,
        'y' => 0.556,
        'z' => 0.550,
        '0' => 0.613,
        '1' => 0.396,
        '2' => 0.609,
        '3' => 0.597,
        '4' => 0.614,
        '5' => 0.586,
        '6' => 0.608,
        '7' => 0.559,
        '8' => 0.611,
        '9' => 0.595,
        '@' | '#' | '%' | '&' => 0.946,
        ch if is_wide(ch) => 1.0,
        _ => 0.568,
    }
}

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0x1F300..=0x1FAFF)
}

#[cfg(feature = "font-metrics")]
pub use font::FontMetrics;

#[cfg(feature = "font-metrics")]
mod font {
    use super::{HeuristicMetrics, TextMeasure};
    use fontdb::{Database, Family, Query, Stretch, Style, Weight};
    use once_cell::sync::Lazy;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use ttf_parser::Face;

    static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

    /// Measures with the advance widths of the best matching system face.
    /// Falls back to [`HeuristicMetrics`] when no face can be loaded.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FontMetrics;

    impl TextMeasure for FontMetrics {
        fn line_width(&self, text: &str, font_size: f32, font_family: &str) -> f32 {
            if text.is_empty() || font_size <= 0.0 {
                return 0.0;
            }
            let measured = FONT_CACHE
                .lock()
                .ok()
                .and_then(|mut cache| cache.measure(text, font_size, font_family));
            match measured {
                Some(width) => width,
                None => {
                    tracing::trace!(font_family, "no usable font face, using heuristic widths");
                    HeuristicMetrics.line_width(text, font_size, font_family)
                }
            }
        }

        fn average_char_width(&self, font_size: f32, font_family: &str) -> f32 {
            let sample = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
            self.line_width(sample, font_size, font_family) / sample.len() as f32
        }
    }

    struct LoadedFace {
        data: Vec<u8>,
        index: u32,
        units_per_em: f32,
        ascii_advances: [u16; 128],
    }

    struct FontCache {
        db: Database,
        loaded_system_fonts: bool,
        faces: HashMap<String, Option<LoadedFace>>,
    }

    impl FontCache {
        fn new() -> Self {
            Self {
                db: Database::new(),
                loaded_system_fonts: false,
                faces: HashMap::new(),
            }
        }

        fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
            let key = font_family.trim().to_string();
            if !self.faces.contains_key(&key) {
                let face = self.load_face(font_family);
                self.faces.insert(key.clone(), face);
            }
            let loaded = self.faces.get(&key)?.as_ref()?;
            let scale = font_size / loaded.units_per_em;
            let fallback = font_size * 0.56;

            if text.is_ascii() {
                let width = text
                    .bytes()
                    .filter(|byte| *byte != b'\n')
                    .map(|byte| match loaded.ascii_advances[byte as usize] {
                        0 => fallback,
                        advance => advance as f32 * scale,
                    })
                    .sum::<f32>();
                return Some(width);
            }

            let face = Face::parse(&loaded.data, loaded.index).ok()?;
            let width = text
                .chars()
                .filter(|ch| *ch != '\n')
                .map(|ch| {
                    face.glyph_index(ch)
                        .and_then(|glyph| face.glyph_hor_advance(glyph))
                        .map(|advance| advance as f32 * scale)
                        .unwrap_or(fallback)
                })
                .sum::<f32>();
            Some(width)
        }

        fn load_face(&mut self, font_family: &str) -> Option<LoadedFace> {
            let names: Vec<String> = font_family
                .split(',')
                .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|part| !part.is_empty())
                .collect();
            let mut families: Vec<Family<'_>> = names
                .iter()
                .map(|name| match name.to_ascii_lowercase().as_str() {
                    "serif" => Family::Serif,
                    "sans-serif" | "system-ui" | "ui-sans-serif" => Family::SansSerif,
                    "monospace" | "ui-monospace" => Family::Monospace,
                    "cursive" => Family::Cursive,
                    "fantasy" => Family::Fantasy,
                    _ => Family::Name(name.as_str()),
                })
                .collect();
            if families.is_empty() {
                families.push(Family::SansSerif);
            }

            if !self.loaded_system_fonts {
                self.db.load_system_fonts();
                self.loaded_system_fonts = true;
            }

            let query = Query {
                families: &families,
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let id = self.db.query(&query)?;
            self.db
                .with_face_data(id, |data, index| {
                    let face = Face::parse(data, index).ok()?;
                    let mut ascii_advances = [0u16; 128];
                    for byte in 0u8..=127 {
                        if let Some(glyph) = face.glyph_index(byte as char) {
                            ascii_advances[byte as usize] =
                                face.glyph_hor_advance(glyph).unwrap_or(0);
                        }
                    }
                    Some(LoadedFace {
                        data: data.to_vec(),
                        index,
                        units_per_em: face.units_per_em().max(1) as f32,
                        ascii_advances,
                    })
                })
                .flatten()
        }
    }
}
