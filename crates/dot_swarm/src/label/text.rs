//! Word wrapping and text measurement for cluster labels.
//!
//! There is no font rasterizer in the engine, so label boxes are sized from a
//! proportional character width table. Hosts with real text metrics plug in
//! their own [`TextMeasure`].

/// Width used for characters missing from the table.
pub const DEFAULT_CHAR_WIDTH: f32 = 7.0;

/// Default distance between label baselines.
pub const DEFAULT_LINE_HEIGHT: f32 = 17.0;

/// Approximate advance width of a character in the label font.
pub fn char_width(c: char) -> f32 {
    match c {
        'A' | 'a' | 'b' | 'd' | 'E' | 'e' | 'F' | 'g' | 'h' | 'L' | 'n' | 'o' | 'p' | 'q' | 'T'
        | 'u' | 'V' | 'X' | 'Y' | 'Z' => 7.0,
        'B' | 'C' | 'K' | 'P' | 'R' | 'S' => 8.0,
        'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'U' => 9.0,
        'M' | 'm' | 'W' => 11.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' => 6.0,
        'J' | 'z' => 5.0,
        'f' | 'r' | 't' => 4.0,
        'I' | 'i' | 'j' | 'l' => 3.0,
        'w' => 9.0,
        '.' | ',' | ':' | ';' => 2.0,
        _ => DEFAULT_CHAR_WIDTH,
    }
}

fn text_width(s: &str, monospace: bool) -> f32 {
    if monospace {
        s.chars().count() as f32 * DEFAULT_CHAR_WIDTH
    } else {
        s.chars().map(char_width).sum()
    }
}

/// Wraps `line` into lines of roughly `max_chars` average-width characters.
///
/// Words split on spaces and after hyphens. A line only breaks once it is wider
/// than `min_chars`; when `min_chars` is `None` it is derived from the median
/// word length.
pub fn wordwrap(line: &str, max_chars: usize, min_chars: Option<f32>, monospace: bool) -> Vec<String> {
    let spaced: Vec<&str> = line.split(' ').collect();
    let mut words: Vec<String> = Vec::new();
    for (i, s) in spaced.iter().enumerate() {
        let trailing = if i + 1 < spaced.len() { " " } else { "" };
        let parts: Vec<&str> = s.split('-').collect();
        for (j, part) in parts.iter().enumerate() {
            if j + 1 < parts.len() {
                words.push(format!("{part}-"));
            } else {
                words.push(format!("{part}{trailing}"));
            }
        }
    }

    let max_chars = if max_chars == 0 { 40 } else { max_chars } as f32;
    let min_chars = min_chars.or_else(|| {
        let mut lens: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
        lens.sort_unstable();
        lens.get(lens.len().div_ceil(2))
            .map(|&median| (0.75 * median as f32).min(max_chars * 0.5).max(3.0))
    });
    let max_line_w = max_chars * DEFAULT_CHAR_WIDTH;
    // Without a usable median the line never breaks early.
    let min_line_w = min_chars.map_or(f32::INFINITY, |m| m * DEFAULT_CHAR_WIDTH);

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut l = 0.0;
    for word in &words {
        let ww = text_width(word, monospace);
        if l + ww > max_line_w && l > min_line_w {
            lines.push(std::mem::take(&mut current));
            l = 0.0;
        }
        l += ww;
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .into_iter()
        .map(|line| line.trim_end().to_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Measures wrapped label text.
pub trait TextMeasure {
    /// Returns `(width, height)` of the rendered lines.
    fn measure(&self, lines: &[String]) -> (f32, f32);
}

/// Table-driven estimate of proportional label text.
#[derive(Debug, Clone, Copy)]
pub struct CharWidthMeasure {
    pub line_height: f32,
    pub monospace: bool,
}

impl Default for CharWidthMeasure {
    fn default() -> Self {
        Self {
            line_height: DEFAULT_LINE_HEIGHT,
            monospace: false,
        }
    }
}

impl TextMeasure for CharWidthMeasure {
    fn measure(&self, lines: &[String]) -> (f32, f32) {
        let width = lines
            .iter()
            .map(|l| text_width(l, self.monospace))
            .fold(0.0f32, f32::max);
        (width, lines.len() as f32 * self.line_height)
    }
}
