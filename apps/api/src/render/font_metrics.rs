//! Static Helvetica metric tables for the PDF renderer.
//!
//! Character widths are in em units (relative to font size), taken from the Adobe
//! core-font AFM files. The base-14 fonts are never embedded, so these tables are
//! the only width information the layout has.
//!
//! Tables cover ASCII 0x20..=0x7E (95 printable characters). Index = (char as usize) - 32.
//! A handful of WinAnsi punctuation marks have explicit widths; everything else
//! outside ASCII falls back to `average_char_width`.

/// Base-14 fonts used by the renderer. The resource name is what content streams reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PdfFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl PdfFont {
    pub const ALL: [PdfFont; 3] = [
        PdfFont::Helvetica,
        PdfFont::HelveticaBold,
        PdfFont::HelveticaOblique,
    ];

    pub fn base_font(self) -> &'static str {
        match self {
            PdfFont::Helvetica => "Helvetica",
            PdfFont::HelveticaBold => "Helvetica-Bold",
            PdfFont::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    pub fn resource_name(self) -> &'static str {
        match self {
            PdfFont::Helvetica => "F1",
            PdfFont::HelveticaBold => "F2",
            PdfFont::HelveticaOblique => "F3",
        }
    }
}

/// Static character-width table for a font.
///
/// `widths[i]` = width of ASCII character `(i + 32)`, covering 0x20 (space) through 0x7E (~).
pub struct FontMetricTable {
    pub font: PdfFont,
    widths: [f32; 95],
    /// Fallback width for characters without an entry.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.widths[code - 32];
        }
        match c {
            '•' => 0.35,
            '–' => 0.556,
            '—' => 1.0,
            '‘' | '’' | '‚' => 0.222,
            '“' | '”' | '„' => 0.333,
            '…' => 1.0,
            '\t' => self.space_width,
            _ => self.average_char_width,
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Width of `s` in points at `size_pt`.
    pub fn width_pt(&self, s: &str, size_pt: f32) -> f32 {
        self.measure_str(s) * size_pt
    }

    /// Greedy word-wrap of `s` into lines no wider than `max_width_pt`.
    ///
    /// A single word wider than the line is placed on its own line rather than split.
    /// Empty input yields no lines.
    pub fn wrap(&self, s: &str, size_pt: f32, max_width_pt: f32) -> Vec<String> {
        let max_width = max_width_pt / size_pt;
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in s.split_whitespace() {
            let word_w = self.measure_str(word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + self.space_width + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += self.space_width + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

/// Returns the metric table for the given font.
pub fn get_metrics(font: PdfFont) -> &'static FontMetricTable {
    match font {
        PdfFont::Helvetica => &HELVETICA_TABLE,
        PdfFont::HelveticaBold => &HELVETICA_BOLD_TABLE,
        PdfFont::HelveticaOblique => &HELVETICA_OBLIQUE_TABLE,
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [f32; 95] = [
    // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
    0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
    // 0      1      2      3      4      5      6      7      8      9
    0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
    // :      ;      <      =      >      ?      @
    0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
    // A      B      C      D      E      F      G      H      I      J      K      L      M
    0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
    // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
    0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
    // [      \      ]      ^      _      `
    0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
    // a      b      c      d      e      f      g      h      i      j      k      l      m
    0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
    // n      o      p      q      r      s      t      u      v      w      x      y      z
    0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
    // {      |      }      ~
    0.334, 0.260, 0.334, 0.584,
];

/// Helvetica: body text.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    font: PdfFont::Helvetica,
    widths: HELVETICA_WIDTHS,
    average_char_width: 0.556,
    space_width: 0.278,
};

/// Helvetica-Oblique shares Helvetica's advance widths.
static HELVETICA_OBLIQUE_TABLE: FontMetricTable = FontMetricTable {
    font: PdfFont::HelveticaOblique,
    widths: HELVETICA_WIDTHS,
    average_char_width: 0.556,
    space_width: 0.278,
};

/// Helvetica-Bold: names and entry headers.
static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    font: PdfFont::HelveticaBold,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};
