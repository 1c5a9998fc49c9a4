//! Page geometry and paragraph styles.

/// Points per centimetre.
pub const CM: f32 = 72.0 / 2.54;

/// RGB fill colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Build from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
        }
    }
}

/// Typography for one kind of paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub leading: f32,
    pub bold: bool,
    pub color: Color,
    /// Extra space above, dropped at the top of a page.
    pub space_before: f32,
    pub space_after: f32,
}

/// The four paragraph styles of a guide.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub h1: TextStyle,
    pub h2: TextStyle,
    pub h3: TextStyle,
    pub body: TextStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        let slate = Color::from_hex(0x374151);
        Self {
            h1: TextStyle {
                font_size: 22.0,
                leading: 28.0,
                bold: true,
                color: Color::from_hex(0x1a202c),
                space_before: 0.0,
                space_after: 6.0,
            },
            h2: TextStyle {
                font_size: 14.0,
                leading: 18.0,
                bold: true,
                color: Color::from_hex(0x4f46e5),
                space_before: 14.0,
                space_after: 4.0,
            },
            h3: TextStyle {
                font_size: 12.0,
                leading: 16.0,
                bold: true,
                color: slate,
                space_before: 8.0,
                space_after: 3.0,
            },
            body: TextStyle {
                font_size: 10.5,
                leading: 16.0,
                bold: false,
                color: slate,
                space_before: 0.0,
                space_after: 6.0,
            },
        }
    }
}

impl StyleSheet {
    /// Style for a heading level; anything past 3 renders as `h3`.
    pub fn heading(&self, level: u8) -> &TextStyle {
        match level {
            0 | 1 => &self.h1,
            2 => &self.h2,
            _ => &self.h3,
        }
    }
}

/// Page size and margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// A4 portrait with 2.5 cm margins on every side.
    pub fn a4() -> Self {
        Self {
            width: 595.2756,
            height: 841.8898,
            margin: 2.5 * CM,
        }
    }

    pub fn frame_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn frame_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// y of the top edge of the text frame.
    pub fn top(&self) -> f32 {
        self.height - self.margin
    }

    /// y of the bottom edge of the text frame.
    pub fn bottom(&self) -> f32 {
        self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex(0x4f46e5);
        assert!((c.r - 79.0 / 255.0).abs() < 1e-6);
        assert!((c.g - 70.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 229.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_a4_frame() {
        let page = PageGeometry::a4();
        assert!((page.margin - 70.866).abs() < 0.01);
        assert!((page.frame_width() - 453.543).abs() < 0.01);
        assert!(page.top() > page.bottom());
    }

    #[test]
    fn test_heading_levels() {
        let styles = StyleSheet::default();
        assert_eq!(styles.heading(1).font_size, 22.0);
        assert_eq!(styles.heading(2).font_size, 14.0);
        assert_eq!(styles.heading(6).font_size, 12.0);
    }
}
