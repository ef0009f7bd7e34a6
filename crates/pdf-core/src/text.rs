//! Text rendering utilities

use crate::document::Color;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name on the page (e.g., "FF1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Generate PDF operators for text insertion
///
/// Creates the PDF text operators (BT, rg, Tf, Td, Tj, ET) to render text
/// with its baseline starting at `(x, y)`.
///
/// # Arguments
/// * `text_hex` - Hex-encoded text (e.g., "<4A616E65>")
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `ctx` - Text rendering context
///
/// # Returns
/// Vector of bytes containing the PDF operators
pub fn generate_text_operators(text_hex: &str, x: f64, y: f64, ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");

    // Non-stroking color
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));

    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));

    // BT resets the text matrix, so Td is absolute here
    ops.push_str(&format!("{x} {y} Td\n"));

    ops.push_str(&format!("{text_hex} Tj\n"));

    ops.push_str("ET\n");

    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(font_name: &str, font_size: f32, color: Color) -> TextRenderContext {
        TextRenderContext {
            font_name: font_name.to_string(),
            font_size,
            color,
        }
    }

    #[test]
    fn test_generate_text_operators() {
        let ctx = context("FF1", 10.0, Color::black());

        let ops = generate_text_operators("<4A616E65>", 120.0, 250.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert_eq!(
            ops_str,
            "BT\n0 0 0 rg\n/FF1 10 Tf\n120 250 Td\n<4A616E65> Tj\nET\n"
        );
    }

    #[test]
    fn test_generate_text_operators_fractional_position() {
        let ctx = context("FF2", 9.5, Color::black());

        let ops = generate_text_operators("<41>", 72.25, 700.5, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("/FF2 9.5 Tf"));
        assert!(ops_str.contains("72.25 700.5 Td"));
    }

    #[test]
    fn test_generate_text_operators_empty_text() {
        let ctx = context("FF1", 12.0, Color::black());

        let ops = generate_text_operators("<>", 100.0, 700.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("<> Tj"));
        assert!(ops_str.starts_with("BT\n"));
        assert!(ops_str.ends_with("ET\n"));
    }

    #[test]
    fn test_generate_text_operators_with_color() {
        let ctx = context("FF1", 12.0, Color::from_rgb(255, 0, 0));

        let ops = generate_text_operators("<41>", 100.0, 700.0, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 rg"));
    }
}
