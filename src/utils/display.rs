//! Drawing samples and network outputs in a terminal.

const RESET: &str = "\x1b[0m";

/// The 256 color palette index of the gray a pixel is drawn with, from 232 for the background to
/// 255 for the foreground.
pub fn grayscale_color(pixel: u8) -> u32 {
    232 + pixel as u32 * 23 / 255
}

/// Draws an image as ANSI background colors, two cells per pixel so that it keeps its aspect
/// ratio, and one line per row of **cols** pixels.
pub fn render_image(pixels: &[u8], cols: usize) -> String {
    let mut rendered = String::new();

    for row in pixels.chunks(cols.max(1)) {
        for pixel in row {
            rendered.push_str(&format!("\x1b[48;5;{}m  {}", grayscale_color(*pixel), RESET));
        }
        rendered.push('\n');
    }

    rendered
}

/// Lists the score of every digit, one per line.
pub fn render_outputs(outputs: &[f64]) -> String {
    outputs
        .iter()
        .enumerate()
        .map(|(digit, score)| format!("Value for {}:\t {:9.3}\n", digit, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{grayscale_color, render_image, render_outputs};

    #[test]
    fn should_map_pixels_into_the_grayscale_ramp() {
        assert_eq!(grayscale_color(0), 232);
        assert_eq!(grayscale_color(128), 243);
        assert_eq!(grayscale_color(255), 255);
    }

    #[test]
    fn should_render_one_line_per_row() {
        let rendered = render_image(&[0, 255, 255, 0, 128, 64], 3);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines
            .iter()
            .all(|line| line.matches("\x1b[48;5;").count() == 3));
        assert!(lines[0].starts_with("\x1b[48;5;232m  \x1b[0m\x1b[48;5;255m"));
        assert!(rendered.ends_with("\x1b[0m\n"));
    }

    #[test]
    fn should_render_the_score_of_every_digit() {
        let rendered = render_outputs(&[0.5, 0.01234]);

        assert_eq!(
            rendered,
            "Value for 0:\t     0.500\nValue for 1:\t     0.012\n"
        );
    }
}
