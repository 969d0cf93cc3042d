//! Downsampled ASCII rendering of a simulated frame buffer

use ral::device::SimVideo;
use ral::{BufferSelect, Color};

/// Glyph for a pixel color
fn glyph(color: Color) -> char {
    match color {
        Color::BACKGROUND => '.',
        Color::BLACK => '#',
        Color::WHITE => 'o',
        Color::RED => '=',
        Color::GREEN => '+',
        Color::BLUE => '~',
        _ => '?',
    }
}

/// Render `target` as `cols` characters per line, sampling one pixel per cell.
/// Cells are twice as tall as wide to keep the aspect ratio on a terminal.
pub fn render(sim: &SimVideo, target: BufferSelect, cols: u16) -> String {
    let res = sim.resolution();
    let cols = cols.clamp(1, res.width.max(1));
    let step_x = (res.width / cols).max(1);
    let step_y = step_x.saturating_mul(2);

    let mut out = String::new();
    for y in (0..res.height).step_by(usize::from(step_y)) {
        for x in (0..res.width).step_by(usize::from(step_x)) {
            out.push(sim.pixel(target, x, y).map_or(' ', glyph));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ral::device::SimConfig;
    use ral::{Resolution, VideoDevice};

    #[test]
    fn test_render_dimensions() {
        let sim = SimVideo::new(SimConfig::for_resolution(Resolution::new(16, 8)));
        let text = render(&sim, BufferSelect::Back, 8);
        // 16 / 8 = 2 px per column, 4 px per row
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.chars().count() == 8));
    }

    #[test]
    fn test_render_glyphs() {
        let mut sim = SimVideo::new(SimConfig::for_resolution(Resolution::new(4, 2)));
        sim.fill_screen(Color::BACKGROUND, BufferSelect::Back);
        sim.draw_pixel(Color::RED, 0, 0, BufferSelect::Back);
        let text = render(&sim, BufferSelect::Back, 4);
        assert_eq!(text, "=...\n");
    }
}
