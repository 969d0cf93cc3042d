//! Demo scene drawn once per frame
//!
//! Only talks to [`DisplaySurface`], so the same code runs against any backend.

use ral::{Color, DisplayError, DisplaySurface, Sprite, SpriteError};

const T: Color = Color::TRANSPARENT;
const W: Color = Color::WHITE;
const K: Color = Color::BLACK;

/// 8x8 ball, color-keyed corners
#[rustfmt::skip]
static BALL: [Color; 64] = [
    T, T, W, W, W, W, T, T,
    T, W, W, W, W, W, W, T,
    W, W, K, W, W, K, W, W,
    W, W, W, W, W, W, W, W,
    W, K, W, W, W, W, K, W,
    W, W, K, K, K, K, W, W,
    T, W, W, W, W, W, W, T,
    T, T, W, W, W, W, T, T,
];

pub const BALL_SIZE: u16 = 8;

pub fn ball() -> Result<Sprite<'static>, SpriteError> {
    Sprite::new(&BALL, BALL_SIZE, BALL_SIZE)
}

/// Position of an object bouncing along one axis of length `span`
fn bounce(frame: u32, speed: u32, span: u16) -> u16 {
    if span == 0 {
        return 0;
    }
    let span = u32::from(span);
    let period = span * 2;
    let p = frame.wrapping_mul(speed) % period;
    let pos = if p < span { p } else { period - p };
    pos.min(span - 1) as u16
}

/// Draw frame `frame` into the surface's current draw buffer
pub fn draw_frame(
    surface: &mut dyn DisplaySurface,
    frame: u32,
    sprite: &Sprite<'_>,
) -> Result<(), DisplayError> {
    let (w, h) = (surface.width(), surface.height());

    surface.draw_box(0, 0, w, h, Color::BLACK, false)?;

    let bar_w = w / 4;
    let bar_h = h / 8;
    let bar_x = bounce(frame, 7, w.saturating_sub(bar_w));
    surface.fill_box(bar_x, h / 2, bar_w, bar_h, Color::RED)?;
    surface.draw_box(bar_x, h / 2, bar_w, bar_h, Color::WHITE, false)?;

    let bx = bounce(frame, 5, w.saturating_sub(sprite.width()));
    let by = bounce(frame, 3, h.saturating_sub(sprite.height()));
    surface.draw_sprite(bx, by, sprite)?;

    surface.draw_pixel(w / 2, 1, Color::GREEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ral::device::{SimConfig, SimPlatform};
    use ral::{BufferSelect, VgaDisplay};

    #[test]
    fn test_bounce_stays_in_span() {
        for frame in 0..200 {
            assert!(bounce(frame, 7, 240) < 240);
        }
        assert_eq!(bounce(0, 7, 240), 0);
        assert_eq!(bounce(3, 7, 0), 0);
    }

    #[test]
    fn test_ball_sprite() {
        let s = ball().unwrap();
        assert_eq!(s.get(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(s.get(2, 2), Some(Color::BLACK));
    }

    #[test]
    fn test_draw_frame_on_sim() {
        let mut d = VgaDisplay::new(SimPlatform::new(SimConfig::default()));
        d.init().unwrap();
        let sprite = ball().unwrap();
        draw_frame(&mut d, 0, &sprite).unwrap();

        let sim = d.device().unwrap();
        // Frame border
        assert_eq!(sim.pixel(BufferSelect::Back, 0, 0), Some(Color::BLACK));
        assert_eq!(sim.pixel(BufferSelect::Back, 319, 239), Some(Color::BLACK));
        // Ball at the origin on frame 0; its transparent corner keeps the border
        assert_eq!(sim.pixel(BufferSelect::Back, 2, 0), Some(Color::WHITE));
        assert_eq!(sim.pixel(BufferSelect::Back, 2, 2), Some(Color::BLACK));
        // Bar interior
        assert_eq!(sim.pixel(BufferSelect::Back, 10, 125), Some(Color::RED));
        assert_eq!(sim.pixel(BufferSelect::Back, 160, 1), Some(Color::GREEN));
        assert_eq!(sim.dropped_writes(), 0);
    }
}
