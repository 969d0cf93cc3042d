//! Borrowed 2D sprite view

use alloc::vec::Vec;

use crate::color::Color;
use crate::error::SpriteError;

/// Row-major color grid borrowed for the duration of a blit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite<'a> {
    pixels: &'a [Color],
    width: u16,
    height: u16,
}

impl<'a> Sprite<'a> {
    /// Wrap `pixels` as a `width x height` grid.
    ///
    /// # Returns
    /// * `Err(DimensionMismatch)` if `pixels.len() != width * height`
    pub fn new(pixels: &'a [Color], width: u16, height: u16) -> Result<Self, SpriteError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(SpriteError::DimensionMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &'a [Color] {
        self.pixels
    }

    /// Color at `[row][col]`, `None` outside the grid
    #[inline]
    pub fn get(&self, row: u16, col: u16) -> Option<Color> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.pixels
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }

    /// One row of the grid
    pub fn row(&self, row: u16) -> Option<&'a [Color]> {
        if row >= self.height {
            return None;
        }
        let start = row as usize * self.width as usize;
        self.pixels.get(start..start + self.width as usize)
    }
}

/// Flatten a slice of equally sized rows into a row-major pixel vector
/// suitable for [`Sprite::new`].
///
/// # Returns
/// * `Ok((pixels, width, height))`
/// * `Err(RaggedRow)` naming the first row whose length differs from row 0
pub fn flatten_rows(rows: &[&[Color]]) -> Result<(Vec<Color>, u16, u16), SpriteError> {
    let width = rows.first().map_or(0, |r| r.len());
    let mut pixels = Vec::with_capacity(width * rows.len());
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width || width > u16::MAX as usize {
            return Err(SpriteError::RaggedRow { row: i });
        }
        pixels.extend_from_slice(row);
    }
    if rows.len() > u16::MAX as usize {
        return Err(SpriteError::DimensionMismatch {
            expected: u16::MAX as usize,
            actual: rows.len(),
        });
    }
    Ok((pixels, width as u16, rows.len() as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const T: Color = Color::TRANSPARENT;
    const W: Color = Color::WHITE;

    #[test]
    fn test_new_checks_dimensions() {
        let px = [W; 6];
        assert!(Sprite::new(&px, 3, 2).is_ok());
        assert_eq!(
            Sprite::new(&px, 4, 2),
            Err(SpriteError::DimensionMismatch { expected: 8, actual: 6 })
        );
        assert!(Sprite::new(&[], 0, 5).is_ok());
    }

    #[test]
    fn test_get_is_row_major() {
        let px = [Color(0), Color(1), Color(2), Color(10), Color(11), Color(12)];
        let s = Sprite::new(&px, 3, 2).unwrap();
        assert_eq!(s.get(0, 2), Some(Color(2)));
        assert_eq!(s.get(1, 0), Some(Color(10)));
        assert_eq!(s.get(2, 0), None);
        assert_eq!(s.get(0, 3), None);
        assert_eq!(s.row(1), Some(&px[3..6]));
        assert_eq!(s.row(2), None);
    }

    #[test]
    fn test_flatten_rows() {
        let r0 = [W, T];
        let r1 = [T, W];
        let (px, w, h) = flatten_rows(&[&r0, &r1]).unwrap();
        assert_eq!((w, h), (2, 2));
        assert_eq!(px, vec![W, T, T, W]);

        let short = [W];
        assert_eq!(
            flatten_rows(&[&r0, &short]),
            Err(SpriteError::RaggedRow { row: 1 })
        );
    }
}
