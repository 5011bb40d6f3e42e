use audio_widgets_core::{Rect, Rgb, Surface};

const SHADES: &[u8] = b" .:-=+*#%@";

/// Character grid standing in for a canvas. One cell is one pixel.
#[derive(Debug, Clone)]
pub struct TextSurface {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl TextSurface {
    /// Creates a blank grid of `width` by `height` cells.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![b' '; width as usize * height as usize],
        }
    }

    /// Returns the grid as text, one line per row.
    pub fn render(&self) -> String {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| String::from_utf8_lossy(row).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Surface for TextSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.cells.fill(b' ');
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }

        let x0 = rect.x.floor().max(0.0) as usize;
        let x1 = ((rect.x + rect.width).ceil() as usize).min(self.width as usize);
        let y0 = rect.y.floor().max(0.0) as usize;
        let y1 = ((rect.y + rect.height).ceil() as usize).min(self.height as usize);

        let shade = SHADES[usize::from(color.b) * (SHADES.len() - 1) / 255];
        for y in y0..y1 {
            for x in x0..x1 {
                self.cells[y * self.width as usize + x] = shade;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_cells_covered_by_a_rect() {
        let mut surface = TextSurface::new(4, 2);
        surface.fill_rect(
            Rect {
                x: 1.0,
                y: 1.0,
                width: 2.0,
                height: 1.0,
            },
            Rgb::new(50, 50, 255),
        );

        assert_eq!(surface.render(), "    \n @@ ");
        surface.clear();
        assert_eq!(surface.render(), "    \n    ");
    }

    #[test]
    fn ignores_rects_outside_the_grid() {
        let mut surface = TextSurface::new(2, 2);
        surface.fill_rect(
            Rect {
                x: 5.0,
                y: 0.0,
                width: 3.0,
                height: 2.0,
            },
            Rgb::new(0, 0, 128),
        );
        assert_eq!(surface.render(), "  \n  ");
    }
}
