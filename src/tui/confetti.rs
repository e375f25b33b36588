//! Falling-confetti overlay shown when the board is completed.

use std::time::Duration;

use rand::Rng;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

const PALETTE: [Color; 5] = [
    Color::Rgb(135, 206, 235),
    Color::Rgb(102, 205, 170),
    Color::Rgb(255, 215, 0),
    Color::Rgb(255, 105, 180),
    Color::Rgb(255, 255, 255),
];
const PARTICLES: usize = 150;
const GLYPHS: [char; 4] = ['▪', '•', '▴', '◆'];

#[derive(Debug, Clone)]
struct Particle {
    /// Horizontal position as a fraction of the width.
    x: f32,
    /// Seconds before the particle starts falling.
    delay: f32,
    /// Seconds to fall the full height.
    duration: f32,
    color: Color,
    glyph: char,
}

#[derive(Debug, Clone)]
pub struct Confetti {
    particles: Vec<Particle>,
    elapsed: f32,
}

impl Confetti {
    pub fn burst<R: Rng>(rng: &mut R) -> Self {
        let particles = (0..PARTICLES)
            .map(|i| Particle {
                x: rng.gen_range(0.0..1.0),
                delay: rng.gen_range(0.0..3.0),
                duration: rng.gen_range(3.0..5.0),
                color: PALETTE[i % PALETTE.len()],
                glyph: GLYPHS[rng.gen_range(0..GLYPHS.len())],
            })
            .collect();
        Confetti {
            particles,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt.as_secs_f32();
    }

    /// Every particle has left the screen.
    pub fn is_finished(&self) -> bool {
        self.particles
            .iter()
            .all(|p| self.elapsed >= p.delay + p.duration)
    }

    /// Cells currently occupied, as `(x, y, glyph, color)` relative to `area`.
    fn cells(&self, area: Rect) -> impl Iterator<Item = (u16, u16, char, Color)> + '_ {
        self.particles.iter().filter_map(move |p| {
            let t = (self.elapsed - p.delay) / p.duration;
            if !(0.0..1.0).contains(&t) {
                return None;
            }
            let x = (p.x * f32::from(area.width)) as u16;
            let y = (t * f32::from(area.height)) as u16;
            (x < area.width && y < area.height).then_some((x, y, p.glyph, p.color))
        })
    }
}

impl Widget for &Confetti {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (x, y, glyph, color) in self.cells(area) {
            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_char(glyph).set_fg(color);
            }
        }
    }
}
