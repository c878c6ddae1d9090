//! Frame sink for an RGB LED matrix panel driven through `rpi-led-matrix`.
//!
//! The panel serves as a bench preview of the sculpture: strip `s` is drawn
//! on row `s` and LED phase `p` on column `p`, each LED enlarged to a square
//! block when the panel has room.

use crate::frame::{FrameBuffer, FrameSink};
use crate::{Color, PanelConfig, StripLayout};
use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions, LedRuntimeOptions};

/// Convert our Color to the hardware crate's LedColor at the boundary.
impl From<Color> for LedColor {
    fn from(c: Color) -> Self {
        LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

/// Create a matrix configured for our hardware:
/// Pi Zero 2 W + Adafruit Bonnet + configurable panel size.
pub fn create_matrix(panel: PanelConfig) -> Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut options = LedMatrixOptions::new();
    options.set_rows(panel.rows);
    options.set_cols(panel.cols);
    options.set_hardware_mapping("adafruit-hat");

    options.set_pwm_bits(8)?;
    options.set_pwm_lsb_nanoseconds(130);

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

    let matrix = LedMatrix::new(Some(options), Some(rt_options))?;

    Ok(matrix)
}

/// Mirrors each frame onto the panel, one strip per row.
pub struct MatrixSink {
    matrix: LedMatrix,
    /// `None` only while a swap is in flight.
    canvas: Option<LedCanvas>,
    layout: StripLayout,
    scale: usize,
}

impl MatrixSink {
    pub fn new(panel: PanelConfig, layout: StripLayout) -> Result<Self, Box<dyn std::error::Error>> {
        if !panel.fits(layout) {
            return Err(format!(
                "{}x{} panel cannot show {} strips of {} LEDs",
                panel.cols, panel.rows, layout.strips, layout.leds_per_strip
            )
            .into());
        }

        let scale = (panel.cols as usize / layout.leds_per_strip)
            .min(panel.rows as usize / layout.strips)
            .max(1);

        let matrix = create_matrix(panel)?;
        let canvas = matrix.offscreen_canvas();
        tracing::info!("Matrix preview: {}x{} panel, {}px per LED", panel.cols, panel.rows, scale);

        Ok(Self {
            matrix,
            canvas: Some(canvas),
            layout,
            scale,
        })
    }
}

impl FrameSink for MatrixSink {
    fn flush(&mut self, frame: &FrameBuffer) {
        let Some(mut canvas) = self.canvas.take() else {
            return;
        };

        canvas.clear();
        for (index, &color) in frame.pixels().iter().enumerate() {
            if color.is_black() {
                continue;
            }
            let x0 = self.layout.phase_of(index) * self.scale;
            let y0 = self.layout.strip_of(index) * self.scale;
            let led_color: LedColor = color.into();
            for dy in 0..self.scale {
                for dx in 0..self.scale {
                    canvas.set((x0 + dx) as i32, (y0 + dy) as i32, &led_color);
                }
            }
        }

        self.canvas = Some(self.matrix.swap(canvas));
    }
}
