//! Helper for writing colors and font styles to the terminal.
//!
//! The guard resets the terminal colors and styles when it is dropped, so a
//! report section can never leak its color into whatever is written next.
//! Each function that writes colored output creates its own `ColorOutput`
//! from the raw writer.
//!
//! NOT thread-safe.
use termcolor::{Color, ColorSpec, WriteColor};

pub struct ColorOutput<'a> {
    writer: &'a mut dyn WriteColor,
    spec: ColorSpec,
}

impl<'a> ColorOutput<'a> {
    pub fn new(writer: &'a mut dyn WriteColor) -> Self {
        writer.reset().ok();

        Self {
            writer,
            spec: ColorSpec::new(),
        }
    }

    /// `None` means the terminal's default color.
    pub fn set_color(&mut self, color: Option<Color>) {
        // coloring failures are not worth aborting a report for
        self.spec.set_fg(color);
        self.writer.set_color(&self.spec).ok();
    }

    pub fn set_bold(&mut self, yes: bool) {
        self.spec.set_bold(yes);
        self.writer.set_color(&self.spec).ok();
    }

    /// Shorthand for a bold heading in the given color.
    pub fn heading(&mut self, color: Option<Color>) {
        self.set_color(color);
        self.set_bold(true);
    }

    pub fn plain(&mut self) {
        self.spec.clear();
        self.writer.reset().ok();
    }

    pub fn writer(&mut self) -> &mut dyn WriteColor {
        self.writer
    }
}

impl<'a> Drop for ColorOutput<'a> {
    fn drop(&mut self) {
        self.writer.reset().ok();
    }
}
