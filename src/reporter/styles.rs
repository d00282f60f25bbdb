pub use console::{Style, StyledObject};

pub struct Styles {
    pub style_heading: Style,
    pub style_border: Style,
    pub style_flagged: Style,
    pub style_summary: Style,
}
impl Styles {
    /// Callers decide whether color is appropriate (flags, `NO_COLOR`, terminal detection).
    pub fn new(use_color: bool) -> Self {
        let style_heading = Style::new().bold().force_styling(use_color);
        let style_border = Style::new().dim().force_styling(use_color);
        let style_flagged = Style::new().bold().yellow().force_styling(use_color);
        let style_summary = Style::new().bright().blue().force_styling(use_color);
        Self { style_heading, style_border, style_flagged, style_summary }
    }

    pub fn heading<D>(&self, text: D) -> StyledObject<D> {
        self.style_heading.apply_to(text)
    }

    pub fn border<D>(&self, text: D) -> StyledObject<D> {
        self.style_border.apply_to(text)
    }

    pub fn flagged<D>(&self, text: D) -> StyledObject<D> {
        self.style_flagged.apply_to(text)
    }

    pub fn summary<D>(&self, text: D) -> StyledObject<D> {
        self.style_summary.apply_to(text)
    }
}
