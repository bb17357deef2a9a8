//! The renderer boundary. The scheduler only ever talks to this trait;
//! display hardware would implement it in place of the console version.

use crate::board::{BoardFrame, Slide};

pub trait Renderer {
    fn render(&mut self, frame: &BoardFrame);
}

/// Renders the two-direction frame as two lines on stdout.
pub struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn render(&mut self, frame: &BoardFrame) {
        println!("↑ {}", format_slide(&frame.uptown));
        println!("↓ {}", format_slide(&frame.downtown));
    }
}

fn format_slide(slide: &Slide) -> String {
    match slide {
        Slide::Departure(d) => format!("{} {} min", d.route_id, d.departs_in),
        Slide::Empty => "no trains".to_string(),
    }
}
