// crates/esctl-core/src/style.rs - Output Styling Capability
//
// Some commands highlight cells (a red health status, a disk almost full).
// Commands only attach a `Tone` to a cell; the renderer paints it at the very
// end, after sorting and column selection, with the `Painter` matching the
// output. ANSI codes make sense in a terminal table and are garbage in JSON
// or CSV, so `Plain` is the painter for outputs without colour support.

/// Visual emphasis a command can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Green,
    Yellow,
    Red,
    Cyan,
    Blue,
    Purple,
    Bold,
    Italic,
    Underline,
}

impl Tone {
    /// Tone matching a cluster/index health colour
    pub fn for_health(status: &str) -> Option<Tone> {
        match status.to_ascii_lowercase().as_str() {
            "green" => Some(Tone::Green),
            "yellow" => Some(Tone::Yellow),
            "red" => Some(Tone::Red),
            _ => None,
        }
    }

    /// Disk usage above 85% is red, above 70% yellow
    pub fn for_disk_usage(percent: u64) -> Option<Tone> {
        match percent {
            p if p > 85 => Some(Tone::Red),
            p if p > 70 => Some(Tone::Yellow),
            _ => None,
        }
    }
}

/// Renderer capability: turns text into styled text
pub trait Painter {
    fn paint(&self, text: &str, tone: Tone) -> String;
}

/// Painter for outputs that cannot show colour
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Painter for Plain {
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }
}
