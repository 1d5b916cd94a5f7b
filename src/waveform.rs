//! Text rendering of monitor snapshots, one waveform row per trace.

use crate::devices::Signal;
use crate::monitors::TraceSnapshot;

fn glyph(level: Signal) -> char {
    match level {
        Signal::High => '-',
        Signal::Low => '_',
        Signal::Rising => '/',
        Signal::Falling => '\\',
        Signal::Blank => ' ',
    }
}

/// Renders every trace as `NAME : __--__`, names left-aligned to the
/// widest one.
#[must_use]
pub fn render(traces: &[TraceSnapshot]) -> String {
    let width = traces.iter().map(|t| t.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for trace in traces {
        let wave: String = trace.levels.iter().map(|&level| glyph(level)).collect();
        out.push_str(&format!("{:<width$} : {}\n", trace.name, wave));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_align_on_the_longest_name() {
        let traces = vec![
            TraceSnapshot {
                name: "CK".to_owned(),
                levels: vec![Signal::High, Signal::High, Signal::Low],
            },
            TraceSnapshot {
                name: "D1.QBAR".to_owned(),
                levels: vec![Signal::Low, Signal::Low, Signal::High],
            },
        ];
        let rendered = render(&traces);
        assert_eq!(rendered, "CK      : --_\nD1.QBAR : __-\n");
    }
}
