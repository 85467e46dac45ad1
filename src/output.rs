//! CLI output formatting.
//!
//! Each `format_*` function returns `Vec<String>` for testability; the
//! `print_*` wrappers write to stdout. Format functions are pure.
//!
//! ## Session events
//!
//! ```text
//! Loaded 500x250 (centered at -125, -250)
//! Rendered normal (#1)
//!     export: hidden
//! Rendered sepia (#2)
//!     export: available
//! ```
//!
//! ## Filter catalog
//!
//! ```text
//! 001 normal (default)
//! 002 grayscale
//! 003 sepia
//! ```

use crate::catalog::FilterCatalog;
use crate::imaging::EffectRegistry;
use crate::session::SessionEvent;
use crate::types::{BoundingBox, Dimensions};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub fn format_session_event(event: &SessionEvent) -> Vec<String> {
    match event {
        SessionEvent::Loaded {
            dims,
            offsets: (top, left),
        } => vec![format!("Loaded {} (centered at {}, {})", dims, top, left)],
        SessionEvent::Cleared => vec!["Cleared".to_string()],
        SessionEvent::Rendered {
            selection,
            revision,
        } => vec![format!("Rendered {} (#{})", selection, revision)],
        SessionEvent::ExportAvailability { available } => {
            let status = if *available { "available" } else { "hidden" };
            vec![format!("{}export: {}", indent(1), status)]
        }
        SessionEvent::EffectFailed { selection, reason } => vec![
            format!("Effect {} failed, showing original", selection),
            format!("{}{}", indent(1), reason),
        ],
        SessionEvent::Discarded { selection } => {
            vec![format!("{}discarded stale render of {}", indent(1), selection)]
        }
    }
}

/// One line per catalog entry; entries without an effect are flagged.
pub fn format_catalog(catalog: &FilterCatalog, registry: &impl EffectRegistry) -> Vec<String> {
    catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let note = if name == catalog.default_entry() {
                " (default)"
            } else if !registry.has(name) {
                " (no effect)"
            } else {
                ""
            };
            format!("{} {}{}", format_index(i + 1), name, note)
        })
        .collect()
}

pub fn format_fit(source: Dimensions, fitted: Dimensions, bounds: BoundingBox) -> Vec<String> {
    let verdict = if source == fitted {
        "already inside"
    } else {
        "scaled to fit"
    };
    vec![
        format!("Source: {}", source),
        format!("Canvas: {} ({} {})", fitted, verdict, bounds),
    ]
}

pub fn print_catalog(catalog: &FilterCatalog, registry: &impl EffectRegistry) {
    for line in format_catalog(catalog, registry) {
        println!("{}", line);
    }
}

pub fn print_fit(source: Dimensions, fitted: Dimensions, bounds: BoundingBox) {
    for line in format_fit(source, fitted, bounds) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::BuiltinEffects;
    use crate::types::FilterName;

    #[test]
    fn loaded_event_shows_offsets() {
        let lines = format_session_event(&SessionEvent::Loaded {
            dims: Dimensions::new(500, 250).unwrap(),
            offsets: (-125, -250),
        });
        assert_eq!(lines, vec!["Loaded 500x250 (centered at -125, -250)"]);
    }

    #[test]
    fn rendered_and_export_events() {
        let rendered = format_session_event(&SessionEvent::Rendered {
            selection: FilterName::new("sepia"),
            revision: 2,
        });
        assert_eq!(rendered, vec!["Rendered sepia (#2)"]);

        let export = format_session_event(&SessionEvent::ExportAvailability { available: false });
        assert_eq!(export, vec!["    export: hidden"]);
    }

    #[test]
    fn effect_failure_has_reason_line() {
        let lines = format_session_event(&SessionEvent::EffectFailed {
            selection: FilterName::new("blur"),
            reason: "Effect failed: boom".into(),
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "    Effect failed: boom");
    }

    #[test]
    fn catalog_marks_default_and_missing_effects() {
        let catalog = FilterCatalog::from_names(["sepia", "lomo"]);
        let lines = format_catalog(&catalog, &BuiltinEffects::new());
        assert_eq!(
            lines,
            vec!["001 normal (default)", "002 sepia", "003 lomo (no effect)"]
        );
    }

    #[test]
    fn fit_output_reports_scaling() {
        let lines = format_fit(
            Dimensions::new(800, 400).unwrap(),
            Dimensions::new(500, 250).unwrap(),
            BoundingBox::default(),
        );
        assert_eq!(lines[1], "Canvas: 500x250 (scaled to fit 500x500)");

        let kept = format_fit(
            Dimensions::new(40, 30).unwrap(),
            Dimensions::new(40, 30).unwrap(),
            BoundingBox::default(),
        );
        assert_eq!(kept[1], "Canvas: 40x30 (already inside 500x500)");
    }
}
