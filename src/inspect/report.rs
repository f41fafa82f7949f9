//! Inspect report types and terminal formatting.

use std::fmt;

use serde::Serialize;

/// The result of inspecting an annotation store.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    /// Schema information, when the report was built from a container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatSection>,
    pub summary: SummarySection,
    pub pairing: PairingSection,
    /// Extent of all positions; `None` when there are no finite positions.
    pub bounds: Option<Bounds>,
    /// Annotations with a NaN or infinite coordinate.
    pub non_finite: usize,
}

/// Container schema details.
#[derive(Clone, Debug, Serialize)]
pub struct FormatSection {
    pub file_format: String,
    /// `(x, y, z)`, present only if the group carries an offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<[f32; 3]>,
}

/// Counts per annotation kind.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub annotations: usize,
    pub synapses: usize,
    pub presynaptic_sites: usize,
    pub postsynaptic_sites: usize,
    /// Annotations with a non-empty comment.
    pub commented: usize,
}

/// Partner link statistics.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PairingSection {
    /// Linked presynaptic/postsynaptic pairs.
    pub linked_pairs: usize,
    pub unpaired_presynaptic: usize,
    pub unpaired_postsynaptic: usize,
}

/// Axis-aligned extent of positions, `(x, y, z)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "╭─────────────────────────────────────────────────────────────╮")?;
        writeln!(f, "│              Synapse Annotation Report                      │")?;
        writeln!(f, "╰─────────────────────────────────────────────────────────────╯")?;
        writeln!(f)?;

        if let Some(format) = &self.format {
            writeln!(f, "File format:   {}", format.file_format)?;
            match format.offset {
                Some([x, y, z]) => writeln!(f, "Offset:        ({}, {}, {})", x, y, z)?,
                None => writeln!(f, "Offset:        none")?,
            }
            writeln!(f)?;
        }

        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_pairing(f)?;
        writeln!(f)?;
        self.fmt_bounds(f)?;

        Ok(())
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        writeln!(f, "┌─ Summary ─────────────────────────────────────────────────┐")?;
        writeln!(f, "│   Annotations:         {:>10}", format_number(s.annotations))?;
        writeln!(f, "│     synapse            {:>10}", format_number(s.synapses))?;
        writeln!(
            f,
            "│     presynaptic_site   {:>10}",
            format_number(s.presynaptic_sites)
        )?;
        writeln!(
            f,
            "│     postsynaptic_site  {:>10}",
            format_number(s.postsynaptic_sites)
        )?;
        writeln!(
            f,
            "│   Commented:           {:>10}  ({})",
            format_number(s.commented),
            fmt_percent(s.commented, s.annotations)
        )?;
        writeln!(f, "└───────────────────────────────────────────────────────────┘")?;

        Ok(())
    }

    fn fmt_pairing(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.pairing;

        writeln!(f, "┌─ Partners ────────────────────────────────────────────────┐")?;
        writeln!(f, "│   Linked pairs:        {:>10}", format_number(p.linked_pairs))?;
        if p.unpaired_presynaptic == 0 && p.unpaired_postsynaptic == 0 {
            writeln!(f, "│   ✓ Every site is paired")?;
        } else {
            writeln!(
                f,
                "│   ⚠ Unpaired pre:      {:>10}",
                format_number(p.unpaired_presynaptic)
            )?;
            writeln!(
                f,
                "│   ⚠ Unpaired post:     {:>10}",
                format_number(p.unpaired_postsynaptic)
            )?;
        }
        writeln!(f, "└───────────────────────────────────────────────────────────┘")?;

        Ok(())
    }

    fn fmt_bounds(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ Extent ──────────────────────────────────────────────────┐")?;
        match &self.bounds {
            Some(b) => {
                for (axis, (min, max)) in ["x", "y", "z"].iter().zip(b.min.iter().zip(&b.max)) {
                    writeln!(f, "│   {}:  min {:>12.2}    max {:>12.2}", axis, min, max)?;
                }
            }
            None => writeln!(f, "│   No positions to measure.")?,
        }
        if self.non_finite > 0 {
            writeln!(
                f,
                "│   ✗ Non-finite positions: {}",
                format_number(self.non_finite)
            )?;
        }
        writeln!(f, "└───────────────────────────────────────────────────────────┘")?;

        Ok(())
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a percentage, handling zero denominators.
fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_fmt_percent() {
        assert_eq!(fmt_percent(0, 0), "n/a");
        assert_eq!(fmt_percent(1, 2), "50.0%");
        assert_eq!(fmt_percent(1, 3), "33.3%");
    }
}
