// fusion_replay/src/output.rs

use nalgebra::Vector2;
use std::io::Write;

use crate::error::ReplayError;

/// Writes one estimate record: every state component, then the measured position.
///
/// Fields are tab-separated and the record ends with a newline, so a CTRV run emits
/// seven columns and a constant-velocity run six.
pub fn write_estimate<W: Write>(
    writer: &mut W,
    state: &[f64],
    measured: &Vector2<f64>,
) -> Result<(), ReplayError> {
    let record = state
        .iter()
        .chain(measured.iter())
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(writer, "{record}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_has_state_plus_two_fields() {
        let mut buffer = Vec::new();
        write_estimate(&mut buffer, &[1.0, 2.0, 0.5, -0.25, 0.0], &Vector2::new(1.1, 1.9)).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "1\t2\t0.5\t-0.25\t0\t1.1\t1.9\n");
        assert_eq!(text.trim_end().split('\t').count(), 7);
    }
}
