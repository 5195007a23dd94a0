//! Assignment scripts
//!
//! One assignment per line, `A1 = <input>`. Blank lines and lines starting
//! with `#` are skipped.

use anyhow::{bail, Context, Result};
use gridcalc::CellAddress;

/// One `cell = input` line
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// 1-based line number in the script
    pub line: usize,
    pub row: u32,
    pub col: u32,
    /// Editable text; a leading `=` marks a formula
    pub input: String,
}

/// Parse every assignment in a script
pub fn parse_script(script: &str) -> Result<Vec<Assignment>> {
    let mut assignments = Vec::new();
    for (index, line) in script.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let assignment =
            parse_line(trimmed, index + 1).with_context(|| format!("line {}: {}", index + 1, line))?;
        assignments.push(assignment);
    }
    Ok(assignments)
}

fn parse_line(line: &str, number: usize) -> Result<Assignment> {
    let Some((cell, input)) = line.split_once('=') else {
        bail!("expected `<cell> = <input>`");
    };

    let addr = CellAddress::parse(cell.trim())
        .with_context(|| format!("'{}' is not a cell address", cell.trim()))?;

    Ok(Assignment {
        line: number,
        row: addr.row,
        col: addr.col,
        input: input.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_script() {
        let script = "# prices\nA1 = 10\n\n  B1 = =A1*2  \nC3=hello = world\n";
        let assignments = parse_script(script).unwrap();

        assert_eq!(
            assignments,
            vec![
                Assignment { line: 2, row: 0, col: 0, input: "10".into() },
                Assignment { line: 4, row: 0, col: 1, input: "=A1*2".into() },
                Assignment { line: 5, row: 2, col: 2, input: "hello = world".into() },
            ]
        );
    }

    #[test]
    fn test_parse_script_errors() {
        let err = parse_script("A1 = 1\nnonsense\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2"));

        let err = parse_script("1A = 1").unwrap_err();
        assert!(format!("{:#}", err).contains("not a cell address"));
    }

    #[test]
    fn test_empty_input_clears() {
        let assignments = parse_script("A1 =").unwrap();
        assert_eq!(assignments[0].input, "");
    }
}
