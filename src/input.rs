//! Reads observations from delimited text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use factorec::prelude::*;
use factorec::Dataset;

/// Reads `<USER><DELIMITER><ITEM><DELIMITER><VALUE>` lines.
///
/// Blank lines and lines starting with `#` are skipped. Identifiers are kept as opaque strings.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_dataset(path: &Path, delimiter: char) -> Result<Dataset<String, String>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let dataset = parse_lines(BufReader::new(file), delimiter)?;
    info!(n_observations = dataset.len(), "loaded");
    Ok(dataset)
}

fn parse_lines<R: BufRead>(reader: R, delimiter: char) -> Result<Dataset<String, String>> {
    let mut dataset = Dataset::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line #{}", index + 1))?;
        if let Some((user_id, item_id, value)) = parse_line(&line, delimiter)
            .with_context(|| format!("malformed line #{}", index + 1))?
        {
            dataset.push(user_id, item_id, value);
        }
    }
    Ok(dataset)
}

fn parse_line(line: &str, delimiter: char) -> Result<Option<(String, String, f32)>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (user_id, item_id, value) = line
        .split(delimiter)
        .collect_tuple()
        .ok_or_else(|| anyhow!("expected exactly three fields separated by {:?}", delimiter))?;
    let value = f32::from_str(value.trim())
        .with_context(|| format!("`{}` is not a number", value))?;
    Ok(Some((user_id.to_string(), item_id.to_string(), value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lines_ok() -> Result {
        let input = "# user\titem\tvalue\n1\tStar Wars (1977)\t5\n\n2\tFargo (1996)\t3.5\r\n";
        let dataset = parse_lines(input.as_bytes(), '\t')?;
        let observations = dataset
            .iter()
            .map(|observation| {
                (observation.user_id.as_str(), observation.item_id.as_str(), observation.value)
            })
            .collect_vec();
        assert_eq!(observations, [("1", "Star Wars (1977)", 5.0), ("2", "Fargo (1996)", 3.5)]);
        Ok(())
    }

    #[test]
    fn custom_delimiter_ok() -> Result {
        let dataset = parse_lines("a,b,1\n".as_bytes(), ',')?;
        assert_eq!(dataset.len(), 1);
        Ok(())
    }

    #[test]
    fn malformed_line_fails() {
        assert!(parse_lines("1\t2\n".as_bytes(), '\t').is_err());
        assert!(parse_lines("1\t2\t3\t4\n".as_bytes(), '\t').is_err());
        assert!(parse_lines("1\t2\tfive\n".as_bytes(), '\t').is_err());
    }
}
