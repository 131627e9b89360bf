//! LCOV format parser

use super::CoverageRatio;

/// Extract the aggregate line coverage ratio from LCOV content.
///
/// Sums `LH` (lines hit) and `LF` (lines found) over every record.
pub fn parse_lcov_string(content: &str) -> Result<CoverageRatio, String> {
    let mut lines_found = 0u64;
    let mut lines_hit = 0u64;
    let mut records = 0usize;

    for line in content.lines() {
        let line = line.trim();

        if let Some(count) = line.strip_prefix("LF:") {
            let count = count
                .parse::<u64>()
                .map_err(|_| format!("invalid LF record: {}", line))?;
            lines_found = lines_found
                .checked_add(count)
                .ok_or_else(|| "LF total overflows".to_string())?;
            records += 1;
        } else if let Some(count) = line.strip_prefix("LH:") {
            let count = count
                .parse::<u64>()
                .map_err(|_| format!("invalid LH record: {}", line))?;
            lines_hit = lines_hit
                .checked_add(count)
                .ok_or_else(|| "LH total overflows".to_string())?;
        }
    }

    if records == 0 {
        return Err("no LF records found".to_string());
    }
    if lines_found == 0 {
        return Err("report contains no executable lines".to_string());
    }

    let rate = lines_hit as f64 / lines_found as f64;
    CoverageRatio::new(rate).ok_or_else(|| {
        format!("lines hit ({}) exceed lines found ({})", lines_hit, lines_found)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lcov() {
        let lcov = r#"
TN:
SF:src/main.rs
FN:1,main
FNDA:1,main
DA:1,1
DA:2,1
DA:3,0
LF:3
LH:2
BRF:2
BRH:1
end_of_record
SF:src/lib.rs
DA:1,1
DA:2,1
LF:2
LH:2
end_of_record
"#;

        // 4/5 = 80%
        let ratio = parse_lcov_string(lcov).unwrap();
        assert!((ratio.value() - 0.8).abs() < 1e-12);
        assert_eq!(ratio.percent(), 80);
    }

    #[test]
    fn test_empty_lcov() {
        assert!(parse_lcov_string("").is_err());
    }

    #[test]
    fn test_zero_lines_found() {
        let err = parse_lcov_string("SF:a.rs\nLF:0\nLH:0\nend_of_record\n").unwrap_err();
        assert!(err.contains("no executable lines"));
    }

    #[test]
    fn test_garbage_count() {
        assert!(parse_lcov_string("SF:a.rs\nLF:ten\nend_of_record\n").is_err());
    }

    #[test]
    fn test_total_overflow() {
        let err = parse_lcov_string("LF:18446744073709551615\nLH:1\nLF:1\nLH:1\n").unwrap_err();
        assert!(err.contains("LF total overflows"));

        let err = parse_lcov_string("LF:1\nLH:18446744073709551615\nLF:1\nLH:1\n").unwrap_err();
        assert!(err.contains("LH total overflows"));
    }

    #[test]
    fn test_hits_exceed_found() {
        assert!(parse_lcov_string("SF:a.rs\nLF:2\nLH:3\nend_of_record\n").is_err());
    }
}
