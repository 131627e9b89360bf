//! Cobertura XML format parser

use quick_xml::events::Event;
use quick_xml::Reader;

use super::CoverageRatio;

/// Attribute holding the line coverage ratio
const LINE_RATE_ATTR: &[u8] = b"line-rate";

/// Extract the aggregate line coverage ratio from Cobertura XML content.
///
/// The first element carrying a `line-rate` attribute wins. In reports produced by
/// tarpaulin, grcov and coverage.py that is the root `<coverage>` element; the
/// per-package and per-class rates that follow are ignored.
pub fn parse_cobertura_string(content: &str) -> Result<CoverageRatio, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| format!("malformed attribute: {}", e))?;
                    if attr.key.as_ref() != LINE_RATE_ATTR {
                        continue;
                    }

                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    let rate = value
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| format!("line-rate \"{}\" is not a decimal number", value))?;

                    return CoverageRatio::new(rate)
                        .ok_or_else(|| format!("line-rate {} is outside [0, 1]", rate));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "invalid XML at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Err("no line-rate attribute found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cobertura() {
        let xml = r#"<?xml version="1.0"?>
<coverage line-rate="0.8" branch-rate="0.5" lines-covered="80" lines-valid="100">
    <packages>
        <package name="src" line-rate="0.3">
            <classes>
                <class name="main" filename="src/main.rs" line-rate="0.75" branch-rate="0.5">
                    <lines>
                        <line number="1" hits="1"/>
                        <line number="2" hits="0"/>
                    </lines>
                </class>
            </classes>
        </package>
    </packages>
</coverage>"#;

        let ratio = parse_cobertura_string(xml).unwrap();
        assert_eq!(ratio.value(), 0.8);
    }

    #[test]
    fn test_first_marker_wins_even_when_nested() {
        let xml = r#"<report><summary><totals line-rate="0.12"/></summary><coverage line-rate="0.9"/></report>"#;

        let ratio = parse_cobertura_string(xml).unwrap();
        assert_eq!(ratio.value(), 0.12);
    }

    #[test]
    fn test_exact_value_preserved() {
        for value in ["0", "1", "0.5", "0.123456789", "1.0"] {
            let xml = format!(r#"<coverage line-rate="{}"/>"#, value);
            let ratio = parse_cobertura_string(&xml).unwrap();
            assert_eq!(ratio.value(), value.parse::<f64>().unwrap());
        }
    }

    #[test]
    fn test_missing_marker() {
        let err = parse_cobertura_string(r#"<coverage branch-rate="0.5"></coverage>"#).unwrap_err();
        assert!(err.contains("no line-rate"));
    }

    #[test]
    fn test_non_decimal_marker() {
        let err = parse_cobertura_string(r#"<coverage line-rate="high"/>"#).unwrap_err();
        assert!(err.contains("not a decimal"));
    }

    #[test]
    fn test_out_of_range_marker() {
        let err = parse_cobertura_string(r#"<coverage line-rate="45.0"/>"#).unwrap_err();
        assert!(err.contains("outside"));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_cobertura_string("").is_err());
    }
}
