pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "").replace(['_', '-'], " ");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Numeric cell text with grouping separators and a trailing percent sign removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumericText {
    pub(crate) digits: String,
    pub(crate) percent: bool,
}

pub(crate) fn clean_numeric(value: &str) -> NumericText {
    let trimmed = value.trim();
    let (body, percent) = match trimmed
        .strip_suffix('%')
        .or_else(|| trimmed.strip_suffix('\u{ff05}'))
    {
        Some(body) => (body, true),
        None => (trimmed, false),
    };
    let digits = body
        .chars()
        .filter(|ch| !matches!(*ch, ',' | '\u{ff0c}' | '_') && !ch.is_whitespace())
        .collect();
    NumericText { digits, percent }
}

#[cfg(test)]
pub(crate) fn normalize_for_tests(value: &str) -> String {
    normalize_header(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_invisible_characters_and_separators() {
        assert_eq!(normalize_header("\u{feff}Total_Followers "), "total followers");
        assert_eq!(normalize_header("  Doctor   Name"), "doctor name");
        assert_eq!(normalize_header("姓名"), "姓名");
    }

    #[test]
    fn numeric_cleaning_handles_grouping_and_percent() {
        assert_eq!(
            clean_numeric(" 1,234,567 "),
            NumericText {
                digits: "1234567".to_string(),
                percent: false
            }
        );
        assert_eq!(
            clean_numeric("12，500"),
            NumericText {
                digits: "12500".to_string(),
                percent: false
            }
        );
        assert_eq!(
            clean_numeric("85.5%"),
            NumericText {
                digits: "85.5".to_string(),
                percent: true
            }
        );
    }
}
