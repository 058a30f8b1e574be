use super::RawCell;

/// Forces a raw row into exactly `K` trimmed columns: missing cells become
/// empty strings, extra cells are cut, short rows are right-padded.
pub fn normalize<const K: usize>(raw: &[RawCell]) -> [String; K] {
    std::array::from_fn(|i| {
        raw.get(i)
            .and_then(|cell| cell.as_deref())
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    })
}

/// Number of cells `normalize` drops from this row.
pub fn overflow<const K: usize>(raw: &[RawCell]) -> usize {
    raw.len().saturating_sub(K)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<RawCell> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_truncates_to_width() {
        let raw = cells(&["a", "b", "c", "d", "e"]);
        let row = normalize::<3>(&raw);
        assert_eq!(row, ["a", "b", "c"].map(String::from));
        assert_eq!(overflow::<3>(&raw), 2);
    }

    #[test]
    fn test_pads_short_rows() {
        let row = normalize::<10>(&cells(&["Alice", "Sales", "1200"]));
        assert_eq!(&row[..3], &["Alice", "Sales", "1200"]);
        assert!(row[3..].iter().all(String::is_empty));
        assert_eq!(overflow::<10>(&cells(&["x"])), 0);
    }

    #[test]
    fn test_missing_cells_and_whitespace() {
        let raw = vec![Some("  Bob \t".to_string()), None, Some(" ".to_string())];
        let row = normalize::<4>(&raw);
        assert_eq!(row, ["Bob", "", "", ""].map(String::from));
    }

    #[test]
    fn test_empty_row_is_all_blank() {
        let row = normalize::<10>(&[]);
        assert_eq!(row.len(), 10);
        assert!(row.iter().all(String::is_empty));
    }
}
