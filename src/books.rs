//! Canonical book catalog and the timing-log path scheme.

use std::path::{Path, PathBuf};

use crate::error::{Result, TimingError};

/// Folder names for the 66 books, in canonical order. Folder name
/// doubles as the chapter-file prefix (`Genesis/Genesis3.html`).
pub const BOOK_FOLDERS: [&str; 66] = [
    "Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy", "Joshua", "Judges", "Ruth",
    "1Samuel", "2Samuel", "1Kings", "2Kings", "1Chronicles", "2Chronicles", "Ezra", "Nehemiah",
    "Esther", "Job", "Psalms", "Proverbs", "Ecclesiastes", "Songs", "Isaiah", "Jeremiah",
    "Lamentations", "Ezekiel", "Daniel", "Hosea", "Joel", "Amos", "Obadiah", "Jonah", "Micah",
    "Nahum", "Habakkuk", "Zephaniah", "Haggai", "Zechariah", "Malachi", "Matthew", "Mark", "Luke",
    "John", "Acts", "Romans", "1Corinthians", "2Corinthians", "Galatians", "Ephesians",
    "Philippians", "Colossians", "1Thessalonians", "2Thessalonians", "1Timothy", "2Timothy",
    "Titus", "Philemon", "Hebrews", "James", "1Peter", "2Peter", "1John", "2John", "3John",
    "Jude", "Revelation",
];

/// 1-based order of a book, matched case-insensitively against folder names.
pub fn book_order(name: &str) -> Result<u8> {
    let needle = name.trim();
    BOOK_FOLDERS
        .iter()
        .position(|folder| folder.eq_ignore_ascii_case(needle))
        .map(|i| (i + 1) as u8)
        .ok_or_else(|| TimingError::UnknownBook(name.to_string()))
}

/// Folder name for a 1-based book order.
pub fn folder_for_order(order: u32) -> Result<&'static str> {
    if (1..=BOOK_FOLDERS.len() as u32).contains(&order) {
        Ok(BOOK_FOLDERS[(order - 1) as usize])
    } else {
        Err(TimingError::BookOrderOutOfRange(order))
    }
}

/// Human-readable title for a folder name ("1Samuel" -> "1 Samuel").
pub fn display_name(folder: &str) -> String {
    match folder.find(|c: char| !c.is_ascii_digit()) {
        Some(split) if split > 0 => format!("{} {}", &folder[..split], &folder[split..]),
        _ => folder.to_string(),
    }
}

/// Relative path of a submission log: `.timings/NN/CCC.json`.
pub fn timing_log_rel(order: u32, chapter: u32) -> PathBuf {
    PathBuf::from(".timings")
        .join(format!("{order:02}"))
        .join(format!("{chapter:03}.json"))
}

/// Absolute submission-log path under a content root.
pub fn timing_log_path(root: &Path, order: u32, chapter: u32) -> PathBuf {
    root.join(timing_log_rel(order, chapter))
}

/// Relative path of a chapter page: `<folder>/<folder><chapter>.html`.
pub fn chapter_page_rel(folder: &str, chapter: u32) -> PathBuf {
    PathBuf::from(folder).join(format!("{folder}{chapter}.html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_sixty_six_books() {
        assert_eq!(BOOK_FOLDERS.len(), 66);
        assert_eq!(BOOK_FOLDERS[0], "Genesis");
        assert_eq!(BOOK_FOLDERS[65], "Revelation");
    }

    #[test]
    fn order_lookup_is_case_insensitive() {
        assert_eq!(book_order("genesis").unwrap(), 1);
        assert_eq!(book_order("Mark").unwrap(), 41);
        assert_eq!(book_order("1SAMUEL").unwrap(), 9);
        assert!(book_order("Hezekiah").is_err());
    }

    #[test]
    fn folder_for_order_bounds() {
        assert_eq!(folder_for_order(1).unwrap(), "Genesis");
        assert_eq!(folder_for_order(66).unwrap(), "Revelation");
        assert!(folder_for_order(0).is_err());
        assert!(folder_for_order(67).is_err());
    }

    #[test]
    fn display_names_space_leading_digits() {
        assert_eq!(display_name("1Samuel"), "1 Samuel");
        assert_eq!(display_name("2Corinthians"), "2 Corinthians");
        assert_eq!(display_name("Genesis"), "Genesis");
    }

    #[test]
    fn timing_log_paths_are_zero_padded() {
        assert_eq!(
            timing_log_rel(9, 3),
            PathBuf::from(".timings").join("09").join("003.json")
        );
        assert_eq!(
            timing_log_rel(41, 12),
            PathBuf::from(".timings").join("41").join("012.json")
        );
    }

    #[test]
    fn chapter_page_layout() {
        assert_eq!(
            chapter_page_rel("Mark", 4),
            PathBuf::from("Mark").join("Mark4.html")
        );
    }
}
