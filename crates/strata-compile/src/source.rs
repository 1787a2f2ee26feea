//! Splitting of configuration source text into pages.

use strata_common::constants::COMMENT_PREFIX;

/// One separator-delimited run of content lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Position in the source, from 0.
    pub index: usize,
    /// Content lines, blank and comment lines already removed.
    pub lines: Vec<String>,
}

impl Page {
    /// The page text, lines joined by `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Splits `text` into pages on lines equal to `separator`.
///
/// Blank and `#` comment lines are dropped first. A separator with nothing
/// after it adds no page, and a source with no content lines has no pages.
#[must_use]
pub fn split_pages(text: &str, separator: &str) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }
        if line.trim_end() == separator {
            pages.push(Page {
                index: pages.len(),
                lines: std::mem::take(&mut current),
            });
            continue;
        }
        current.push(line.to_string());
    }
    if !current.is_empty() {
        pages.push(Page {
            index: pages.len(),
            lines: current,
        });
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_separator_lines() {
        let pages = split_pages("a: 1\n---\nb: 2\nc: 3\n---\nd: 4\n", "---");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text(), "a: 1");
        assert_eq!(pages[1].text(), "b: 2\nc: 3");
        assert_eq!(pages[2].index, 2);
    }

    #[test]
    fn drops_blank_and_comment_lines() {
        let pages = split_pages("# header\n\na: 1\n   # indented comment\n  \nb: 2\n", "---");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines, vec!["a: 1", "b: 2"]);
    }

    #[test]
    fn trailing_separator_adds_no_page() {
        let pages = split_pages("a: 1\n---\n", "---");
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn leading_separator_yields_empty_first_page() {
        let pages = split_pages("---\na: 1\n", "---");
        assert_eq!(pages.len(), 2);
        assert!(pages[0].lines.is_empty());
        assert_eq!(pages[1].text(), "a: 1");
    }

    #[test]
    fn empty_source_has_no_pages() {
        assert!(split_pages("", "---").is_empty());
        assert!(split_pages("# only comments\n\n", "---").is_empty());
    }

    #[test]
    fn indented_content_is_kept_verbatim() {
        let pages = split_pages("a:\n  b: 1\n", "---");
        assert_eq!(pages[0].lines, vec!["a:", "  b: 1"]);
    }

    #[test]
    fn separator_must_start_the_line() {
        let pages = split_pages("a: |\n  ---\n", "---");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines.len(), 2);
    }
}
