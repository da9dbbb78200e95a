use std::ops::Range;

/// Word-wrapped line boundaries of a text for one display width.
///
/// Built once per width; the text never changes during a session, so
/// rendering a frame only touches the visible lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapLayout {
    width: usize,
    len: usize,
    line_starts: Vec<usize>,
}

impl WrapLayout {
    pub fn build(text: &[u8], width: u16) -> Self {
        let width = usize::from(width.max(1));
        let mut line_starts = vec![0];
        let mut start = 0;
        while start < text.len() {
            let limit = (start + width).min(text.len());
            let next = match text[start..limit].iter().position(|&b| b == b'\n') {
                Some(nl) => start + nl + 1,
                None if limit == text.len() => break,
                None => match text[start..limit].iter().rposition(|&b| b == b' ' || b == b'\t') {
                    Some(space) if space > 0 => start + space + 1,
                    _ => limit,
                },
            };
            line_starts.push(next);
            start = next;
        }
        Self {
            width,
            len: text.len(),
            line_starts,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of `line`, newline included. Empty past the end.
    pub fn line(&self, line: usize) -> Range<usize> {
        let Some(&start) = self.line_starts.get(line) else {
            return self.len..self.len;
        };
        let end = self.line_starts.get(line + 1).copied().unwrap_or(self.len);
        start..end
    }

    /// Line holding byte `pos`; positions at or past the end map to the last line.
    pub fn line_of(&self, pos: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= pos)
            .saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, width: u16) -> Vec<&str> {
        let layout = WrapLayout::build(text.as_bytes(), width);
        (0..layout.line_count())
            .map(|l| &text[layout.line(l)])
            .collect()
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(lines("hello", 80), vec!["hello"]);
        assert_eq!(lines("", 80), vec![""]);
    }

    #[test]
    fn breaks_after_newlines() {
        assert_eq!(lines("ab\ncd", 80), vec!["ab\n", "cd"]);
        assert_eq!(lines("ab\n", 80), vec!["ab\n", ""]);
    }

    #[test]
    fn wraps_at_last_space() {
        assert_eq!(lines("the quick brown fox", 10), vec!["the quick ", "brown fox"]);
    }

    #[test]
    fn hard_breaks_long_words() {
        assert_eq!(lines("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn line_of_positions() {
        let layout = WrapLayout::build(b"ab\ncd\nef", 80);
        assert_eq!(layout.line_of(0), 0);
        assert_eq!(layout.line_of(2), 0);
        assert_eq!(layout.line_of(3), 1);
        assert_eq!(layout.line_of(7), 2);
        assert_eq!(layout.line_of(100), 2);
    }
}
