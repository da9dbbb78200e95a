//! Excessive-whitespace classification.
//!
//! Source texts carry book indentation and runs of blank lines that nobody
//! wants to type. Positions classified as excessive are rendered but never
//! scored; everything else forms the "non-excessive stream", and the k-th
//! non-excessive byte of the text is scored against the k-th non-excessive
//! byte of the input.

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Whether position `pos` of `s` is excessive whitespace.
///
/// - a `\n` is excessive when the byte before it is also `\n`, so only the
///   first newline of a run counts;
/// - a space or tab is excessive when its maximal run of spaces/tabs is at
///   least 3 long;
/// - everything else, including out-of-range positions, is not.
pub fn is_excessive_whitespace(s: &[u8], pos: usize) -> bool {
    let Some(&ch) = s.get(pos) else {
        return false;
    };
    match ch {
        b'\n' => pos > 0 && s[pos - 1] == b'\n',
        b' ' | b'\t' => {
            let mut run = 1;
            let mut i = pos;
            while i > 0 && is_blank(s[i - 1]) {
                run += 1;
                i -= 1;
                if run >= 3 {
                    return true;
                }
            }
            let mut j = pos + 1;
            while j < s.len() && is_blank(s[j]) {
                run += 1;
                j += 1;
                if run >= 3 {
                    return true;
                }
            }
            false
        }
        _ => false,
    }
}

/// Collapses space/tab runs to one space and newline runs to one newline.
///
/// Display helper only; scoring goes through [`NonExcessiveIndex`].
pub fn normalize_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_blank = false;
    let mut last_newline = false;
    for ch in s.chars() {
        match ch {
            '\n' => {
                if !last_newline {
                    out.push('\n');
                }
                last_newline = true;
                last_blank = false;
            }
            ' ' | '\t' => {
                if !last_blank {
                    out.push(' ');
                }
                last_blank = true;
                last_newline = false;
            }
            c => {
                out.push(c);
                last_blank = false;
                last_newline = false;
            }
        }
    }
    out
}

/// Ordered positions of the non-excessive bytes of a buffer.
///
/// The index is kept in sync with a growing/shrinking buffer by
/// [`NonExcessiveIndex::sync`], which only reclassifies the trailing
/// whitespace run: appending or removing a byte can only change the class of
/// bytes in the run touching the end of the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonExcessiveIndex {
    positions: Vec<usize>,
    len: usize,
}

impl NonExcessiveIndex {
    pub fn build(s: &[u8]) -> Self {
        let mut index = Self::default();
        index.reclassify_from(s, 0);
        index
    }

    /// Brings the index up to date with `s` after its length changed.
    /// Bytes before the old length must be unchanged.
    pub fn sync(&mut self, s: &[u8]) {
        if s.len() == self.len {
            return;
        }
        let stable = self.len.min(s.len());
        self.reclassify_from(s, run_start(s, stable));
    }

    fn reclassify_from(&mut self, s: &[u8], start: usize) {
        let keep = self.positions.partition_point(|&p| p < start);
        self.positions.truncate(keep);
        self.positions
            .extend((start..s.len()).filter(|&i| !is_excessive_whitespace(s, i)));
        self.len = s.len();
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn get(&self, rank: usize) -> Option<usize> {
        self.positions.get(rank).copied()
    }

    /// Rank of `pos` among the non-excessive positions, if it is one.
    pub fn rank_of(&self, pos: usize) -> Option<usize> {
        self.positions.binary_search(&pos).ok()
    }
}

/// Start of the whitespace run that ends right before `end` (or `end` itself).
fn run_start(s: &[u8], end: usize) -> usize {
    let mut i = end;
    while i > 0 && (is_blank(s[i - 1]) || s[i - 1] == b'\n') {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn excessive_mask(s: &str) -> Vec<bool> {
        (0..s.len())
            .map(|i| is_excessive_whitespace(s.as_bytes(), i))
            .collect()
    }

    #[test]
    fn single_space_between_words_is_kept() {
        assert_eq!(excessive_mask("a b"), vec![false, false, false]);
    }

    #[test]
    fn double_space_is_kept() {
        assert_eq!(excessive_mask("a  b"), vec![false; 4]);
    }

    #[test]
    fn three_or_more_spaces_are_all_excessive() {
        assert_eq!(
            excessive_mask("a   b"),
            vec![false, true, true, true, false]
        );
        assert_eq!(
            excessive_mask("\t \tx"),
            vec![true, true, true, false]
        );
    }

    #[test]
    fn newline_runs_keep_only_the_first() {
        assert_eq!(excessive_mask("a\nb"), vec![false, false, false]);
        assert_eq!(
            excessive_mask("a\n\n\nb"),
            vec![false, false, true, true, false]
        );
    }

    #[test]
    fn out_of_range_is_not_excessive() {
        assert!(!is_excessive_whitespace(b"   ", 3));
        assert!(!is_excessive_whitespace(b"", 0));
    }

    #[test]
    fn normalize_collapses_runs() {
        assert_eq!(normalize_whitespace("a \t  b\n\n\nc"), "a b\nc");
        assert_eq!(normalize_whitespace("plain"), "plain");
    }

    #[test]
    fn index_ranks() {
        let idx = NonExcessiveIndex::build(b"a   b c");
        assert_eq!(idx.positions(), &[0, 4, 5, 6]);
        assert_eq!(idx.rank_of(4), Some(1));
        assert_eq!(idx.rank_of(2), None);
    }

    #[test]
    fn sync_reclassifies_the_trailing_run() {
        let mut buf = b"a ".to_vec();
        let mut idx = NonExcessiveIndex::build(&buf);
        assert_eq!(idx.count(), 2);

        buf.push(b' ');
        idx.sync(&buf);
        assert_eq!(idx.positions(), &[0, 1, 2]);

        // third blank turns the whole run excessive
        buf.push(b' ');
        idx.sync(&buf);
        assert_eq!(idx.positions(), &[0]);

        buf.pop();
        idx.sync(&buf);
        assert_eq!(idx.positions(), &[0, 1, 2]);
    }

    #[test]
    fn sync_handles_newline_runs() {
        let mut buf = b"x\n".to_vec();
        let mut idx = NonExcessiveIndex::build(&buf);
        buf.push(b'\n');
        idx.sync(&buf);
        assert_eq!(idx.positions(), &[0, 1]);
        buf.push(b'y');
        idx.sync(&buf);
        assert_eq!(idx.positions(), &[0, 1, 3]);
    }

    proptest! {
        #[test]
        fn incremental_sync_matches_rebuild(ops in proptest::collection::vec(
            prop_oneof![
                Just(None::<u8>),
                prop::sample::select(vec![b'a', b' ', b'\t', b'\n', b'.']).prop_map(Some),
            ],
            0..60,
        )) {
            let mut buf = Vec::new();
            let mut idx = NonExcessiveIndex::default();
            for op in ops {
                match op {
                    Some(b) => buf.push(b),
                    None => { buf.pop(); }
                }
                idx.sync(&buf);
                prop_assert_eq!(&idx, &NonExcessiveIndex::build(&buf));
            }
        }

        #[test]
        fn normalize_is_idempotent(s in "[a-c \t\n]{0,40}") {
            let once = normalize_whitespace(&s);
            prop_assert_eq!(normalize_whitespace(&once), once.clone());
        }
    }
}
