use crate::error::{ConfigError, Result};

const WORD_BITS: u64 = u64::BITS as u64;

/// Fixed-size bit set holding the checked state of every logical toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleBoard {
    words: Vec<u64>,
    len: u64,
}

impl ToggleBoard {
    pub fn new(len: u64) -> Result<Self> {
        if len == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        let words = len.div_ceil(WORD_BITS) as usize;
        Ok(Self {
            words: vec![0; words],
            len,
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Out-of-range indices read as unchecked.
    pub fn has(&self, index: u64) -> bool {
        if index >= self.len {
            return false;
        }
        let (word, bit) = split(index);
        self.words[word] & bit != 0
    }

    /// Toggles `index`, returning the new state, or `None` when out of range.
    pub fn flip(&mut self, index: u64) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        let (word, bit) = split(index);
        self.words[word] ^= bit;
        Some(self.words[word] & bit != 0)
    }

    /// Checked state of `count` consecutive toggles starting at `start`.
    pub fn chunk(&self, start: u64, count: u64) -> impl Iterator<Item = bool> + '_ {
        (start..start.saturating_add(count)).map(|i| self.has(i))
    }

    pub fn checked_count(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }
}

fn split(index: u64) -> (usize, u64) {
    ((index / WORD_BITS) as usize, 1u64 << (index % WORD_BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_toggles_single_bit() {
        let mut board = ToggleBoard::new(1_048_560).unwrap();
        assert!(!board.has(70));
        assert_eq!(board.flip(70), Some(true));
        assert!(board.has(70));
        assert!(!board.has(69));
        assert!(!board.has(71));
        assert_eq!(board.flip(70), Some(false));
        assert!(!board.has(70));
    }

    #[test]
    fn edges_of_the_board() {
        let mut board = ToggleBoard::new(130).unwrap();
        assert_eq!(board.flip(129), Some(true));
        assert_eq!(board.flip(130), None);
        assert!(!board.has(130));
        assert!(!board.has(u64::MAX));
        assert_eq!(board.checked_count(), 1);
    }

    #[test]
    fn chunk_reads_a_page() {
        let mut board = ToggleBoard::new(64).unwrap();
        board.flip(17);
        board.flip(19);
        let page: Vec<bool> = board.chunk(16, 4).collect();
        assert_eq!(page, vec![false, true, false, true]);
    }

    #[test]
    fn empty_board_is_rejected() {
        assert_eq!(ToggleBoard::new(0), Err(ConfigError::EmptyBoard));
    }
}
