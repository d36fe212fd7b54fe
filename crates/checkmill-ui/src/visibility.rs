/// Per-slide visibility bookkeeping.
///
/// The host reports intersection changes as they happen through [`set`];
/// [`take_records`] diffs them against the last committed snapshot.
///
/// [`set`]: VisibilityTracker::set
/// [`take_records`]: VisibilityTracker::take_records
#[derive(Clone, Debug, Default)]
pub struct VisibilityTracker {
    last: Vec<bool>,
    current: Vec<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityChange {
    Entered,
    Exited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityRecord {
    pub index: usize,
    pub change: VisibilityChange,
}

impl VisibilityTracker {
    pub fn new(count: usize) -> Self {
        Self {
            last: vec![false; count],
            current: vec![false; count],
        }
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Unknown indices are ignored.
    pub fn set(&mut self, index: usize, visible: bool) {
        if let Some(slot) = self.current.get_mut(index) {
            *slot = visible;
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.current.get(index).copied().unwrap_or(false)
    }

    pub fn take_records(&mut self) -> Vec<VisibilityRecord> {
        let records = self
            .current
            .iter()
            .zip(&self.last)
            .enumerate()
            .filter(|(_, (now, before))| now != before)
            .map(|(index, (&now, _))| VisibilityRecord {
                index,
                change: if now {
                    VisibilityChange::Entered
                } else {
                    VisibilityChange::Exited
                },
            })
            .collect();
        self.last.copy_from_slice(&self.current);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffs_then_commits() {
        let mut t = VisibilityTracker::new(4);
        t.set(1, true);
        t.set(2, true);
        t.set(9, true);

        let records = t.take_records();
        assert_eq!(
            records,
            vec![
                VisibilityRecord {
                    index: 1,
                    change: VisibilityChange::Entered
                },
                VisibilityRecord {
                    index: 2,
                    change: VisibilityChange::Entered
                },
            ]
        );
        assert!(t.take_records().is_empty());
        assert!(t.is_visible(1));
        assert!(!t.is_visible(0));
        assert!(!t.is_visible(9));

        t.set(1, false);
        t.set(3, true);
        t.set(3, false);
        assert_eq!(
            t.take_records(),
            vec![VisibilityRecord {
                index: 1,
                change: VisibilityChange::Exited
            }]
        );
    }
}
