/// Host-side handle to one recyclable visual container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

/// Multiplier of the loop range applied to a slide's rendered position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewportOffset {
    Behind,
    #[default]
    Current,
    Ahead,
}

impl ViewportOffset {
    pub fn factor(self) -> f64 {
        match self {
            ViewportOffset::Behind => -1.0,
            ViewportOffset::Current => 0.0,
            ViewportOffset::Ahead => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slide {
    pub container: ContainerId,
    real_index: usize,
    pub virtual_index: i64,
    pub page_index: u64,
    pub viewport_offset: ViewportOffset,
}

impl Slide {
    pub fn new(container: ContainerId, real_index: usize) -> Self {
        Self {
            container,
            real_index,
            virtual_index: real_index as i64,
            page_index: 0,
            viewport_offset: ViewportOffset::Current,
        }
    }

    /// Pool slot identity, fixed for the lifetime of the slide.
    pub fn real_index(&self) -> usize {
        self.real_index
    }
}

/// Builds the pool, one slide per container, real indices in container order.
pub fn create_slides(containers: impl IntoIterator<Item = ContainerId>) -> Vec<Slide> {
    containers
        .into_iter()
        .enumerate()
        .map(|(index, container)| Slide::new(container, index))
        .collect()
}
