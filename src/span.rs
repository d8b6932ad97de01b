use miette::SourceSpan;

/// Position relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub u32);

/// Holds a view into a source.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: u16,
}

impl Span {
    pub fn new(start: Idx, len: u16) -> Self {
        Span { start, len }
    }

    /// Non-source span
    pub fn dummy() -> Self {
        Span::default()
    }

    pub fn offs(&self) -> usize {
        self.start.0 as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.offs() + self.len()
    }

    /// Returns a range that can be used to index the source
    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.offs()..self.end()
    }
}

// Used for miette conversion
impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.offs().into(), value.len())
    }
}
