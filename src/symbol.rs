use fxhash::FxHashMap;

use crate::span::Span;

/// Identifies one of the two sections of an assembly unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SectionId {
    Text,
    Data,
}

/// A section's byte stream plus its intended load address. The load
/// address participates in relocation arithmetic and stays 0 until a
/// loader has a reason to move a section.
#[derive(Default, Debug)]
pub struct Section {
    pub offset: usize,
    pub content: Vec<u8>,
}

/// A label definition: where in which section an identifier points.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LabelDef {
    pub section: SectionId,
    pub offset: usize,
}

/// How a relocation's placeholder byte gets computed at link time.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RelocKind {
    /// Signed displacement from `index + offset` to the label.
    Relative { label: String, offset: i32 },
    /// The label's address itself.
    Absolute { label: String },
}

/// A deferred byte patch, resolved by the linker against the label
/// table. The span points at the referencing operand for diagnostics.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Relocation {
    pub index: usize,
    pub span: Span,
    pub kind: RelocKind,
}

/// Everything the assembler produces and the linker consumes.
#[derive(Default, Debug)]
pub struct Assembly {
    pub text: Section,
    pub data: Section,
    pub current: SectionId,
    pub labels: FxHashMap<String, LabelDef>,
    pub defines: FxHashMap<String, i32>,
    pub relocations: Vec<Relocation>,
}

impl Default for SectionId {
    fn default() -> Self {
        SectionId::Text
    }
}

impl Assembly {
    pub fn new() -> Self {
        Assembly::default()
    }

    pub fn section(&self, id: SectionId) -> &Section {
        match id {
            SectionId::Text => &self.text,
            SectionId::Data => &self.data,
        }
    }

    /// Byte stream that emitted bytes currently append to.
    pub fn current_mut(&mut self) -> &mut Vec<u8> {
        match self.current {
            SectionId::Text => &mut self.text.content,
            SectionId::Data => &mut self.data.content,
        }
    }

    pub fn emit(&mut self, byte: u8) {
        self.current_mut().push(byte);
    }

    /// Some is returned if the label already exists
    pub fn insert_label(&mut self, name: String) -> Option<LabelDef> {
        let def = LabelDef {
            section: self.current,
            offset: self.section(self.current).content.len(),
        };
        self.labels.insert(name, def)
    }
}
