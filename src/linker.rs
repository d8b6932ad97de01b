//! Resolves recorded relocations against the label table and patches
//! the placeholder bytes in TEXT. Addresses are computed in TEXT-space:
//! a label's address is its section's load offset plus its offset
//! within the section.

use miette::Result;

use crate::error;
use crate::symbol::{Assembly, RelocKind};

/// Patch every relocation in place. On success the relocation list is
/// consumed and the sections are final.
pub fn link(a: &mut Assembly, src: &'static str) -> Result<()> {
    let relocations = std::mem::take(&mut a.relocations);

    for reloc in &relocations {
        let (label, offset) = match &reloc.kind {
            RelocKind::Relative { label, offset } => (label, Some(*offset)),
            RelocKind::Absolute { label } => (label, None),
        };

        let Some(def) = a.labels.get(label) else {
            return Err(error::link_unknown_label(reloc.span, src, label));
        };
        let target = (a.section(def.section).offset + def.offset) as i64;

        let value = match offset {
            // Signed displacement measured from index + offset
            Some(offset) => {
                let rel = target - (reloc.index as i64 + offset as i64);
                if !(-128..=127).contains(&rel) {
                    return Err(error::link_relative_range(reloc.span, src, rel));
                }
                rel as u8
            }
            None => {
                if !(0..=255).contains(&target) {
                    return Err(error::link_absolute_range(reloc.span, src, target));
                }
                target as u8
            }
        };

        // Relocations only ever patch TEXT, even when the placeholder
        // was emitted while DATA was selected.
        let Some(byte) = a.text.content.get_mut(reloc.index) else {
            return Err(error::link_unknown_label(reloc.span, src, label));
        };
        *byte = value;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::Assembler;
    use crate::span::Span;
    use crate::symbol::{LabelDef, RelocKind, Relocation, SectionId};

    fn linked(src: &'static str) -> Assembly {
        let mut a = Assembler::new(src).assemble().unwrap();
        link(&mut a, src).unwrap();
        a
    }

    #[test]
    fn link_backward_branch() {
        let a = linked("LOOP:\nNOP\nB LOOP");
        assert_eq!(a.text.content, vec![0x00, 0xAC, 0xFF]);
        assert!(a.relocations.is_empty());
    }

    #[test]
    fn link_forward_branch() {
        let a = linked("B DONE\nNOP\nDONE:");
        // Displacement measured from the opcode byte to offset 3
        assert_eq!(a.text.content, vec![0xAC, 0x03, 0x00]);
    }

    #[test]
    fn link_absolute_into_data() {
        let a = linked(".DATA\nMSG:\n.STRING \"Hi\"\n.TEXT\nLDA MSG\nSTA 255");
        assert_eq!(a.data.content, vec![0x48, 0x69, 0x00]);
        assert_eq!(a.text.content, vec![0x7C, 0x00, 0x94, 0xFF]);
    }

    #[test]
    fn link_absolute_nonzero_offset() {
        let a = linked(".DATA\n.BYTE 1\n.BYTE 2\nHERE:\n.TEXT\nLDA HERE");
        assert_eq!(a.text.content, vec![0x7C, 0x02]);
    }

    #[test]
    fn link_unknown_label_errors() {
        let src = "B NOWHERE";
        let mut a = Assembler::new(src).assemble().unwrap();
        assert!(link(&mut a, src).is_err());
    }

    #[test]
    fn link_deterministic() {
        let src = "LOOP:\nNOP\nB LOOP\nLDA LOOP";
        let first = linked(src).text.content;
        let second = linked(src).text.content;
        assert_eq!(first, second);
    }

    // Range checks exercised on hand-built assemblies, like the
    // emit-range tests do for instruction offsets.

    fn assembly_with(label_offset: usize, kind: RelocKind, index: usize) -> Assembly {
        let mut a = Assembly::new();
        a.text.content = vec![0; index + 1];
        a.data.content = vec![0; label_offset];
        a.labels.insert(
            "FAR".to_string(),
            LabelDef {
                section: SectionId::Data,
                offset: label_offset,
            },
        );
        a.relocations.push(Relocation {
            index,
            span: Span::dummy(),
            kind,
        });
        a
    }

    #[test]
    fn link_absolute_out_of_range() {
        let mut a = assembly_with(
            300,
            RelocKind::Absolute {
                label: "FAR".to_string(),
            },
            0,
        );
        assert!(link(&mut a, "").is_err());

        let mut a = assembly_with(
            255,
            RelocKind::Absolute {
                label: "FAR".to_string(),
            },
            0,
        );
        assert!(link(&mut a, "").is_ok());
    }

    #[test]
    fn link_relative_out_of_range() {
        let mut a = assembly_with(
            200,
            RelocKind::Relative {
                label: "FAR".to_string(),
                offset: -1,
            },
            0,
        );
        assert!(link(&mut a, "").is_err());

        let mut a = assembly_with(
            126,
            RelocKind::Relative {
                label: "FAR".to_string(),
                offset: -1,
            },
            0,
        );
        assert!(link(&mut a, "").is_ok());
    }

    #[test]
    fn link_relative_negative_range() {
        // Displacement of -128 fits, -129 does not
        let mut a = assembly_with(
            0,
            RelocKind::Relative {
                label: "FAR".to_string(),
                offset: -1,
            },
            129,
        );
        assert!(link(&mut a, "").is_ok());

        let mut a = assembly_with(
            0,
            RelocKind::Relative {
                label: "FAR".to_string(),
                offset: -1,
            },
            130,
        );
        assert!(link(&mut a, "").is_err());
    }
}
