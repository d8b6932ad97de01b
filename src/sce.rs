//! The SCE on-disk container: a 4-byte magic followed by any number of
//! named sections, each a 4-byte ASCII name, a little-endian u32 size
//! and that many content bytes.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// `ESC S C E`
pub const MAGIC: [u8; 4] = [0x1B, b'S', b'C', b'E'];

const NAME_TEXT: [u8; 4] = *b"TEXT";
const NAME_DATA: [u8; 4] = *b"DATA";

/// A loaded (or to-be-written) program image.
#[derive(Default, PartialEq, Eq, Debug)]
pub struct Image {
    pub text: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub enum SceError {
    BadMagic,
    ShortRead,
    UnknownSection([u8; 4]),
    Io(io::Error),
}

impl fmt::Display for SceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "missing SCE magic"),
            Self::ShortRead => write!(f, "section content cut short"),
            Self::UnknownSection(name) => {
                write!(f, "unknown section name {:?}", String::from_utf8_lossy(name))
            }
            Self::Io(e) => write!(f, "read error: {e}"),
        }
    }
}

impl std::error::Error for SceError {}

impl From<io::Error> for SceError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => SceError::ShortRead,
            _ => SceError::Io(e),
        }
    }
}

/// Serialize an image. TEXT and DATA are always both written, in that
/// order, so output is deterministic.
pub fn write(w: &mut impl Write, image: &Image) -> io::Result<()> {
    w.write_all(&MAGIC)?;
    for (name, content) in [(NAME_TEXT, &image.text), (NAME_DATA, &image.data)] {
        w.write_all(&name)?;
        w.write_u32::<LittleEndian>(content.len() as u32)?;
        w.write_all(content)?;
    }
    Ok(())
}

/// Parse an image. End-of-file between sections terminates; repeated
/// sections append their content.
pub fn read(r: &mut impl Read) -> Result<Image, SceError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(|_| SceError::BadMagic)?;
    if magic != MAGIC {
        return Err(SceError::BadMagic);
    }

    let mut image = Image::default();
    loop {
        let mut name = [0u8; 4];
        if !read_name(r, &mut name)? {
            break;
        }

        let section = match name {
            NAME_TEXT => &mut image.text,
            NAME_DATA => &mut image.data,
            _ => return Err(SceError::UnknownSection(name)),
        };

        let size = r.read_u32::<LittleEndian>()? as usize;
        let start = section.len();
        section.resize(start + size, 0);
        r.read_exact(&mut section[start..])?;
    }

    Ok(image)
}

/// Distinguishes clean end-of-file (no more sections) from a name cut
/// short mid-way.
fn read_name(r: &mut impl Read, name: &mut [u8; 4]) -> Result<bool, SceError> {
    let mut filled = 0;
    while filled < name.len() {
        let n = r.read(&mut name[filled..]).map_err(SceError::Io)?;
        if n == 0 {
            return if filled == 0 {
                Ok(false)
            } else {
                Err(SceError::ShortRead)
            };
        }
        filled += n;
    }
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip() {
        let image = Image {
            text: vec![0x54, 0x05],
            data: vec![0x48, 0x69, 0x00],
        };
        let mut buf = Vec::new();
        write(&mut buf, &image).unwrap();
        assert_eq!(&buf[..4], &MAGIC);
        assert_eq!(read(&mut buf.as_slice()).unwrap(), image);
    }

    #[test]
    fn empty_sections() {
        let mut buf = Vec::new();
        write(&mut buf, &Image::default()).unwrap();
        let image = read(&mut buf.as_slice()).unwrap();
        assert!(image.text.is_empty());
        assert!(image.data.is_empty());
    }

    #[test]
    fn repeated_sections_append() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        for chunk in [&[1u8, 2][..], &[3][..]] {
            buf.extend_from_slice(b"TEXT");
            buf.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            buf.extend_from_slice(chunk);
        }
        let image = read(&mut buf.as_slice()).unwrap();
        assert_eq!(image.text, vec![1, 2, 3]);
    }

    #[test]
    fn bad_magic() {
        let buf = b"SCE\x1b".to_vec();
        assert!(matches!(
            read(&mut buf.as_slice()),
            Err(SceError::BadMagic)
        ));
        assert!(matches!(read(&mut "".as_bytes()), Err(SceError::BadMagic)));
    }

    #[test]
    fn unknown_section() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(b"BLOB");
        buf.extend_from_slice(&4u32.to_le_bytes());
        assert!(matches!(
            read(&mut buf.as_slice()),
            Err(SceError::UnknownSection(_))
        ));
    }

    #[test]
    fn short_content() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(b"TEXT");
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            read(&mut buf.as_slice()),
            Err(SceError::ShortRead)
        ));
    }

    #[test]
    fn short_name() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(b"TE");
        assert!(matches!(
            read(&mut buf.as_slice()),
            Err(SceError::ShortRead)
        ));
    }
}
