//! TIFF structure primitives: byte order, header, field types, raw IFD entries.
//! All readers are bounds-checked and return `None` instead of panicking.

/// TIFF magic number following the byte-order mark.
pub const TIFF_MAGIC: u16 = 0x002A;
/// Size of the TIFF header in bytes.
pub const TIFF_HEADER_LEN: usize = 8;
/// Size of one IFD entry in bytes.
pub const IFD_ENTRY_LEN: usize = 12;
/// Bytes available for an inline value inside an entry.
pub const INLINE_VALUE_LEN: usize = 4;

/// Byte order of a TIFF stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub fn read_u16(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes = data.get(offset..offset.checked_add(2)?)?;
        Some(self.u16_from([bytes[0], bytes[1]]))
    }

    #[inline]
    pub fn read_u32(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes = data.get(offset..offset.checked_add(4)?)?;
        Some(self.u32_from([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn u16_from(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn u64_from(self, bytes: [u8; 8]) -> u64 {
        match self {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        }
    }
}

/// Check the TIFF header and return (byte order, IFD0 offset).
pub fn read_tiff_header(data: &[u8]) -> Result<(Endian, u32), String> {
    if data.len() < TIFF_HEADER_LEN {
        return Err(format!("TIFF header needs 8 bytes, blob has {}", data.len()));
    }
    let endian = match &data[0..2] {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        other => return Err(format!("invalid byte-order mark {other:02x?}")),
    };
    let magic = endian.read_u16(data, 2).unwrap_or_default();
    if magic != TIFF_MAGIC {
        return Err(format!("invalid TIFF magic 0x{magic:04x}"));
    }
    let ifd0 = endian.read_u32(data, 4).unwrap_or_default();
    Ok((endian, ifd0))
}

/// EXIF primitive field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
}

impl TagType {
    pub fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            1 => TagType::Byte,
            2 => TagType::Ascii,
            3 => TagType::Short,
            4 => TagType::Long,
            5 => TagType::Rational,
            6 => TagType::SByte,
            7 => TagType::Undefined,
            8 => TagType::SShort,
            9 => TagType::SLong,
            10 => TagType::SRational,
            11 => TagType::Float,
            12 => TagType::Double,
            _ => return None,
        })
    }

    pub fn id(self) -> u16 {
        match self {
            TagType::Byte => 1,
            TagType::Ascii => 2,
            TagType::Short => 3,
            TagType::Long => 4,
            TagType::Rational => 5,
            TagType::SByte => 6,
            TagType::Undefined => 7,
            TagType::SShort => 8,
            TagType::SLong => 9,
            TagType::SRational => 10,
            TagType::Float => 11,
            TagType::Double => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TagType::Byte => "BYTE",
            TagType::Ascii => "ASCII",
            TagType::Short => "SHORT",
            TagType::Long => "LONG",
            TagType::Rational => "RATIONAL",
            TagType::SByte => "SBYTE",
            TagType::Undefined => "UNDEFINED",
            TagType::SShort => "SSHORT",
            TagType::SLong => "SLONG",
            TagType::SRational => "SRATIONAL",
            TagType::Float => "FLOAT",
            TagType::Double => "DOUBLE",
        }
    }

    /// Size in bytes of one unit of this type.
    pub fn unit_size(self) -> usize {
        match self {
            TagType::Byte | TagType::Ascii | TagType::SByte | TagType::Undefined => 1,
            TagType::Short | TagType::SShort => 2,
            TagType::Long | TagType::SLong | TagType::Float => 4,
            TagType::Rational | TagType::SRational | TagType::Double => 8,
        }
    }
}

/// One undecoded 12-byte directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry {
    pub tag: u16,
    pub type_id: u16,
    pub count: u32,
    pub value_offset: u32,
    /// Offset of the entry itself within the blob.
    pub position: usize,
}

impl RawEntry {
    /// Offset of the 4-byte value-or-offset field.
    pub fn value_field(&self) -> usize {
        self.position + 8
    }
}

/// Read one IFD entry at `offset` (12 bytes must be available).
pub fn read_raw_entry(endian: Endian, data: &[u8], offset: usize) -> Option<RawEntry> {
    Some(RawEntry {
        tag: endian.read_u16(data, offset)?,
        type_id: endian.read_u16(data, offset + 2)?,
        count: endian.read_u32(data, offset + 4)?,
        value_offset: endian.read_u32(data, offset + 8)?,
        position: offset,
    })
}
