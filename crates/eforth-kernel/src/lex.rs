//! Header length-byte flags.

use bitflags::bitflags;

bitflags! {
    /// Flag bits carried in a dictionary header's length byte.
    ///
    /// The low 5 bits hold the name length (0..31); these two bits share the
    /// byte above it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Lex: u8 {
        /// Word executes even in compile mode.
        const IMMEDIATE = 0x80;
        /// Word may only appear inside a definition.
        const COMPILE_ONLY = 0x40;
    }
}

impl Lex {
    /// Mask for the name-length bits.
    pub const LEN_MASK: u8 = 0x1F;
}
