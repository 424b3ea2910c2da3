//! Character transport interface.

/// Character-at-a-time terminal transport.
///
/// The VM touches the host only through this trait, from the `?RX` and `TX!`
/// primitives. An interactive implementation blocks in `read_char` until a
/// key arrives; a scripted one returns `None` once its input is exhausted,
/// which the VM treats as the end of the session.
pub trait Console {
    /// Read one character, or `None` when the input source is exhausted.
    fn read_char(&mut self) -> Option<u8>;

    /// Write one character to the output device.
    fn write_char(&mut self, c: u8);
}
