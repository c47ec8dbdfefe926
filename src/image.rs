use crate::opcode::OpCode;

/// Append-only bytecode image. Each instruction is one opcode byte followed
/// by an optional 4-byte big-endian operand. Forward references reserve a
/// zeroed operand (`hole`) whose offset is patched once the target address
/// is known; offsets are always indexes into the buffer, never pointers, so
/// the buffer stays relocatable as it grows.
#[derive(Debug, Default)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn new() -> Self {
        Image::default()
    }

    /// Current write offset, the instruction pointer of the next emit.
    pub fn mark(&self) -> usize {
        self.bytes.len()
    }

    pub fn emit_op(&mut self, op: OpCode) {
        self.bytes.push(op.into());
    }

    pub fn emit_int(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn emit_real(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Reserve a 4-byte operand for a not-yet-known address and return its
    /// offset for a later `patch_int`.
    pub fn hole(&mut self) -> usize {
        let at = self.mark();
        self.emit_int(0);
        at
    }

    /// Overwrite the 4 bytes at `offset` in place. Patching an offset that
    /// was never emitted is an internal defect and panics.
    pub fn patch_int(&mut self, offset: usize, value: i32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
