use super::memory::{MemoryMap, MEMORY_SIZE, SCRATCH_BASE};
use std::fmt;
use tracing::warn;

/// 256 字节的内存映像：代码从 0 开始，字符串数据位于各自分配的地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: [u8; MEMORY_SIZE],
}

impl MemoryImage {
    pub fn pack(code: &[u8], memory: &MemoryMap) -> Self {
        let mut bytes = [0u8; MEMORY_SIZE];

        if code.len() > MEMORY_SIZE {
            warn!(target: "codegen", "code is {} bytes; truncated to {}", code.len(), MEMORY_SIZE);
        } else if code.len() > SCRATCH_BASE as usize {
            warn!(target: "codegen", "code ({} bytes) overlaps the data region at ${:02X}", code.len(), SCRATCH_BASE);
        }
        let code_len = code.len().min(MEMORY_SIZE);
        bytes[..code_len].copy_from_slice(&code[..code_len]);

        for (address, text) in memory.string_data() {
            let start = *address as usize;
            for (offset, byte) in text.bytes().chain(std::iter::once(0)).enumerate() {
                if let Some(slot) = bytes.get_mut(start + offset) {
                    *slot = byte;
                }
            }
        }
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, address: u8) -> u8 {
        self.bytes[address as usize]
    }
}

/// 16 × 16 的十六进制网格。
impl fmt::Display for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            write!(f, "{:02X}:", row * 16)?;
            for byte in chunk {
                write!(f, " {:02X}", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
