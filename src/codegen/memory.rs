//! 静态内存布局：一个程序单元的全部存储都在编译期分配好。

use std::collections::HashMap;

pub const MEMORY_SIZE: usize = 256;
/// 二元运算的暂存槽位，每层嵌套一个。
pub const SCRATCH_BASE: u8 = 0x90;
pub const SCRATCH_SLOTS: usize = 16;
pub const VARIABLE_BASE: u8 = 0xA0;
pub const STRING_BASE: u8 = 0xC0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    variables: HashMap<String, u8>,
    next_variable: u8,
    strings: HashMap<String, u8>,
    /// (地址, 内容)，按分配顺序。
    string_data: Vec<(u8, String)>,
    next_string: usize,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
            next_variable: VARIABLE_BASE,
            strings: HashMap::new(),
            string_data: Vec::new(),
            next_string: STRING_BASE as usize,
        }
    }
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第一次见到这个名字时分配一个字节，之后复用同一地址。
    ///
    /// Identifiers are single lowercase letters, so the 32-byte variable region
    /// cannot run out.
    pub fn allocate_variable(&mut self, name: &str) -> u8 {
        if let Some(&address) = self.variables.get(name) {
            return address;
        }
        let address = self.next_variable;
        self.next_variable = self.next_variable.wrapping_add(1);
        self.variables.insert(name.to_string(), address);
        address
    }

    pub fn variable(&self, name: &str) -> Option<u8> {
        self.variables.get(name).copied()
    }

    /// 按内容去重分配字符串，占用 `len + 1` 字节。区域用尽时返回 `None`。
    pub fn allocate_string(&mut self, text: &str) -> Option<u8> {
        if let Some(&address) = self.strings.get(text) {
            return Some(address);
        }
        let end = self.next_string + text.len() + 1;
        if end > MEMORY_SIZE {
            return None;
        }
        let address = u8::try_from(self.next_string).ok()?;
        self.next_string = end;
        self.strings.insert(text.to_string(), address);
        self.string_data.push((address, text.to_string()));
        Some(address)
    }

    pub fn string_data(&self) -> &[(u8, String)] {
        &self.string_data
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// 第 `depth` 层嵌套使用的暂存地址。
    pub fn scratch(depth: usize) -> Option<u8> {
        (depth < SCRATCH_SLOTS).then(|| SCRATCH_BASE + depth as u8)
    }
}
