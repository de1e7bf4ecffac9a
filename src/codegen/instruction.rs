use std::fmt;

/// 目标机的指令集。每个变体对应一个确定的寻址方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    LdaImmediate,
    LdaMemory,
    Sta,
    Adc,
    LdxImmediate,
    LdxMemory,
    LdyImmediate,
    LdyMemory,
    Cpx,
    Bne,
    Nop,
    Sys,
    Brk,
}

/// 操作数在指令流中的编码方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Immediate,
    Address,
    Relative,
}

impl Opcode {
    pub fn byte(self) -> u8 {
        match self {
            Opcode::LdaImmediate => 0xA9,
            Opcode::LdaMemory => 0xAD,
            Opcode::Sta => 0x8D,
            Opcode::Adc => 0x6D,
            Opcode::LdxImmediate => 0xA2,
            Opcode::LdxMemory => 0xAE,
            Opcode::LdyImmediate => 0xA0,
            Opcode::LdyMemory => 0xAC,
            Opcode::Cpx => 0xEC,
            Opcode::Bne => 0xD0,
            Opcode::Nop => 0xEA,
            Opcode::Sys => 0xFF,
            Opcode::Brk => 0x00,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::LdaImmediate | Opcode::LdaMemory => "LDA",
            Opcode::Sta => "STA",
            Opcode::Adc => "ADC",
            Opcode::LdxImmediate | Opcode::LdxMemory => "LDX",
            Opcode::LdyImmediate | Opcode::LdyMemory => "LDY",
            Opcode::Cpx => "CPX",
            Opcode::Bne => "BNE",
            Opcode::Nop => "NOP",
            Opcode::Sys => "SYS",
            Opcode::Brk => "BRK",
        }
    }

    pub fn operand_kind(self) -> OperandKind {
        match self {
            Opcode::LdaImmediate | Opcode::LdxImmediate | Opcode::LdyImmediate => OperandKind::Immediate,
            Opcode::LdaMemory
            | Opcode::Sta
            | Opcode::Adc
            | Opcode::LdxMemory
            | Opcode::LdyMemory
            | Opcode::Cpx => OperandKind::Address,
            Opcode::Bne => OperandKind::Relative,
            Opcode::Nop | Opcode::Sys | Opcode::Brk => OperandKind::None,
        }
    }
}

/// 相对跳转的偏移量槽位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relative {
    /// 占位符：等待回填，或回填失败后保持原样。
    Pending,
    Resolved(i8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Immediate(u8),
    Address(u8),
    Relative(Relative),
}

impl Operand {
    /// 编码后的字节。地址为两字节，低字节在前；未解析的偏移量编码为 `00`。
    pub fn bytes(self) -> Vec<u8> {
        match self {
            Operand::None => Vec::new(),
            Operand::Immediate(value) => vec![value],
            Operand::Address(address) => vec![address, 0x00],
            Operand::Relative(Relative::Resolved(offset)) => vec![offset as u8],
            Operand::Relative(Relative::Pending) => vec![0x00],
        }
    }

    pub fn kind(self) -> OperandKind {
        match self {
            Operand::None => OperandKind::None,
            Operand::Immediate(_) => OperandKind::Immediate,
            Operand::Address(_) => OperandKind::Address,
            Operand::Relative(_) => OperandKind::Relative,
        }
    }

    pub fn width(self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Immediate(_) | Operand::Relative(_) => 1,
            Operand::Address(_) => 2,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Immediate(value) => write!(f, "{:02X}", value),
            Operand::Address(address) => write!(f, "{:02X} 00", address),
            Operand::Relative(Relative::Resolved(offset)) => write!(f, "{:02X}", *offset as u8),
            Operand::Relative(Relative::Pending) => f.write_str("XX"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Operand,
    pub comment: String,
}

impl Instruction {
    pub fn width(&self) -> usize {
        1 + self.operand.width()
    }

    /// 清单中占的行数：操作码一行，有操作数时再加一行。
    pub fn line_count(&self) -> usize {
        if self.operand == Operand::None { 1 } else { 2 }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode.byte()];
        bytes.extend(self.operand.bytes());
        bytes
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} ; {} - {}", self.opcode.byte(), self.opcode.mnemonic(), self.comment)?;
        if self.operand != Operand::None {
            write!(f, "\n{}", self.operand)?;
        }
        Ok(())
    }
}

/// 输出清单中的一行：注释，或一条指令（及其操作数行）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Comment(String),
    Instruction(Instruction),
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Comment(text) => write!(f, "; {}", text),
            Line::Instruction(instruction) => write!(f, "{}", instruction),
        }
    }
}

/// 代码生成的文本输出，同时跟踪已发出的指令行数。
///
/// A position counts the opcode and operand lines emitted so far. Comment
/// lines do not count, so an address operand (`A0 00`) is one line even
/// though it encodes two bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    lines: Vec<Line>,
    position: usize,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Comment(text.into()));
    }

    /// 发出一条指令，返回它的起始位置。
    pub fn emit(&mut self, opcode: Opcode, operand: Operand, comment: impl Into<String>) -> usize {
        debug_assert_eq!(opcode.operand_kind(), operand.kind(), "operand does not fit {:?}", opcode);
        let start = self.position;
        let instruction = Instruction {
            opcode,
            operand,
            comment: comment.into(),
        };
        self.position += instruction.line_count();
        self.lines.push(Line::Instruction(instruction));
        start
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// 代码流的字节数。
    pub fn byte_len(&self) -> usize {
        self.instructions().map(Instruction::width).sum()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(|line| match line {
            Line::Instruction(instruction) => Some(instruction),
            Line::Comment(_) => None,
        })
    }

    /// 按发出顺序找到第一个仍在等待回填的偏移量槽位。
    pub(super) fn first_pending(&self) -> Option<usize> {
        self.lines.iter().position(|line| {
            matches!(
                line,
                Line::Instruction(Instruction {
                    operand: Operand::Relative(Relative::Pending),
                    ..
                })
            )
        })
    }

    pub(super) fn set_relative(&mut self, index: usize, relative: Relative) {
        if let Some(Line::Instruction(instruction)) = self.lines.get_mut(index) {
            instruction.operand = Operand::Relative(relative);
        }
    }

    pub(super) fn insert_comment(&mut self, index: usize, text: impl Into<String>) {
        self.lines.insert(index.min(self.lines.len()), Line::Comment(text.into()));
    }

    /// 整个代码流的字节。
    pub fn bytes(&self) -> Vec<u8> {
        self.instructions().flat_map(Instruction::bytes).collect()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.lines.iter().try_for_each(|line| writeln!(f, "{}", line))
    }
}
