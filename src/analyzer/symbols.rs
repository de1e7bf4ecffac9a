// src/analyzer/symbols.rs

use crate::types::DataType;
use crate::utils::{Position, Span};
use std::collections::HashMap;
use std::fmt;

/// 符号表中存储的一个变量声明。
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub data_type: DataType,
    /// 声明所在的作用域深度。最外层代码块为 1。
    pub scope: usize,
    pub position: Position,
    pub span: Span,
    pub initialized: bool,
    pub used: bool,
    /// 声明所在的代码块退出后置为 false，之后既不能被查找到，也不阻止同名重新声明。
    live: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, data_type: DataType, scope: usize, position: Position, span: Span) -> Self {
        Self {
            name: name.into(),
            data_type,
            scope,
            position,
            span,
            initialized: false,
            used: false,
            live: true,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.name, self.data_type, self.scope, self.position.line)
    }
}

/// 符号表：名字到符号列表的映射，加上一个整数作用域深度。
///
/// Scopes are not separate tables. Entering a block bumps the depth and
/// leaving it drops the depth back. The block's symbols stay in the table so
/// the dump and the unused-variable warnings still see them.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    table: HashMap<String, Vec<Symbol>>,
    current_scope: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.current_scope += 1;
    }

    /// 退出当前作用域。深度为 0 时什么也不做。
    pub fn exit_scope(&mut self) {
        if self.current_scope == 0 {
            return;
        }
        let leaving = self.current_scope;
        self.table
            .values_mut()
            .flatten()
            .filter(|symbol| symbol.scope == leaving)
            .for_each(|symbol| symbol.live = false);
        self.current_scope -= 1;
    }

    pub fn current_scope(&self) -> usize {
        self.current_scope
    }

    /// 在符号自己的作用域深度注册它。
    ///
    /// Fails with the span of the earlier declaration when a live symbol with
    /// the same name already sits at that depth.
    pub fn add(&mut self, symbol: Symbol) -> Result<(), Span> {
        let entries = self.table.entry(symbol.name.clone()).or_default();
        if let Some(existing) = entries.iter().find(|s| s.live && s.scope == symbol.scope) {
            return Err(existing.span);
        }
        entries.push(symbol);
        Ok(())
    }

    fn find_index(&self, name: &str) -> Option<usize> {
        let entries = self.table.get(name)?;
        (0..=self.current_scope)
            .rev()
            .find_map(|scope| entries.iter().position(|s| s.live && s.scope == scope))
    }

    /// 从当前深度向 0 逐层查找，返回第一个命中的符号。
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let index = self.find_index(name)?;
        self.table.get(name).and_then(|entries| entries.get(index))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let index = self.find_index(name)?;
        self.table.get_mut(name).and_then(|entries| entries.get_mut(index))
    }

    /// 所有符号，按作用域深度、名字、声明位置排序。
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut all: Vec<&Symbol> = self.table.values().flatten().collect();
        all.sort_by(|a, b| {
            (a.scope, &a.name, a.position).cmp(&(b.scope, &b.name, b.position))
        });
        all
    }

    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "------------------------";
        writeln!(f, "Symbol Table")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Name\tType\tScope\tLine")?;
        writeln!(f, "{}", RULE)?;
        for symbol in self.symbols() {
            writeln!(f, "{}", symbol)?;
        }
        writeln!(f, "{}", RULE)
    }
}
