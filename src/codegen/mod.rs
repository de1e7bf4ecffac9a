// src/codegen/mod.rs
//
// 代码生成：一次遍历 AST 发出 8 位累加器机的指令，随后回填分支偏移量。

mod backpatch;
mod codegen_error;
mod image;
mod instruction;
mod memory;


pub use backpatch::Backpatcher;
pub use codegen_error::CodeGenError;
pub use image::MemoryImage;
pub use instruction::{Instruction, Line, Listing, Opcode, Operand, OperandKind, Relative};
pub use memory::{MemoryMap, MEMORY_SIZE, SCRATCH_BASE, SCRATCH_SLOTS, STRING_BASE, VARIABLE_BASE};

use crate::ast::{AstKind, AstNode};
use crate::diagnostics::DiagnosticBag;
use crate::types::DataType;
use std::collections::HashMap;
use tracing::{debug, info};

/// 系统调用编号：放在 X 中，Y 是参数。
const SYS_PRINT_INTEGER: u8 = 0x01;
const SYS_PRINT_STRING: u8 = 0x02;

/// 一个程序单元的代码生成结果。
#[derive(Debug, Clone)]
pub struct CodeGenOutcome {
    pub listing: Listing,
    pub memory: MemoryMap,
    pub image: MemoryImage,
    pub error_count: usize,
}

impl CodeGenOutcome {
    pub fn succeeded(&self) -> bool {
        self.error_count == 0
    }
}

/// 代码生成器：状态的唯一所有者，每个程序单元一个实例。
pub struct CodeGenerator<'d> {
    listing: Listing,
    memory: MemoryMap,
    backpatcher: Backpatcher,
    /// 每个代码块一层：声明时记录的变量类型，用于选择打印的系统调用。
    scopes: Vec<HashMap<String, DataType>>,
    /// 当前二元运算的嵌套深度，决定使用哪个暂存槽位。
    depth: usize,
    diagnostics: &'d mut DiagnosticBag,
    error_count: usize,
}

// --- Trait 定义：组织代码生成逻辑 ---

/// `StatementCodeGen` Trait 负责为各类语句发出指令。
trait StatementCodeGen {
    fn generate_block(&mut self, block: &AstNode);
    /// 分发函数。
    fn generate_statement(&mut self, node: &AstNode);
    fn generate_declaration(&mut self, node: &AstNode);
    fn generate_assignment(&mut self, node: &AstNode);
    fn generate_print(&mut self, node: &AstNode);
    fn generate_if(&mut self, node: &AstNode);
    fn generate_while(&mut self, node: &AstNode);
}

/// `ExpressionCodeGen` Trait 负责表达式：结果总是留在累加器中。
trait ExpressionCodeGen {
    /// 分发函数。
    fn generate_expression(&mut self, node: &AstNode);
    fn generate_literal(&mut self, node: &AstNode);
    fn generate_addition(&mut self, node: &AstNode);
    fn generate_boolean(&mut self, node: &AstNode);
    fn generate_comparison(&mut self, left: &AstNode, right: &AstNode, equality: bool, node: &AstNode);
}

impl<'d> CodeGenerator<'d> {
    pub fn new(diagnostics: &'d mut DiagnosticBag) -> Self {
        Self {
            listing: Listing::new(),
            memory: MemoryMap::new(),
            backpatcher: Backpatcher::new(),
            scopes: Vec::new(),
            depth: 0,
            diagnostics,
            error_count: 0,
        }
    }

    /// 顶层入口：发出整个程序，追加 BRK，回填分支，最后打包内存映像。
    pub fn generate(mut self, root: &AstNode) -> CodeGenOutcome {
        debug!(target: "codegen", "starting code generation");
        self.generate_block(root);
        self.listing.emit(Opcode::Brk, Operand::None, "Program End");

        let backpatcher = std::mem::take(&mut self.backpatcher);
        for error in backpatcher.resolve(&mut self.listing) {
            self.report(error);
        }

        let image = MemoryImage::pack(&self.listing.bytes(), &self.memory);
        info!(
            target: "codegen",
            bytes = self.listing.byte_len(),
            variables = self.memory.variable_count(),
            strings = self.memory.string_data().len(),
            errors = self.error_count,
            "code generation finished"
        );

        CodeGenOutcome {
            listing: self.listing,
            memory: self.memory,
            image,
            error_count: self.error_count,
        }
    }

    fn report(&mut self, error: CodeGenError) {
        self.error_count += 1;
        debug!(target: "codegen", "{:?}", error);
        self.diagnostics.report(error.into());
    }

    fn emit(&mut self, opcode: Opcode, operand: Operand, comment: impl Into<String>) -> usize {
        self.listing.emit(opcode, operand, comment)
    }

    /// 第 `depth` 层的暂存地址；超出槽位数时报告错误。
    fn scratch(&mut self, depth: usize, node: &AstNode) -> Option<u8> {
        let slot = MemoryMap::scratch(depth);
        if slot.is_none() {
            self.report(CodeGenError::ExpressionTooDeep {
                position: node.position,
                span: node.span,
            });
        }
        slot
    }

    // --- 辅助函数 ---

    /// 计算条件，与 true 比较，不相等时跳到 `target`。
    fn generate_branch_unless_true(&mut self, condition: &AstNode, target: &str, statement: &AstNode) {
        self.generate_expression(condition);
        let Some(slot) = self.scratch(self.depth, statement) else {
            return;
        };
        self.emit(Opcode::Sta, Operand::Address(slot), "Stage condition");
        self.emit(Opcode::LdxImmediate, Operand::Immediate(0x01), "Load true into X");
        self.emit(Opcode::Cpx, Operand::Address(slot), "Compare condition with true");
        self.emit_branch(target, format!("Branch to {} if condition is false", target), statement);
    }

    fn emit_branch(&mut self, target: &str, comment: impl Into<String>, source: &AstNode) {
        let position = self.emit(Opcode::Bne, Operand::Relative(Relative::Pending), comment);
        self.backpatcher.branch(target, position, (source.position, source.span));
    }

    fn variable_address(&mut self, id: &AstNode) -> Option<u8> {
        let name = id.value()?;
        let address = self.memory.variable(name);
        if address.is_none() {
            self.report(CodeGenError::UndefinedVariable {
                name: name.to_string(),
                position: id.position,
                span: id.span,
            });
        }
        address
    }

    /// 打印时使用的类型：变量取最内层可见声明的类型，其余按表达式形状判断。
    fn expression_type(&self, expr: &AstNode) -> DataType {
        match (expr.kind, expr.value()) {
            (AstKind::Identifier, Some(name)) => self
                .scopes
                .iter()
                .rev()
                .find_map(|scope| scope.get(name).copied())
                .unwrap_or(DataType::Int),
            (AstKind::Value, Some(literal)) if literal.starts_with('"') => DataType::String,
            (AstKind::Value, Some("true" | "false")) | (AstKind::BooleanExpression, _) => DataType::Boolean,
            _ => DataType::Int,
        }
    }
}

impl<'d> StatementCodeGen for CodeGenerator<'d> {
    fn generate_block(&mut self, block: &AstNode) {
        self.listing.comment("Block start");
        self.scopes.push(HashMap::new());
        for statement in &block.children {
            self.generate_statement(statement);
        }
        self.scopes.pop();
        self.listing.comment("Block end");
    }

    fn generate_statement(&mut self, node: &AstNode) {
        match node.kind {
            AstKind::Block => self.generate_block(node),
            AstKind::VariableDeclaration => self.generate_declaration(node),
            AstKind::AssignmentStatement => self.generate_assignment(node),
            AstKind::PrintStatement => self.generate_print(node),
            AstKind::IfStatement => self.generate_if(node),
            AstKind::WhileStatement => self.generate_while(node),
            AstKind::Type
            | AstKind::Identifier
            | AstKind::Value
            | AstKind::BooleanExpression
            | AstKind::Addition => {}
        }
    }

    /// 声明只在编译期分配地址，不发出运行时指令。
    fn generate_declaration(&mut self, node: &AstNode) {
        let (Some(type_node), Some(id)) = (node.child(0), node.child(1)) else {
            return;
        };
        let (Some(data_type), Some(name)) = (type_node.value().and_then(DataType::lookup), id.value()) else {
            return;
        };
        let address = self.memory.allocate_variable(name);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), data_type);
        }
        self.listing
            .comment(format!("Variable '{}' ({}) at address ${:02X}", name, data_type, address));
    }

    fn generate_assignment(&mut self, node: &AstNode) {
        let (Some(id), Some(expr)) = (node.child(0), node.child(1)) else {
            return;
        };
        let Some(address) = self.variable_address(id) else {
            return;
        };
        self.generate_expression(expr);
        self.emit(
            Opcode::Sta,
            Operand::Address(address),
            format!("Store accumulator in '{}'", id.value().unwrap_or_default()),
        );
    }

    fn generate_print(&mut self, node: &AstNode) {
        let Some(expr) = node.child(0) else {
            return;
        };
        self.generate_expression(expr);
        let Some(slot) = self.scratch(self.depth, node) else {
            return;
        };

        let (call, what) = match self.expression_type(expr) {
            DataType::String => (SYS_PRINT_STRING, "string"),
            DataType::Int | DataType::Boolean => (SYS_PRINT_INTEGER, "integer"),
        };
        self.emit(Opcode::Sta, Operand::Address(slot), "Stage value to print");
        self.emit(Opcode::LdyMemory, Operand::Address(slot), "Load print argument into Y");
        self.emit(
            Opcode::LdxImmediate,
            Operand::Immediate(call),
            format!("System call {:02X}: print {}", call, what),
        );
        self.emit(Opcode::Sys, Operand::None, "System call");
    }

    /// 条件为假时跳过代码块。
    fn generate_if(&mut self, node: &AstNode) {
        let (Some(condition), Some(body)) = (node.child(0), node.child(1)) else {
            return;
        };
        let end = self.backpatcher.new_label();

        self.generate_branch_unless_true(condition, &end, node);
        self.generate_block(body);
        self.backpatcher.define(&end, &mut self.listing);
    }

    /// 条件为假时跳出循环；代码块之后无条件跳回循环开头。
    fn generate_while(&mut self, node: &AstNode) {
        let (Some(condition), Some(body)) = (node.child(0), node.child(1)) else {
            return;
        };
        let start = self.backpatcher.new_label();
        let end = self.backpatcher.new_label();

        self.backpatcher.define(&start, &mut self.listing);
        self.generate_branch_unless_true(condition, &end, node);
        self.generate_block(body);

        // 强制 Z = 0：把 false 与 X 中的 true 比较。
        let Some(slot) = self.scratch(self.depth, node) else {
            return;
        };
        self.emit(Opcode::LdaImmediate, Operand::Immediate(0x00), "Load false to force the loop branch");
        self.emit(Opcode::Sta, Operand::Address(slot), "Stage false");
        self.emit(Opcode::LdxImmediate, Operand::Immediate(0x01), "Load true into X");
        self.emit(Opcode::Cpx, Operand::Address(slot), "Compare true with false");
        self.emit_branch(&start, "Branch back to loop start", node);
        self.backpatcher.define(&end, &mut self.listing);
    }
}

impl<'d> ExpressionCodeGen for CodeGenerator<'d> {
    fn generate_expression(&mut self, node: &AstNode) {
        match node.kind {
            AstKind::Value => self.generate_literal(node),
            AstKind::Identifier => {
                if let Some(address) = self.variable_address(node) {
                    let name = node.value().unwrap_or_default();
                    self.emit(Opcode::LdaMemory, Operand::Address(address), format!("Load '{}'", name));
                }
            }
            AstKind::Addition => self.generate_addition(node),
            AstKind::BooleanExpression => self.generate_boolean(node),
            _ => {}
        }
    }

    fn generate_literal(&mut self, node: &AstNode) {
        let Some(literal) = node.value() else {
            return;
        };
        match literal {
            "true" => {
                self.emit(Opcode::LdaImmediate, Operand::Immediate(0x01), "Load true");
            }
            "false" => {
                self.emit(Opcode::LdaImmediate, Operand::Immediate(0x00), "Load false");
            }
            _ if literal.starts_with('"') => {
                let text = literal.trim_matches('"');
                match self.memory.allocate_string(text) {
                    Some(address) => {
                        self.emit(
                            Opcode::LdaImmediate,
                            Operand::Immediate(address),
                            format!("Load address of {}", literal),
                        );
                    }
                    None => self.report(CodeGenError::StringMemoryExhausted {
                        literal: literal.to_string(),
                        position: node.position,
                        span: node.span,
                    }),
                }
            }
            _ => match literal.parse::<u8>() {
                Ok(value) => {
                    self.emit(Opcode::LdaImmediate, Operand::Immediate(value), format!("Load constant {}", value));
                }
                Err(_) => self.report(CodeGenError::IntegerOutOfRange {
                    literal: literal.to_string(),
                    position: node.position,
                    span: node.span,
                }),
            },
        }
    }

    /// 左操作数先计算并暂存，再计算右操作数，最后相加。
    fn generate_addition(&mut self, node: &AstNode) {
        let (Some(left), Some(right)) = (node.child(0), node.child(1)) else {
            return;
        };
        let Some(slot) = self.scratch(self.depth, node) else {
            return;
        };

        self.depth += 1;
        self.generate_expression(left);
        self.emit(Opcode::Sta, Operand::Address(slot), "Stage left operand");
        self.generate_expression(right);
        self.emit(Opcode::Adc, Operand::Address(slot), "Add left operand");
        self.depth -= 1;
    }

    fn generate_boolean(&mut self, node: &AstNode) {
        match (node.children.as_slice(), node.value()) {
            ([literal], _) => self.generate_expression(literal),
            ([left, right], Some(op)) => self.generate_comparison(left, right, op == "==", node),
            _ => {}
        }
    }

    /// 比较两个操作数并把 1/0 放入累加器。
    ///
    /// Equality loads false, then skips the true-load when X differs from the
    /// right operand. Inequality is the mirror image.
    fn generate_comparison(&mut self, left: &AstNode, right: &AstNode, equality: bool, node: &AstNode) {
        let (Some(left_slot), Some(right_slot)) = (
            self.scratch(self.depth, node),
            self.scratch(self.depth + 1, node),
        ) else {
            return;
        };

        self.depth += 2;
        self.generate_expression(left);
        self.emit(Opcode::Sta, Operand::Address(left_slot), "Stage left operand");
        self.generate_expression(right);
        self.emit(Opcode::Sta, Operand::Address(right_slot), "Stage right operand");
        self.depth -= 2;

        self.emit(Opcode::LdxMemory, Operand::Address(left_slot), "Load left operand into X");
        self.emit(Opcode::Cpx, Operand::Address(right_slot), "Compare with right operand");

        let (optimistic, otherwise) = if equality { (0x00, 0x01) } else { (0x01, 0x00) };
        let skip = self.backpatcher.new_label();
        self.emit(
            Opcode::LdaImmediate,
            Operand::Immediate(optimistic),
            format!("Assume {}", if optimistic == 0 { "false" } else { "true" }),
        );
        self.emit_branch(&skip, format!("Branch to {} if operands differ", skip), node);
        self.emit(
            Opcode::LdaImmediate,
            Operand::Immediate(otherwise),
            format!("Operands equal: {}", if otherwise == 0 { "false" } else { "true" }),
        );
        self.backpatcher.define(&skip, &mut self.listing);
    }
}

/// 便捷函数：为一个程序单元生成代码。
pub fn generate(root: &AstNode, diagnostics: &mut DiagnosticBag) -> CodeGenOutcome {
    CodeGenerator::new(diagnostics).generate(root)
}
