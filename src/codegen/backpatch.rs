//! 回填：分支先以占位符发出，整个 AST 走完后再计算偏移量。

use super::codegen_error::CodeGenError;
use super::instruction::{Listing, Relative};
use crate::utils::{Position, Span};
use std::collections::HashMap;
use tracing::debug;

/// `BNE` 在清单中占两行：偏移量相对于下一条指令计算。
const BRANCH_WIDTH: usize = 2;

#[derive(Debug, Clone)]
struct Fixup {
    label: String,
    /// 分支指令的起始位置。
    position: usize,
    source: (Position, Span),
}

#[derive(Debug, Default)]
pub struct Backpatcher {
    labels: HashMap<String, usize>,
    fixups: Vec<Fixup>,
    next_label: usize,
}

impl Backpatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成一个新的标签名：`L0`、`L1`……
    pub fn new_label(&mut self) -> String {
        let label = format!("L{}", self.next_label);
        self.next_label += 1;
        label
    }

    /// 在当前位置定义标签，并在清单中留下一行注释。
    pub fn define(&mut self, label: &str, listing: &mut Listing) {
        debug!(target: "codegen", "label {} at line {}", label, listing.position());
        self.labels.insert(label.to_string(), listing.position());
        listing.comment(format!("{}:", label));
    }

    /// 记录一个等待回填的分支。
    pub fn branch(&mut self, label: &str, position: usize, source: (Position, Span)) {
        self.fixups.push(Fixup {
            label: label.to_string(),
            position,
            source,
        });
    }

    pub fn label_position(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// 第二遍：按记录顺序解析每个分支，写入第一个仍在等待的占位符。
    ///
    /// A failed fixup only records an error comment in front of that
    /// placeholder. The placeholder stays pending, so the next fixup that
    /// resolves is written into it.
    pub fn resolve(self, listing: &mut Listing) -> Vec<CodeGenError> {
        let mut errors = Vec::new();

        for fixup in self.fixups {
            let Some(index) = listing.first_pending() else {
                break;
            };
            let (position, span) = fixup.source;

            let Some(&target) = self.labels.get(&fixup.label) else {
                listing.insert_comment(index, format!("ERROR: label {} is undefined", fixup.label));
                errors.push(CodeGenError::UnresolvedLabel {
                    label: fixup.label,
                    position,
                    span,
                });
                continue;
            };

            let offset = target as isize - (fixup.position + BRANCH_WIDTH) as isize;
            match i8::try_from(offset) {
                Ok(byte) => {
                    debug!(target: "codegen", "branch at line {} -> {} offset {}", fixup.position, fixup.label, byte);
                    listing.set_relative(index, Relative::Resolved(byte));
                }
                Err(_) => {
                    listing.insert_comment(
                        index,
                        format!("ERROR: branch to {} out of range (offset {})", fixup.label, offset),
                    );
                    errors.push(CodeGenError::BranchOutOfRange {
                        label: fixup.label,
                        offset,
                        position,
                        span,
                    });
                }
            }
        }
        errors
    }
}
