use std::fmt;

/// 语言中仅有的三种值类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    String,
    Boolean,
}

impl DataType {
    /// 尝试将类型关键字转换为一个 `DataType`。
    pub fn lookup(keyword: &str) -> Option<DataType> {
        match keyword {
            "int" => Some(DataType::Int),
            "string" => Some(DataType::String),
            "boolean" => Some(DataType::Boolean),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
