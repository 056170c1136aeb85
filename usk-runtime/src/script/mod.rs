//! # Script 模块
//!
//! 脚本解析相关功能，包括 AST 定义、解析器以及动作/条件目录。
//!
//! ## 模块结构
//!
//! - [`ast`]：脚本抽象语法树定义
//! - [`parser`]：预处理 + 缩进结构解析
//! - [`catalog`]：动作与条件的模式匹配

pub mod ast;
pub mod catalog;
pub mod parser;

pub use ast::*;
pub use catalog::{
    Action, CompareOp, Condition, PLAYER_TARGET, StatOperand, Target, VitalStat, compile_action,
    compile_condition,
};
pub use parser::Parser;
