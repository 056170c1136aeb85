//! # USK Runtime
//!
//! `.usk` 事件脚本引擎的核心库。
//!
//! ## 架构概述
//!
//! `usk-runtime` 不依赖具体的游戏服务器。宿主通过两个能力 trait
//! 接入，并在游戏事件发生时调用 [`Engine::raise_event`]：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── reload(dir) ─────────────────►│ 发现 *.usk → 解析 → 发布快照
//!   │                                   │
//!   │──── raise_event(name, ctx) ──────►│ 依次执行同名处理器
//!   │◄─── Player / Environment 调用 ────│
//!   │                                   │
//!   │  读取 ctx.cancelled               │
//! ```
//!
//! ## 核心类型
//!
//! - [`Engine`]：门面，持有注册表与解释器
//! - [`Environment`] / [`Player`]：宿主提供的能力
//! - [`ExecutionContext`]：单次事件调用的上下文
//! - [`ScriptFile`] / [`EventNode`] / [`Node`]：AST
//!
//! ## 使用示例
//!
//! ```ignore
//! use usk_runtime::{Engine, ExecutionContext};
//!
//! let engine = Engine::new(my_environment);
//! engine.reload("scripts")?;
//!
//! let mut ctx = ExecutionContext::for_player(&player).with_message(text);
//! engine.raise_event("player_chat", &mut ctx).await;
//! if ctx.cancelled {
//!     // 否决原始聊天消息
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：AST、解析器、动作/条件目录
//! - [`runtime`]：注册表、解释器、门面
//! - [`diagnostic`]：静态检查
//! - [`error`]：错误类型定义

pub mod diagnostic;
pub mod error;
pub mod runtime;
pub mod script;

// 重导出核心类型
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_script, timer_interval_secs,
};
pub use error::{CommandError, LoadError, ParseError, RuntimeError, RuntimeResult};
pub use runtime::{
    DEFAULT_EXTENSION, Engine, EngineOptions, Environment, EventHandlers, ExecutionContext,
    Interpreter, Player, RaiseOutcome, RegistrySnapshot, RegistryStats, ScriptRegistry, VarValue,
    interpolate,
};
pub use script::{
    Action, ActionNode, AstNode, CompareOp, Condition, EVERY_EVENT, EventNode, IfNode, Node,
    Parser, ScriptFile, StatOperand, Target, VitalStat,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _engine_options = EngineOptions::default();
        let _ctx = ExecutionContext::detached();
        let _registry = ScriptRegistry::new();
        let _parser = Parser::new();
        let _node = ActionNode::new(1, 1, "cancel");
    }
}
