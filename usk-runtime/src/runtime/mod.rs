//! # Runtime 模块
//!
//! 事件注册表与解释器。
//!
//! ## 模块结构
//!
//! - [`capability`]：宿主提供的环境/玩家能力
//! - [`context`]：单次事件调用的执行上下文
//! - [`interpolate`]：`{...}` 记号插值
//! - [`interpreter`]：树遍历解释器
//! - [`registry`]：脚本发现与事件索引
//! - [`engine`]：门面

pub mod capability;
pub mod context;
pub mod engine;
pub mod interpolate;
pub mod interpreter;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{Environment, Player};
pub use context::{DAMAGE_PREFIX, ExecutionContext, VarValue};
pub use engine::{Engine, EngineOptions, RaiseOutcome};
pub use interpolate::interpolate;
pub use interpreter::Interpreter;
pub use registry::{
    DEFAULT_EXTENSION, EventHandlers, RegistrySnapshot, RegistryStats, ScriptRegistry,
};
