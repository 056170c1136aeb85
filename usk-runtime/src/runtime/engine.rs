//! # Engine 模块
//!
//! 宿主使用的门面：重新加载脚本目录、触发事件。
//!
//! ## 执行模型
//!
//! 同一事件名的处理器按加载顺序依次执行，互不并发。
//! 某个处理器设置 `cancelled` 不会阻止后续处理器运行；
//! 调用结束后由宿主读取上下文决定是否否决原始事件。

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::capability::{Environment, Player};
use super::context::ExecutionContext;
use super::interpreter::Interpreter;
use super::registry::{DEFAULT_EXTENSION, EventHandlers, RegistrySnapshot, RegistryStats, ScriptRegistry};
use crate::diagnostic::DiagnosticResult;
use crate::error::LoadError;
use crate::script::EventNode;

/// 引擎选项
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 严格解析
    pub strict: bool,
    /// 脚本扩展名（不含点）
    pub extension: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// 一次事件触发的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaiseOutcome {
    /// 执行的处理器数量
    pub handled: usize,
    /// 其中因错误中止的数量
    pub aborted: usize,
}

/// USK 引擎
pub struct Engine<E: Environment> {
    registry: ScriptRegistry,
    interpreter: Interpreter<E>,
}

impl<E: Environment> Engine<E> {
    pub fn new(environment: E) -> Self {
        Self::with_options(Arc::new(environment), EngineOptions::default())
    }

    pub fn with_options(environment: Arc<E>, options: EngineOptions) -> Self {
        Self {
            registry: ScriptRegistry::with_options(options.extension, options.strict),
            interpreter: Interpreter::new(environment),
        }
    }

    pub fn environment(&self) -> &E {
        self.interpreter.environment()
    }

    /// 环境能力的共享句柄
    pub fn environment_handle(&self) -> Arc<E> {
        self.interpreter.environment_handle()
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn interpreter(&self) -> &Interpreter<E> {
        &self.interpreter
    }

    /// 重新加载脚本目录
    ///
    /// 成功时通过环境能力记录摘要；失败时记录并返回错误，
    /// 此时注册表为空。
    pub fn reload(&self, directory: impl AsRef<Path>) -> Result<RegistryStats, LoadError> {
        let directory = directory.as_ref();
        let env = self.interpreter.environment();

        match self.registry.load(directory) {
            Ok(stats) => {
                info!(
                    target: "usk",
                    dir = %directory.display(),
                    scripts = stats.total_scripts,
                    events = stats.total_events,
                    "脚本加载完成"
                );
                env.log(&format!(
                    "USK: 已加载 {} 个脚本，共 {} 个事件",
                    stats.total_scripts, stats.total_events
                ));
                if !stats.event_type_names.is_empty() {
                    env.log(&format!(
                        "USK: 事件类型: {}",
                        stats.event_type_names.join(", ")
                    ));
                }
                Ok(stats)
            }
            Err(err) => {
                env.log_error(
                    &format!("USK: 加载脚本目录失败: {}", directory.display()),
                    Some(&err),
                );
                Err(err)
            }
        }
    }

    /// 触发事件：依次执行所有同名处理器
    pub async fn raise_event<P: Player + ?Sized>(
        &self,
        name: &str,
        ctx: &mut ExecutionContext<'_, P>,
    ) -> RaiseOutcome {
        self.raise_matching(name, |_| true, ctx).await
    }

    /// 触发事件，只执行满足 `filter` 的处理器
    ///
    /// 宿主的计时器用它只触发间隔匹配的 `every` 处理器。
    pub async fn raise_matching<P, F>(
        &self,
        name: &str,
        filter: F,
        ctx: &mut ExecutionContext<'_, P>,
    ) -> RaiseOutcome
    where
        P: Player + ?Sized,
        F: Fn(&EventNode) -> bool,
    {
        let handlers = self.registry.get_events(name);
        let mut outcome = RaiseOutcome::default();

        for event in handlers.iter().filter(|event| filter(event)) {
            outcome.handled += 1;
            if self.interpreter.execute_event(event, ctx).await.is_err() {
                outcome.aborted += 1;
            }
        }

        debug!(
            target: "usk",
            event = name,
            handled = outcome.handled,
            aborted = outcome.aborted,
            cancelled = ctx.cancelled,
            "事件触发完成"
        );
        outcome
    }

    /// 指定事件名的处理器
    pub fn get_events(&self, name: &str) -> EventHandlers {
        self.registry.get_events(name)
    }

    pub fn get_stats(&self) -> RegistryStats {
        self.registry.get_stats()
    }

    /// 当前快照，可遍历所有事件与文件
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot()
    }

    /// 所有已加载事件的副本，按加载顺序
    pub fn all_events(&self) -> Vec<EventNode> {
        self.registry.snapshot().all_events().cloned().collect()
    }

    /// 最近一次加载的诊断
    pub fn diagnostics(&self) -> DiagnosticResult {
        self.registry.snapshot().diagnostics().clone()
    }
}
