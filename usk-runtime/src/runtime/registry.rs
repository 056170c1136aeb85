//! # Registry 模块
//!
//! 发现并加载脚本目录，维护按事件名索引的处理器表。
//!
//! ## 并发模型
//!
//! 已发布的 [`RegistrySnapshot`] 不可变。`load` 构建新快照后整体替换，
//! 正在遍历旧快照的调用者不受影响。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::diagnostic::{DiagnosticResult, analyze_script};
use crate::error::LoadError;
use crate::script::{EventNode, Parser, ScriptFile};

/// 默认脚本扩展名
pub const DEFAULT_EXTENSION: &str = "usk";

/// 处理器在快照中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    file: usize,
    event: usize,
}

/// 一次加载的不可变结果
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    directory: Option<PathBuf>,
    files: Vec<ScriptFile>,
    /// 小写事件名 → 处理器，按加载顺序
    index: HashMap<String, Vec<Slot>>,
    /// 首次出现时的写法，按首次出现顺序
    event_names: Vec<String>,
    diagnostics: DiagnosticResult,
}

impl RegistrySnapshot {
    fn build(directory: PathBuf, files: Vec<ScriptFile>, diagnostics: DiagnosticResult) -> Self {
        let mut index: HashMap<String, Vec<Slot>> = HashMap::new();
        let mut event_names = Vec::new();

        for (file_idx, file) in files.iter().enumerate() {
            for (event_idx, event) in file.events.iter().enumerate() {
                let key = event.event_name.to_lowercase();
                let slots = index.entry(key).or_default();
                if slots.is_empty() {
                    event_names.push(event.event_name.clone());
                }
                slots.push(Slot {
                    file: file_idx,
                    event: event_idx,
                });
            }
        }

        Self {
            directory: Some(directory),
            files,
            index,
            event_names,
            diagnostics,
        }
    }

    fn event_at(&self, slot: Slot) -> &EventNode {
        &self.files[slot.file].events[slot.event]
    }

    /// 加载的目录（从未加载时为 `None`）
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn files(&self) -> &[ScriptFile] {
        &self.files
    }

    /// 指定事件名的处理器，按加载顺序
    pub fn events(&self, name: &str) -> impl Iterator<Item = &EventNode> {
        self.index
            .get(&name.to_lowercase())
            .into_iter()
            .flatten()
            .map(|slot| self.event_at(*slot))
    }

    /// 所有事件，按加载顺序
    pub fn all_events(&self) -> impl Iterator<Item = &EventNode> {
        self.files.iter().flat_map(|file| file.events.iter())
    }

    /// 不同的事件名，按首次出现顺序
    pub fn event_names(&self) -> &[String] {
        &self.event_names
    }

    /// 加载期间产生的诊断
    pub fn diagnostics(&self) -> &DiagnosticResult {
        &self.diagnostics
    }

    pub fn stats(&self) -> RegistryStats {
        let handler_counts = self
            .event_names
            .iter()
            .map(|name| {
                let count = self.index.get(&name.to_lowercase()).map_or(0, Vec::len);
                (name.clone(), count)
            })
            .collect();

        RegistryStats {
            total_scripts: self.files.len(),
            total_events: self.files.iter().map(ScriptFile::len).sum(),
            event_type_names: self.event_names.clone(),
            handler_counts,
        }
    }
}

/// 注册表统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_scripts: usize,
    pub total_events: usize,
    /// 不同的事件名，按首次出现顺序
    pub event_type_names: Vec<String>,
    /// 每个事件名的处理器数量，顺序与 `event_type_names` 一致
    pub handler_counts: Vec<(String, usize)>,
}

/// 某个事件名的处理器视图
///
/// 持有加载时的快照，即使之后发生 reload 也保持有效。
#[derive(Debug, Clone)]
pub struct EventHandlers {
    snapshot: Arc<RegistrySnapshot>,
    slots: Vec<Slot>,
}

impl EventHandlers {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EventNode> {
        self.slots.get(index).map(|slot| self.snapshot.event_at(*slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventNode> {
        self.slots.iter().map(|slot| self.snapshot.event_at(*slot))
    }
}

/// 脚本注册表
#[derive(Debug)]
pub struct ScriptRegistry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
    extension: String,
    strict: bool,
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_EXTENSION, false)
    }

    /// 指定扩展名（不含点，大小写不敏感）与严格模式
    pub fn with_options(extension: impl Into<String>, strict: bool) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::default())),
            extension: extension.into().trim_start_matches('.').to_string(),
            strict,
        }
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, snapshot: RegistrySnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// 清空注册表
    pub fn clear(&self) {
        self.publish(RegistrySnapshot::default());
    }

    /// 加载目录下的所有脚本（递归）
    ///
    /// 新快照构建完成后一次性替换旧快照，加载期间读者看到的仍是旧内容。
    /// 目录不存在时创建空目录并返回空统计。
    /// 任意一个文件失败都会使整次加载失败，注册表被清空。
    pub fn load(&self, directory: impl AsRef<Path>) -> Result<RegistryStats, LoadError> {
        match self.build_snapshot(directory.as_ref()) {
            Ok(snapshot) => {
                let stats = snapshot.stats();
                self.publish(snapshot);
                Ok(stats)
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    fn build_snapshot(&self, directory: &Path) -> Result<RegistrySnapshot, LoadError> {
        if !directory.is_dir() {
            std::fs::create_dir_all(directory).map_err(|source| LoadError::CreateDirectory {
                path: directory.to_path_buf(),
                source,
            })?;
            info!(target: "usk", dir = %directory.display(), "脚本目录不存在，已创建");
            return Ok(RegistrySnapshot::build(
                directory.to_path_buf(),
                Vec::new(),
                DiagnosticResult::new(),
            ));
        }

        let mut parser = Parser::new();
        parser.set_strict(self.strict);
        let mut files = Vec::new();
        let mut diagnostics = DiagnosticResult::new();

        for path in self.discover(directory)? {
            let script = parser
                .parse(&path)
                .map_err(|source| LoadError::File {
                    path: path.clone(),
                    source,
                })?;
            debug!(target: "usk", file = %path.display(), events = script.len(), "已加载脚本");

            diagnostics.merge(parser.take_warnings().into());
            let analysis = analyze_script(&script);
            for d in &analysis.diagnostics {
                warn!(target: "usk", "{}", d);
            }
            diagnostics.merge(analysis);
            files.push(script);
        }

        Ok(RegistrySnapshot::build(
            directory.to_path_buf(),
            files,
            diagnostics,
        ))
    }

    /// 递归查找脚本文件，按文件名排序
    fn discover(&self, directory: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: directory.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// 指定事件名的所有处理器（大小写不敏感）
    pub fn get_events(&self, name: &str) -> EventHandlers {
        let snapshot = self.snapshot();
        let slots = snapshot
            .index
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default();
        EventHandlers { snapshot, slots }
    }

    pub fn get_stats(&self) -> RegistryStats {
        self.snapshot().stats()
    }
}
