//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与脚本检查命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `script-check`: 静态检查 `.usk` 脚本（跳过的行、未知语句、无效字面量）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use usk_runtime::{DEFAULT_EXTENSION, DiagnosticResult, Parser, analyze_script};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "script-check" => {
            let path = args.next();
            script_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  script-check    检查 .usk 脚本文件

SCRIPT-CHECK:
  cargo xtask script-check [path]

  不带参数：检查 scripts/ 下所有 .usk 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 被解析器跳过的行（顶层杂行、无法识别的事件头/条件头、缩进过深）
    - 未知动作与未知条件
    - 超出范围的数字字面量
    - 目标不是 player 的语句
    - every 事件的间隔参数

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo script-check  -> cargo xtask script-check
"#
    );
}

//=============================================================================
// script-check 命令实现
//=============================================================================

/// 默认脚本目录（相对于 workspace root）
const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// 脚本检查结果
#[derive(Debug, Default)]
struct ScriptCheckResult {
    /// 检查的脚本数量
    scripts_checked: usize,
    /// 无法解析的文件数量
    parse_errors: usize,
    /// 解析警告与静态诊断
    diagnostics: DiagnosticResult,
}

impl ScriptCheckResult {
    fn is_failure(&self) -> bool {
        self.parse_errors > 0 || self.diagnostics.has_errors()
    }
}

/// 执行脚本检查
fn script_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_script_files(&path)?
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_SCRIPTS_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认脚本目录不存在: {}\n请在 workspace 根目录运行，或指定脚本路径",
                    dir.display()
                );
            }
            collect_script_files(dir)?
        }
    };

    if files.is_empty() {
        eprintln!("未找到脚本文件（.{DEFAULT_EXTENSION}）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个脚本文件...\n", files.len());

    let result = check_files(&files);
    print_check_result(&result);

    if result.is_failure() {
        anyhow::bail!("脚本检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有脚本文件，按路径排序
fn collect_script_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(DEFAULT_EXTENSION))
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn check_files(files: &[PathBuf]) -> ScriptCheckResult {
    let mut result = ScriptCheckResult::default();
    for file in files {
        check_script_file(file, &mut result);
    }
    result
}

/// 检查单个脚本文件
fn check_script_file(file: &Path, result: &mut ScriptCheckResult) {
    result.scripts_checked += 1;

    let mut parser = Parser::new();
    let script = match parser.parse(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", file.display(), e);
            result.parse_errors += 1;
            return;
        }
    };

    // 解析器跳过的行
    result.diagnostics.merge(parser.take_warnings().into());
    result.diagnostics.merge(analyze_script(&script));
}

/// 输出检查结果
fn print_check_result(result: &ScriptCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个脚本", result.scripts_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count = result.parse_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
