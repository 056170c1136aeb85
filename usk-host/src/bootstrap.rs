//! 脚本目录初始化

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// 示例脚本文件名
pub const SHOWCASE_FILE: &str = "showcase.usk";

/// 示例脚本内容
pub const SHOWCASE_SCRIPT: &str = include_str!("../assets/showcase.usk");

/// 确保脚本目录存在，按需写入示例脚本
///
/// 返回新写入的示例脚本路径；已存在时不覆盖。
pub fn prepare_scripts_dir(dir: &Path, create_showcase: bool) -> io::Result<Option<PathBuf>> {
    fs::create_dir_all(dir)?;

    if !create_showcase {
        return Ok(None);
    }

    let showcase = dir.join(SHOWCASE_FILE);
    if showcase.exists() {
        return Ok(None);
    }

    fs::write(&showcase, SHOWCASE_SCRIPT)?;
    info!(path = %showcase.display(), "已创建示例脚本");
    Ok(Some(showcase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use usk_runtime::{DiagnosticLevel, Parser, analyze_script};

    #[test]
    fn test_creates_directory_and_showcase() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("scripts");

        let written = prepare_scripts_dir(&dir, true).unwrap();
        assert_eq!(written, Some(dir.join(SHOWCASE_FILE)));
        assert_eq!(
            fs::read_to_string(dir.join(SHOWCASE_FILE)).unwrap(),
            SHOWCASE_SCRIPT
        );
    }

    #[test]
    fn test_existing_showcase_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SHOWCASE_FILE);
        fs::write(&path, "# mine\n").unwrap();

        assert_eq!(prepare_scripts_dir(dir.path(), true).unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn test_showcase_disabled() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("scripts");

        assert_eq!(prepare_scripts_dir(&dir, false).unwrap(), None);
        assert!(dir.is_dir());
        assert!(!dir.join(SHOWCASE_FILE).exists());
    }

    #[test]
    fn test_showcase_parses_cleanly() {
        let mut parser = Parser::new();
        let script = parser.parse_str(SHOWCASE_FILE, SHOWCASE_SCRIPT);

        assert!(parser.warnings().is_empty(), "{:?}", parser.warnings());
        let diagnostics = analyze_script(&script);
        assert!(
            diagnostics
                .filter_by_level(DiagnosticLevel::Warn)
                .is_empty(),
            "{:?}",
            diagnostics
        );

        let names: Vec<_> = script.events.iter().map(|e| e.event_name.as_str()).collect();
        for expected in [
            "player_join",
            "player_disconnect",
            "player_chat",
            "player_death",
            "player_damaged",
            "player_spawned",
            "every",
        ] {
            assert!(names.contains(&expected), "缺少事件 {expected}");
        }
    }
}
