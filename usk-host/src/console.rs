//! # Console 模块
//!
//! 控制台版本的能力实现：一个本地玩家加一个打印到终端的环境。
//!
//! 游戏内颜色码（`&a`、`&l` 等）在输出前被去掉。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{error, info};
use usk_runtime::{CommandError, Environment, Player};

use crate::config::PlayerSeed;

/// 生命、饱食、水分的上限
pub const VITAL_MAX: u8 = 100;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 去掉 `&` 颜色/格式码
pub fn strip_color_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '&'
            && let Some(&code) = chars.peek()
            && matches!(code.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
        {
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

/// 控制台输出
///
/// `Capture` 用于测试和 `--ticks` 冒烟运行之外的断言场景。
#[derive(Debug, Clone, Default)]
pub enum ConsoleOutput {
    #[default]
    Stdout,
    Capture(Arc<Mutex<Vec<String>>>),
}

impl ConsoleOutput {
    pub fn capture() -> Self {
        Self::Capture(Arc::default())
    }

    pub fn line(&self, text: &str) {
        self.raw(strip_color_codes(text));
    }

    /// 原样输出，不处理颜色码
    pub fn raw(&self, text: impl Into<String>) {
        let text = text.into();
        match self {
            Self::Stdout => println!("{text}"),
            Self::Capture(lines) => lock(lines).push(text),
        }
    }

    /// 已捕获的行；`Stdout` 总是为空
    pub fn captured(&self) -> Vec<String> {
        match self {
            Self::Stdout => Vec::new(),
            Self::Capture(lines) => lock(lines).clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// 控制台环境
#[derive(Debug, Default)]
pub struct ConsoleEnvironment {
    output: ConsoleOutput,
}

impl ConsoleEnvironment {
    pub fn new(output: ConsoleOutput) -> Self {
        Self { output }
    }

    pub fn output(&self) -> &ConsoleOutput {
        &self.output
    }
}

impl Environment for ConsoleEnvironment {
    fn broadcast(&self, text: &str) {
        self.output.line(&format!("[广播] {text}"));
    }

    async fn run_command(&self, command: &str) -> Result<(), CommandError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(CommandError::new(command, "命令为空"));
        }

        match command.split_once(' ') {
            Some(("say", text)) => self.broadcast(text.trim()),
            _ => info!(target: "usk", command, "服务器命令已执行"),
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    fn log(&self, text: &str) {
        info!(target: "usk", "{}", text);
    }

    fn log_error(&self, text: &str, cause: Option<&(dyn std::error::Error + 'static)>) {
        match cause {
            Some(cause) => error!(target: "usk", cause = %cause, "{}", text),
            None => error!(target: "usk", "{}", text),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// 控制台玩家的可变状态
#[derive(Debug, Clone)]
pub struct ConsoleState {
    pub money: Decimal,
    pub health: u8,
    pub food: u8,
    pub water: u8,
    pub stamina: u8,
    pub virus: u8,
    pub experience: u32,
    pub reputation: i32,
    pub position: String,
    pub in_vehicle: bool,
    pub inventory: BTreeMap<String, i64>,
    /// 收到的消息，已去掉颜色码
    pub inbox: Vec<String>,
    pub kicked: Option<String>,
}

/// 控制台玩家
#[derive(Debug)]
pub struct ConsolePlayer {
    id: String,
    name: String,
    display_name: String,
    group: String,
    permissions: Vec<String>,
    state: Mutex<ConsoleState>,
    output: ConsoleOutput,
}

impl ConsolePlayer {
    pub fn from_seed(seed: &PlayerSeed, output: ConsoleOutput) -> Self {
        Self {
            id: seed.id.clone(),
            name: seed.name.clone(),
            display_name: seed.effective_display_name().to_string(),
            group: seed.group.clone(),
            permissions: seed.permissions.clone(),
            state: Mutex::new(ConsoleState {
                money: seed.money,
                health: seed.health,
                food: seed.food,
                water: seed.water,
                stamina: seed.stamina,
                virus: seed.virus,
                experience: seed.experience,
                reputation: seed.reputation,
                position: "0,0,0".to_string(),
                in_vehicle: false,
                inventory: BTreeMap::new(),
                inbox: Vec::new(),
                kicked: None,
            }),
            output,
        }
    }

    /// 当前状态的副本
    pub fn snapshot(&self) -> ConsoleState {
        lock(&self.state).clone()
    }

    /// 模拟上下载具
    pub fn set_in_vehicle(&self, in_vehicle: bool) {
        lock(&self.state).in_vehicle = in_vehicle;
    }

    fn update(&self, f: impl FnOnce(&mut ConsoleState)) {
        f(&mut lock(&self.state));
    }
}

impl Player for ConsolePlayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn send_message(&self, text: &str) {
        self.output.line(&format!("[{}] {}", self.name, text));
        self.update(|s| s.inbox.push(strip_color_codes(text)));
    }

    fn give_item(&self, item: &str, amount: i32) {
        self.update(|s| *s.inventory.entry(item.to_string()).or_default() += i64::from(amount));
    }

    fn teleport(&self, location: &str) {
        self.update(|s| s.position = location.to_string());
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|granted| granted == "*" || granted.eq_ignore_ascii_case(permission))
    }

    fn money(&self) -> Decimal {
        lock(&self.state).money
    }

    fn add_money(&self, amount: Decimal) {
        self.update(|s| s.money = s.money.saturating_add(amount));
    }

    fn set_money(&self, amount: Decimal) {
        self.update(|s| s.money = amount);
    }

    fn health(&self) -> u8 {
        lock(&self.state).health
    }

    fn set_health(&self, value: u8) {
        self.update(|s| s.health = value);
    }

    fn food(&self) -> u8 {
        lock(&self.state).food
    }

    fn set_food(&self, value: u8) {
        self.update(|s| s.food = value);
    }

    fn water(&self) -> u8 {
        lock(&self.state).water
    }

    fn set_water(&self, value: u8) {
        self.update(|s| s.water = value);
    }

    fn stamina(&self) -> u8 {
        lock(&self.state).stamina
    }

    fn set_stamina(&self, value: u8) {
        self.update(|s| s.stamina = value);
    }

    fn virus(&self) -> u8 {
        lock(&self.state).virus
    }

    fn set_virus(&self, value: u8) {
        self.update(|s| s.virus = value);
    }

    fn experience(&self) -> u32 {
        lock(&self.state).experience
    }

    fn add_experience(&self, amount: u32) {
        self.update(|s| s.experience = s.experience.saturating_add(amount));
    }

    fn set_experience(&self, amount: u32) {
        self.update(|s| s.experience = amount);
    }

    fn reputation(&self) -> i32 {
        lock(&self.state).reputation
    }

    fn set_reputation(&self, value: i32) {
        self.update(|s| s.reputation = value);
    }

    fn group(&self) -> String {
        self.group.clone()
    }

    fn kill(&self) {
        self.update(|s| s.health = 0);
        self.output.line(&format!("{} 死亡", self.name));
    }

    fn kick(&self, reason: &str) {
        self.update(|s| s.kicked = Some(strip_color_codes(reason)));
        self.output.line(&format!("{} 被踢出: {}", self.name, reason));
    }

    fn heal(&self) {
        self.update(|s| s.health = VITAL_MAX);
    }

    fn feed(&self) {
        self.update(|s| {
            s.food = VITAL_MAX;
            s.water = VITAL_MAX;
        });
    }

    fn clear_inventory(&self) {
        self.update(|s| s.inventory.clear());
    }

    fn is_in_vehicle(&self) -> bool {
        lock(&self.state).in_vehicle
    }

    fn exit_vehicle(&self) {
        self.update(|s| s.in_vehicle = false);
    }

    fn position(&self) -> String {
        lock(&self.state).position.clone()
    }

    fn ping(&self) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> ConsolePlayer {
        let seed = PlayerSeed {
            permissions: vec!["vip.rank".to_string()],
            health: 20,
            food: 5,
            water: 7,
            ..PlayerSeed::default()
        };
        ConsolePlayer::from_seed(&seed, ConsoleOutput::capture())
    }

    #[test]
    fn test_strip_color_codes() {
        assert_eq!(strip_color_codes("&ahi &lBob"), "hi Bob");
        assert_eq!(strip_color_codes("a & b"), "a & b");
        assert_eq!(strip_color_codes("100&"), "100&");
        assert_eq!(strip_color_codes("&&a"), "&");
    }

    #[test]
    fn test_heal_feed_kill() {
        let p = player();
        p.heal();
        assert_eq!(p.health(), VITAL_MAX);
        assert_eq!(p.food(), 5);

        p.feed();
        assert_eq!(p.food(), VITAL_MAX);
        assert_eq!(p.water(), VITAL_MAX);

        p.kill();
        assert_eq!(p.health(), 0);
    }

    #[test]
    fn test_permissions() {
        let p = player();
        assert!(p.has_permission("vip.rank"));
        assert!(p.has_permission("VIP.Rank"));
        assert!(!p.has_permission("admin.commands"));

        let admin = ConsolePlayer::from_seed(
            &PlayerSeed {
                permissions: vec!["*".to_string()],
                ..PlayerSeed::default()
            },
            ConsoleOutput::capture(),
        );
        assert!(admin.has_permission("anything"));
    }

    #[test]
    fn test_inventory_and_position() {
        let p = player();
        assert_eq!(p.position(), "0,0,0");
        assert_eq!(p.ping(), 0.0);

        p.give_item("15", 5);
        p.give_item("15", 3);
        p.give_item("Medkit", 1);
        assert_eq!(p.snapshot().inventory.get("15"), Some(&8));

        p.clear_inventory();
        assert!(p.snapshot().inventory.is_empty());

        p.teleport("0,10,0");
        assert_eq!(p.position(), "0,10,0");
    }

    #[test]
    fn test_send_message_strips_codes() {
        let output = ConsoleOutput::capture();
        let p = ConsolePlayer::from_seed(&PlayerSeed::default(), output.clone());
        p.send_message("&ahi Console");

        assert_eq!(p.snapshot().inbox, vec!["hi Console"]);
        assert_eq!(output.captured(), vec!["[Console] hi Console"]);
    }

    #[test]
    fn test_money_and_experience_saturate() {
        let p = player();
        p.add_money(Decimal::new(150, 2));
        p.add_money(Decimal::new(50, 2));
        assert_eq!(p.money(), Decimal::new(2, 0));

        p.set_experience(u32::MAX - 1);
        p.add_experience(10);
        assert_eq!(p.experience(), u32::MAX);
    }

    #[tokio::test]
    async fn test_run_command_say_broadcasts() {
        let env = ConsoleEnvironment::new(ConsoleOutput::capture());

        env.run_command("say &eAuto-save").await.unwrap();
        env.run_command("save").await.unwrap();
        assert!(env.run_command("   ").await.is_err());

        assert_eq!(env.output().captured(), vec!["[广播] Auto-save"]);
    }
}
