//! 单元测试用的能力替身

use std::sync::Mutex;

use rust_decimal::Decimal;

use super::capability::{Environment, Player};
use crate::error::CommandError;

#[derive(Debug, Default)]
pub struct FakeEnvironment {
    pub broadcasts: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<String>>,
    pub logs: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    /// 以此前缀开头的命令执行失败
    pub failing_prefix: Option<String>,
}

impl FakeEnvironment {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl Environment for FakeEnvironment {
    fn broadcast(&self, text: &str) {
        self.broadcasts.lock().unwrap().push(text.to_string());
    }

    async fn run_command(&self, command: &str) -> Result<(), CommandError> {
        tokio::task::yield_now().await;
        if let Some(prefix) = &self.failing_prefix
            && command.starts_with(prefix.as_str())
        {
            return Err(CommandError::new(command, "rejected"));
        }
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }

    fn log(&self, text: &str) {
        self.logs.lock().unwrap().push(text.to_string());
    }

    fn log_error(&self, text: &str, _cause: Option<&(dyn std::error::Error + 'static)>) {
        self.errors.lock().unwrap().push(text.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub money: Decimal,
    pub health: u8,
    pub food: u8,
    pub water: u8,
    pub stamina: u8,
    pub virus: u8,
    pub experience: u32,
    pub reputation: i32,
    pub in_vehicle: bool,
    pub permissions: Vec<String>,
    pub messages: Vec<String>,
    pub items: Vec<(String, i32)>,
    pub location: Option<String>,
    pub kicked: Option<String>,
    pub inventory_cleared: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            money: Decimal::ZERO,
            health: 100,
            food: 100,
            water: 100,
            stamina: 100,
            virus: 0,
            experience: 0,
            reputation: 0,
            in_vehicle: false,
            permissions: Vec::new(),
            messages: Vec::new(),
            items: Vec::new(),
            location: None,
            kicked: None,
            inventory_cleared: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FakePlayer {
    pub state: Mutex<PlayerState>,
}

impl FakePlayer {
    pub fn with_state(state: PlayerState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> PlayerState {
        self.state.lock().unwrap().clone()
    }
}

impl Player for FakePlayer {
    fn id(&self) -> &str {
        "76561198000000001"
    }

    fn name(&self) -> &str {
        "Alice"
    }

    fn display_name(&self) -> &str {
        "[VIP] Alice"
    }

    fn send_message(&self, text: &str) {
        self.state.lock().unwrap().messages.push(text.to_string());
    }

    fn give_item(&self, item: &str, amount: i32) {
        self.state
            .lock()
            .unwrap()
            .items
            .push((item.to_string(), amount));
    }

    fn teleport(&self, location: &str) {
        self.state.lock().unwrap().location = Some(location.to_string());
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .permissions
            .iter()
            .any(|p| p == permission)
    }

    fn money(&self) -> Decimal {
        self.state.lock().unwrap().money
    }

    fn add_money(&self, amount: Decimal) {
        self.state.lock().unwrap().money += amount;
    }

    fn set_money(&self, amount: Decimal) {
        self.state.lock().unwrap().money = amount;
    }

    fn health(&self) -> u8 {
        self.state.lock().unwrap().health
    }

    fn set_health(&self, value: u8) {
        self.state.lock().unwrap().health = value;
    }

    fn food(&self) -> u8 {
        self.state.lock().unwrap().food
    }

    fn set_food(&self, value: u8) {
        self.state.lock().unwrap().food = value;
    }

    fn water(&self) -> u8 {
        self.state.lock().unwrap().water
    }

    fn set_water(&self, value: u8) {
        self.state.lock().unwrap().water = value;
    }

    fn stamina(&self) -> u8 {
        self.state.lock().unwrap().stamina
    }

    fn set_stamina(&self, value: u8) {
        self.state.lock().unwrap().stamina = value;
    }

    fn virus(&self) -> u8 {
        self.state.lock().unwrap().virus
    }

    fn set_virus(&self, value: u8) {
        self.state.lock().unwrap().virus = value;
    }

    fn experience(&self) -> u32 {
        self.state.lock().unwrap().experience
    }

    fn add_experience(&self, amount: u32) {
        let mut state = self.state.lock().unwrap();
        state.experience = state.experience.saturating_add(amount);
    }

    fn set_experience(&self, amount: u32) {
        self.state.lock().unwrap().experience = amount;
    }

    fn reputation(&self) -> i32 {
        self.state.lock().unwrap().reputation
    }

    fn set_reputation(&self, value: i32) {
        self.state.lock().unwrap().reputation = value;
    }

    fn group(&self) -> String {
        "vip".to_string()
    }

    fn kill(&self) {
        self.state.lock().unwrap().health = 0;
    }

    fn kick(&self, reason: &str) {
        self.state.lock().unwrap().kicked = Some(reason.to_string());
    }

    fn heal(&self) {
        self.state.lock().unwrap().health = 100;
    }

    fn feed(&self) {
        let mut state = self.state.lock().unwrap();
        state.food = 100;
        state.water = 100;
    }

    fn clear_inventory(&self) {
        let mut state = self.state.lock().unwrap();
        state.items.clear();
        state.inventory_cleared = true;
    }

    fn is_in_vehicle(&self) -> bool {
        self.state.lock().unwrap().in_vehicle
    }

    fn exit_vehicle(&self) {
        self.state.lock().unwrap().in_vehicle = false;
    }

    fn position(&self) -> String {
        "120.5,33,-8".to_string()
    }

    fn ping(&self) -> f32 {
        42.0
    }
}
