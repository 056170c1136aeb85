//! # Interpreter 模块
//!
//! 树遍历解释器：按顺序执行事件体，把编译后的动作/条件分派到能力接口。
//!
//! ## 职责
//!
//! - 设置上下文的 `event_data` 并执行事件体
//! - 在事件边界捕获错误，通过 [`Environment::log_error`] 记录
//! - `run_command` 是唯一的挂起点，完成后才执行下一条语句

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::capability::{Environment, Player};
use super::context::ExecutionContext;
use super::interpolate::interpolate;
use crate::error::{RuntimeError, RuntimeResult};
use crate::script::catalog::MESSAGE_SUBJECT;
use crate::script::{
    Action, ActionNode, CompareOp, Condition, EventNode, IfNode, Node, StatOperand, Target,
    VitalStat,
};

type BlockFuture<'s> = Pin<Box<dyn Future<Output = RuntimeResult<()>> + Send + 's>>;

/// 脚本解释器
pub struct Interpreter<E: Environment> {
    environment: Arc<E>,
}

impl<E: Environment> Interpreter<E> {
    pub fn new(environment: Arc<E>) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn environment_handle(&self) -> Arc<E> {
        Arc::clone(&self.environment)
    }

    /// 执行一个事件
    ///
    /// 只有事件节点带有 `event_data` 时才覆盖上下文中的值。
    /// 出错时事件体剩余部分不再执行，已产生的副作用不回滚；
    /// 错误已经记录，返回值只供调用方统计。
    pub async fn execute_event<P: Player + ?Sized>(
        &self,
        event: &EventNode,
        ctx: &mut ExecutionContext<'_, P>,
    ) -> RuntimeResult<()> {
        if let Some(data) = &event.event_data {
            ctx.event_data = Some(data.clone());
        }

        debug!(
            target: "usk",
            event = %event.event_name,
            line = event.line_number,
            "执行事件"
        );

        let result = self.execute_block(&event.script_id, &event.body, ctx).await;
        if let Err(err) = &result {
            warn!(target: "usk", event = %event.event_name, error = %err, "事件执行中止");
            self.environment.log_error(
                &format!(
                    "执行事件 '{}'（{}:{}）时出错",
                    event.event_name, event.script_id, event.line_number
                ),
                Some(err),
            );
        }
        result
    }

    fn execute_block<'s, 'c: 's, P>(
        &'s self,
        script_id: &'s str,
        nodes: &'s [Node],
        ctx: &'s mut ExecutionContext<'c, P>,
    ) -> BlockFuture<'s>
    where
        P: Player + ?Sized,
    {
        Box::pin(async move {
            for node in nodes {
                match node {
                    Node::Action(action) => self.execute_action(script_id, action, ctx).await?,
                    Node::If(branch) => {
                        if self.evaluate_condition(script_id, branch, ctx)? {
                            self.execute_block(script_id, &branch.then_body, ctx).await?;
                        } else if !branch.else_body.is_empty() {
                            self.execute_block(script_id, &branch.else_body, ctx).await?;
                        }
                    }
                    Node::Event(_) => {}
                }
            }
            Ok(())
        })
    }

    async fn execute_action<P: Player + ?Sized>(
        &self,
        script_id: &str,
        node: &ActionNode,
        ctx: &mut ExecutionContext<'_, P>,
    ) -> RuntimeResult<()> {
        trace!(target: "usk", line = node.line_number, action = %node.action_raw, "执行动作");

        let env = &*self.environment;
        match &node.action {
            Action::Cancel => ctx.cancelled = true,
            Action::Message { target, text } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.send_message(&interpolate(text, ctx));
                }
            }
            Action::Broadcast { text } => env.broadcast(&interpolate(text, ctx)),
            Action::Give {
                target,
                item,
                amount,
            } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.give_item(item, *amount);
                }
            }
            Action::Teleport { target, location } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.teleport(location);
                }
            }
            Action::AddMoney { target, amount } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.add_money(*amount);
                }
            }
            Action::SetMoney { target, amount } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.set_money(*amount);
                }
            }
            Action::SetStat {
                target,
                stat,
                value,
            } => {
                if let Some(player) = resolve_target(target, ctx) {
                    set_vital(player, *stat, *value);
                }
            }
            Action::Kill { target } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.kill();
                }
            }
            Action::Kick { target, reason } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.kick(&interpolate(reason, ctx));
                }
            }
            Action::AddExperience { target, amount } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.add_experience(*amount);
                }
            }
            Action::SetExperience { target, amount } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.set_experience(*amount);
                }
            }
            Action::SetReputation { target, value } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.set_reputation(*value);
                }
            }
            Action::Heal { target } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.heal();
                }
            }
            Action::Feed { target } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.feed();
                }
            }
            Action::ClearInventory { target } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.clear_inventory();
                }
            }
            Action::ExitVehicle { target } => {
                if let Some(player) = resolve_target(target, ctx) {
                    player.exit_vehicle();
                }
            }
            Action::RunCommand { command } => {
                let command = interpolate(command, ctx);
                env.run_command(&command)
                    .await
                    .map_err(|source| RuntimeError::Command {
                        line: node.line_number,
                        source,
                    })?;
            }
            Action::Invalid { message } => {
                return Err(RuntimeError::InvalidLiteral {
                    line: node.line_number,
                    raw: node.action_raw.clone(),
                    message: message.clone(),
                });
            }
            Action::Unknown => env.log_error(
                &format!(
                    "{}:{}：未知动作: {}",
                    script_id, node.line_number, node.action_raw
                ),
                None,
            ),
        }
        Ok(())
    }

    /// 对条件块的条件求值
    pub fn evaluate_condition<P: Player + ?Sized>(
        &self,
        script_id: &str,
        node: &IfNode,
        ctx: &ExecutionContext<'_, P>,
    ) -> RuntimeResult<bool> {
        let result = match &node.condition {
            Condition::StartsWith { subject: name, text } => message_of(name, ctx)
                .is_some_and(|msg| msg.to_lowercase().starts_with(&text.to_lowercase())),
            Condition::Equals { subject: name, text } => message_of(name, ctx)
                .is_some_and(|msg| msg.to_lowercase() == text.to_lowercase()),
            Condition::HasPermission { target, permission } => {
                resolve_target(target, ctx).is_some_and(|player| player.has_permission(permission))
            }
            Condition::Compare {
                target,
                op,
                operand,
            } => resolve_target(target, ctx).is_some_and(|player| compare(player, *op, operand)),
            Condition::IsInVehicle { target } => {
                resolve_target(target, ctx).is_some_and(|player| player.is_in_vehicle())
            }
            Condition::Invalid { message } => {
                return Err(RuntimeError::InvalidLiteral {
                    line: node.line_number,
                    raw: node.condition_raw.clone(),
                    message: message.clone(),
                });
            }
            Condition::Unknown => {
                self.environment.log_error(
                    &format!(
                        "{}:{}：未知条件: {}",
                        script_id, node.line_number, node.condition_raw
                    ),
                    None,
                );
                false
            }
        };
        Ok(result)
    }
}

/// 把目标解析为上下文中的玩家
///
/// 只有 `player` 会被解析；其他目标和无玩家的上下文都得到 `None`。
fn resolve_target<'c, P: Player + ?Sized>(
    target: &Target,
    ctx: &ExecutionContext<'c, P>,
) -> Option<&'c P> {
    match target {
        Target::Player => ctx.player,
        Target::Named(name) => {
            debug!(target: "usk", target_name = %name, "目标不是 player，忽略");
            None
        }
    }
}

fn message_of<'m, P: Player + ?Sized>(
    name: &str,
    ctx: &'m ExecutionContext<'_, P>,
) -> Option<&'m str> {
    if name == MESSAGE_SUBJECT {
        ctx.message.as_deref()
    } else {
        None
    }
}

fn vital<P: Player + ?Sized>(player: &P, stat: VitalStat) -> u8 {
    match stat {
        VitalStat::Health => player.health(),
        VitalStat::Food => player.food(),
        VitalStat::Water => player.water(),
        VitalStat::Stamina => player.stamina(),
        VitalStat::Virus => player.virus(),
    }
}

fn set_vital<P: Player + ?Sized>(player: &P, stat: VitalStat, value: u8) {
    match stat {
        VitalStat::Health => player.set_health(value),
        VitalStat::Food => player.set_food(value),
        VitalStat::Water => player.set_water(value),
        VitalStat::Stamina => player.set_stamina(value),
        VitalStat::Virus => player.set_virus(value),
    }
}

fn compare<P: Player + ?Sized>(player: &P, op: CompareOp, operand: &StatOperand) -> bool {
    match operand {
        StatOperand::Money(value) => op.apply(&player.money(), value),
        StatOperand::Vital(stat, value) => op.apply(&vital(player, *stat), value),
        StatOperand::Experience(value) => op.apply(&player.experience(), value),
        StatOperand::Reputation(value) => op.apply(&player.reputation(), value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::{FakeEnvironment, FakePlayer, PlayerState};
    use crate::script::Parser;

    fn event(text: &str) -> EventNode {
        let mut parser = Parser::new();
        let mut script = parser.parse_str("test.usk", text);
        script.events.remove(0)
    }

    fn interpreter() -> Interpreter<FakeEnvironment> {
        Interpreter::new(Arc::new(FakeEnvironment::default()))
    }

    #[tokio::test]
    async fn test_cancel_sets_flag() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event("event player_chat(player, msg):\n    cancel\n");
        interp.execute_event(&ev, &mut ctx).await.unwrap();
        assert!(ctx.cancelled);
    }

    #[tokio::test]
    async fn test_stat_actions() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            "event player_join(player):\n    set_health player 40\n    set_virus player 7\n    add_money player 12.50\n    add_money player 0.25\n    add_experience player 30\n    set_reputation player -3\n",
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        let state = player.snapshot();
        assert_eq!(state.health, 40);
        assert_eq!(state.virus, 7);
        assert_eq!(state.money.to_string(), "12.75");
        assert_eq!(state.experience, 30);
        assert_eq!(state.reputation, -3);
    }

    #[tokio::test]
    async fn test_conditions_pick_branch() {
        let interp = interpreter();
        let player = FakePlayer::with_state(PlayerState {
            health: 20,
            permissions: vec!["vip".to_string()],
            ..PlayerState::default()
        });
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            r#"event player_join(player):
    if health player < 50:
        heal player
    if has_permission player "vip":
        message player "vip"
    else:
        message player "regular"
    if is_in_vehicle player:
        message player "driving"
"#,
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        let state = player.snapshot();
        assert_eq!(state.health, 100);
        assert_eq!(state.messages, vec!["vip"]);
    }

    #[tokio::test]
    async fn test_message_conditions_ignore_case() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let ev = event(
            "event player_chat(player, msg):\n    if equals msg \"HELLO\":\n        message player \"hi\"\n    if startswith msg \"he\":\n        message player \"prefix\"\n",
        );

        let mut ctx = ExecutionContext::for_player(&player).with_message("hello");
        interp.execute_event(&ev, &mut ctx).await.unwrap();
        assert_eq!(player.snapshot().messages, vec!["hi", "prefix"]);

        // 没有消息时两个条件都为假
        let quiet = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&quiet);
        interp.execute_event(&ev, &mut ctx).await.unwrap();
        assert!(quiet.snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_statements_are_logged_and_skipped() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            "event player_join(player):\n    dance\n    if weather is nice:\n        kill player\n    heal player\n",
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        let errors = interp.environment().errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("未知动作") && errors[0].contains("dance"));
        assert!(errors[1].contains("未知条件") && errors[1].contains("test.usk:3"));
        assert_eq!(player.snapshot().health, 100);
    }

    #[tokio::test]
    async fn test_invalid_literal_aborts_body() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            "event player_join(player):\n    message player \"before\"\n    set_food player 999\n    message player \"after\"\n",
        );
        let err = interp.execute_event(&ev, &mut ctx).await.unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(player.snapshot().messages, vec!["before"]);
        assert_eq!(interp.environment().errors().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_command_aborts_body() {
        let interp = Interpreter::new(Arc::new(FakeEnvironment {
            failing_prefix: Some("ban".to_string()),
            ..FakeEnvironment::default()
        }));
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            "event player_join(player):\n    run_command \"save {player.name}\"\n    run_command \"ban {player.name}\"\n    broadcast \"unreachable\"\n",
        );
        let err = interp.execute_event(&ev, &mut ctx).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Command { line: 3, .. }));
        assert_eq!(interp.environment().commands(), vec!["save Alice"]);
        assert!(interp.environment().broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_player_actions_without_player_are_noops() {
        let interp = interpreter();
        let mut ctx = ExecutionContext::detached();
        let ev = event(
            "event every(30):\n    heal player\n    message player \"x\"\n    broadcast \"tick {player.name}\"\n",
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();
        assert_eq!(ctx.event_data.as_deref(), Some("30"));
        assert_eq!(interp.environment().broadcasts(), vec!["tick {player.name}"]);
        assert!(interp.environment().errors().is_empty());
    }

    #[tokio::test]
    async fn test_event_data_kept_when_node_has_none() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player).with_event_data("damage:15");
        let ev = event("event player_damage(player):\n    message player \"-{damage}\"\n");
        interp.execute_event(&ev, &mut ctx).await.unwrap();
        assert_eq!(ctx.event_data.as_deref(), Some("damage:15"));
        assert_eq!(player.snapshot().messages, vec!["-15"]);
    }

    #[tokio::test]
    async fn test_non_player_target_is_ignored() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event("event player_join(player):\n    kill someone\n    if health someone >= 0:\n        kill player\n");
        interp.execute_event(&ev, &mut ctx).await.unwrap();
        assert_eq!(player.snapshot().health, 100);
    }

    #[tokio::test]
    async fn test_unknown_statement_log_names_script() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut parser = Parser::new();
        for name in ["a.usk", "b.usk"] {
            let mut script = parser.parse_str(name, "event x(player):\n    dance\n");
            let ev = script.events.remove(0);
            let mut ctx = ExecutionContext::for_player(&player);
            interp.execute_event(&ev, &mut ctx).await.unwrap();
        }

        let errors = interp.environment().errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("a.usk:2"));
        assert!(errors[1].contains("b.usk:2"));
    }

    #[tokio::test]
    async fn test_item_location_and_kick_actions() {
        let interp = interpreter();
        let player = FakePlayer::default();
        let mut ctx = ExecutionContext::for_player(&player).with_message("spam");
        let ev = event(
            r#"event player_chat(player, msg):
    give player "15" 5
    give player "Military Vest" 1
    teleport player "120,33,-8"
    kick player "{player.name}: {msg}"
"#,
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        let state = player.snapshot();
        assert_eq!(
            state.items,
            vec![("15".to_string(), 5), ("Military Vest".to_string(), 1)]
        );
        assert_eq!(state.location.as_deref(), Some("120,33,-8"));
        assert_eq!(state.kicked.as_deref(), Some("Alice: spam"));
    }

    #[tokio::test]
    async fn test_set_actions_overwrite() {
        let interp = interpreter();
        let player = FakePlayer::with_state(PlayerState {
            money: "99.90".parse().unwrap(),
            experience: 500,
            ..PlayerState::default()
        });
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            "event player_join(player):\n    set_money player 10.5\n    set_experience player 7\n    set_food player 11\n    set_water player 22\n    set_stamina player 33\n",
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        let state = player.snapshot();
        assert_eq!(state.money.to_string(), "10.5");
        assert_eq!(state.experience, 7);
        assert_eq!(state.food, 11);
        assert_eq!(state.water, 22);
        assert_eq!(state.stamina, 33);
        assert_eq!(state.health, 100);
    }

    #[tokio::test]
    async fn test_restore_and_clear_actions() {
        let interp = interpreter();
        let player = FakePlayer::with_state(PlayerState {
            food: 5,
            water: 6,
            stamina: 7,
            in_vehicle: true,
            items: vec![("bandage".to_string(), 2)],
            ..PlayerState::default()
        });
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            "event player_join(player):\n    feed player\n    clear_inventory player\n    exit_vehicle player\n",
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        let state = player.snapshot();
        assert_eq!((state.food, state.water), (100, 100));
        // feed 不影响耐力
        assert_eq!(state.stamina, 7);
        assert!(state.items.is_empty());
        assert!(state.inventory_cleared);
        assert!(!state.in_vehicle);
    }

    #[tokio::test]
    async fn test_stat_comparisons_against_player() {
        let interp = interpreter();
        let player = FakePlayer::with_state(PlayerState {
            money: "100.00".parse().unwrap(),
            experience: 250,
            reputation: -5,
            ..PlayerState::default()
        });
        let mut ctx = ExecutionContext::for_player(&player);
        let ev = event(
            r#"event player_join(player):
    if money player >= 100:
        message player "money>=100"
    if money player > 100:
        message player "money>100"
    if experience player == 250:
        message player "exp==250"
    if experience player < 250:
        message player "exp<250"
    if reputation player <= -5:
        message player "rep<=-5"
    if reputation player > 0:
        message player "rep>0"
    else:
        message player "rep<=0"
"#,
        );
        interp.execute_event(&ev, &mut ctx).await.unwrap();

        assert_eq!(
            player.snapshot().messages,
            vec!["money>=100", "exp==250", "rep<=-5", "rep<=0"]
        );
    }
}
