//! # 字符串插值
//!
//! 单遍扫描 `{...}` 记号并替换为上下文中的实时值：
//!
//! - `{player.name}` `{player.id}` `{player.displayname}`
//! - `{player.health}` `{player.food}` `{player.water}`
//! - `{player.experience}` `{player.reputation}` `{player.group}`
//! - `{player.position}` `{player.ping}`
//! - `{damage}` `{msg}`
//!
//! 无法识别或当前不可用的记号原样保留；替换进来的值不会再次扫描。

use super::capability::Player;
use super::context::ExecutionContext;

/// 对文本做插值
pub fn interpolate<P: Player + ?Sized>(text: &str, ctx: &ExecutionContext<'_, P>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let token_start = &rest[start + 1..];

        let resolved = token_start
            .find('}')
            .and_then(|end| resolve_token(&token_start[..end], ctx).map(|value| (value, end)));

        match resolved {
            Some((value, end)) => {
                out.push_str(&value);
                rest = &token_start[end + 1..];
            }
            None => {
                out.push('{');
                rest = token_start;
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve_token<P: Player + ?Sized>(token: &str, ctx: &ExecutionContext<'_, P>) -> Option<String> {
    match token {
        "damage" => return Some(ctx.damage_amount().to_string()),
        "msg" => return ctx.message.clone(),
        _ => {}
    }

    let field = token.strip_prefix("player.")?;
    let player = ctx.player?;
    let value = match field {
        "name" => player.name().to_string(),
        "id" => player.id().to_string(),
        "displayname" => player.display_name().to_string(),
        "health" => player.health().to_string(),
        "food" => player.food().to_string(),
        "water" => player.water().to_string(),
        "experience" => player.experience().to_string(),
        "reputation" => player.reputation().to_string(),
        "group" => player.group(),
        "position" => player.position(),
        "ping" => player.ping().to_string(),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::FakePlayer;

    #[test]
    fn test_player_fields() {
        let player = FakePlayer::default();
        let ctx = ExecutionContext::for_player(&player);
        assert_eq!(
            interpolate("{player.displayname} ({player.id}) hp={player.health}", &ctx),
            "[VIP] Alice (76561198000000001) hp=100"
        );
        assert_eq!(
            interpolate("{player.group}@{player.position} {player.ping}ms", &ctx),
            "vip@120.5,33,-8 42ms"
        );
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let player = FakePlayer::default();
        let ctx = ExecutionContext::for_player(&player);
        assert_eq!(
            interpolate("{player.name}, {player.name}!", &ctx),
            "Alice, Alice!"
        );
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let ctx = ExecutionContext::detached();
        for text in ["", "plain", "a } b", "{ unclosed", "{}", "{{}}"] {
            assert_eq!(interpolate(text, &ctx), text);
        }
    }

    #[test]
    fn test_unknown_and_unavailable_tokens_stay() {
        let ctx = ExecutionContext::detached();
        assert_eq!(
            interpolate("{player.name} {msg} {weather}", &ctx),
            "{player.name} {msg} {weather}"
        );

        let player = FakePlayer::default();
        let ctx = ExecutionContext::for_player(&player);
        assert_eq!(interpolate("{player.mana}", &ctx), "{player.mana}");
        assert_eq!(interpolate("{Player.Name}", &ctx), "{Player.Name}");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let player = FakePlayer::default();
        let ctx = ExecutionContext::for_player(&player).with_message("{player.name}");
        assert_eq!(interpolate("said: {msg}", &ctx), "said: {player.name}");
    }

    #[test]
    fn test_damage_and_message() {
        let ctx = ExecutionContext::detached()
            .with_event_data("damage:7.25")
            .with_message("hello");
        assert_eq!(interpolate("-{damage} ({msg})", &ctx), "-7.25 (hello)");

        let ctx = ExecutionContext::detached();
        assert_eq!(interpolate("{damage}", &ctx), "0");
    }

    #[test]
    fn test_brace_before_token() {
        let player = FakePlayer::default();
        let ctx = ExecutionContext::for_player(&player);
        assert_eq!(interpolate("{{player.name}}", &ctx), "{Alice}");
        assert_eq!(interpolate("{x{player.name}", &ctx), "{xAlice");
    }
}
