//! # 能力接口
//!
//! 引擎对宿主的全部依赖都通过这两个 trait 表达：
//!
//! - [`Environment`]：全服广播、执行服务器命令、日志
//! - [`Player`]：单个玩家的身份与可读写属性
//!
//! 引擎从不持有 `Player`，只在一次事件调用期间借用。

use std::future::Future;

use rust_decimal::Decimal;

use crate::error::CommandError;

/// 宿主环境能力
pub trait Environment: Send + Sync {
    /// 向所有在线玩家发送消息
    fn broadcast(&self, text: &str);

    /// 执行服务器命令
    ///
    /// 解释器会等待返回的 future 完成后再执行下一条语句。
    fn run_command(&self, command: &str) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// 普通日志
    fn log(&self, text: &str);

    /// 错误日志，可附带原因
    fn log_error(&self, text: &str, cause: Option<&(dyn std::error::Error + 'static)>);
}

/// 玩家能力
pub trait Player: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn display_name(&self) -> &str;

    fn send_message(&self, text: &str);
    fn give_item(&self, item: &str, amount: i32);
    fn teleport(&self, location: &str);
    fn has_permission(&self, permission: &str) -> bool;

    fn money(&self) -> Decimal;
    fn add_money(&self, amount: Decimal);
    fn set_money(&self, amount: Decimal);

    fn health(&self) -> u8;
    fn set_health(&self, value: u8);
    fn food(&self) -> u8;
    fn set_food(&self, value: u8);
    fn water(&self) -> u8;
    fn set_water(&self, value: u8);
    fn stamina(&self) -> u8;
    fn set_stamina(&self, value: u8);
    fn virus(&self) -> u8;
    fn set_virus(&self, value: u8);

    fn experience(&self) -> u32;
    fn add_experience(&self, amount: u32);
    fn set_experience(&self, amount: u32);

    fn reputation(&self) -> i32;
    fn set_reputation(&self, value: i32);

    /// 所属权限组
    fn group(&self) -> String;

    fn kill(&self);
    fn kick(&self, reason: &str);
    /// 生命值回满
    fn heal(&self);
    /// 饱食度与水分回满
    fn feed(&self);
    fn clear_inventory(&self);

    fn is_in_vehicle(&self) -> bool;
    fn exit_vehicle(&self);

    /// 格式化后的坐标
    fn position(&self) -> String;
    fn ping(&self) -> f32;
}
