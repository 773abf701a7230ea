//! 模块生命周期阶段

use serde::{Deserialize, Serialize};

/// 模块阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModulePhase {
    /// 配置阶段 - 允许注册和修改服务定义
    #[default]
    Configuring,
    /// 就绪阶段 - 服务定义已封闭
    Ready,
}

impl ModulePhase {
    /// 是否已就绪
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}
