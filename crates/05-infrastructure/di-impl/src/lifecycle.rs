//! 模块生命周期闸门

use di_abstractions::ModuleHost;
use infrastructure_common::ModulePhase;
use parking_lot::RwLock;
use tracing::info;

/// 生命周期闸门
///
/// [`ModuleHost`] 的默认实现。阶段只能从配置阶段单向进入就绪阶段。
#[derive(Debug)]
pub struct LifecycleGate {
    module_name: String,
    phase: RwLock<ModulePhase>,
}

impl LifecycleGate {
    /// 创建处于配置阶段的闸门
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            phase: RwLock::new(ModulePhase::Configuring),
        }
    }

    /// 当前阶段
    pub fn phase(&self) -> ModulePhase {
        *self.phase.read()
    }

    /// 进入就绪阶段，返回本次调用是否发生了阶段切换
    pub fn seal(&self) -> bool {
        let mut phase = self.phase.write();
        if phase.is_ready() {
            return false;
        }
        *phase = ModulePhase::Ready;
        info!("模块 {} 进入就绪阶段", self.module_name);
        true
    }
}

impl ModuleHost for LifecycleGate {
    fn module_name(&self) -> &str {
        &self.module_name
    }

    fn is_ready(&self) -> bool {
        self.phase().is_ready()
    }
}
