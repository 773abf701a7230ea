//! 模块宿主抽象接口

/// 模块宿主 trait
///
/// 定义注册表所属模块的阶段信息。模块就绪后注册表拒绝任何修改。
pub trait ModuleHost: Send + Sync {
    /// 模块名称
    fn module_name(&self) -> &str;

    /// 模块是否已离开配置阶段
    fn is_ready(&self) -> bool;
}
