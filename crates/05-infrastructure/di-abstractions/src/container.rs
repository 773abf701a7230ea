//! 服务解析接口
//!
//! 应用代码和参数解析器通过该接口获取服务实例

use crate::instance::ServiceInstance;
use infrastructure_common::ServiceResult;

/// 服务定位 trait
pub trait ServiceLocator: Send + Sync {
    /// 按名称获取服务实例，必要时创建
    fn get(&self, name: &str) -> ServiceResult<ServiceInstance>;

    /// 检查服务是否已定义（不要求已创建）
    fn isset(&self, name: &str) -> bool;

    /// 获取所有带指定标签的服务实例
    fn find_by_tag(&self, tag: &str) -> ServiceResult<Vec<ServiceInstance>>;
}
