//! 参数存储抽象接口

use infrastructure_common::ServiceResult;
use serde_json::Value;

/// 参数存储 trait
///
/// 参数插值（`%name%`）时按名称获取参数值
pub trait ParameterStore: Send + Sync {
    /// 获取参数值，不存在时返回 `ParameterNotFound`
    fn get(&self, name: &str) -> ServiceResult<Value>;

    /// 检查参数是否存在
    fn has(&self, name: &str) -> bool;
}
