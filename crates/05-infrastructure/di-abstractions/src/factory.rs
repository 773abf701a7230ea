//! 类系统抽象接口
//!
//! 容器只依赖 "按类名获取类描述并构造实例" 这一契约

use crate::instance::{Argument, ServiceObject};
use infrastructure_common::ServiceResult;
use std::sync::Arc;

/// 类描述 trait
///
/// 描述一个可实例化的类
pub trait ClassDescriptor: Send + Sync {
    /// 类名
    fn name(&self) -> &str;

    /// 类是否声明了指定方法
    fn has_method(&self, method: &str) -> bool;

    /// 使用已解析的参数创建实例
    fn create_instance(&self, args: Vec<Argument>) -> ServiceResult<Box<dyn ServiceObject>>;
}

/// 类系统 trait
pub trait ClassSystem: Send + Sync {
    /// 声明稍后需要使用的类（加载期副作用，不创建实例）
    fn loadable(&self, class_name: &str);

    /// 获取类描述
    fn get(&self, class_name: &str) -> ServiceResult<Arc<dyn ClassDescriptor>>;
}
