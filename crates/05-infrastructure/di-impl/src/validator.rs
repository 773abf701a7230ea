//! 循环依赖校验
//!
//! 在服务构造之前遍历构造参数和方法调用中的服务引用（`@name`），
//! 拒绝会导致循环构造的引用。

use crate::definition::ServiceDefinition;
use crate::handles::is_infrastructure_service;
use crate::registry::DefinitionRegistry;
use infrastructure_common::{service_reference, ServiceError, ServiceResult};
use serde_json::Value;
use std::sync::Arc;

/// 服务引用出现的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSite {
    /// 构造参数
    Constructor,
    /// 方法调用参数
    Call,
}

/// 校验服务定义
///
/// 依赖链以被校验的服务开始，并在递归过程中累积，已在链中的服务不会再次展开。
pub fn validate(definition: &ServiceDefinition) -> ServiceResult<()> {
    let registry = definition.registry()?;
    let mut chain = vec![definition.name()];
    validate_with_chain(&registry, definition, &mut chain)
}

fn validate_with_chain(
    registry: &Arc<DefinitionRegistry>,
    definition: &ServiceDefinition,
    chain: &mut Vec<String>,
) -> ServiceResult<()> {
    let tags = definition.tags();

    for argument in definition.arguments() {
        check_reference(
            registry,
            definition,
            &tags,
            &argument,
            ReferenceSite::Constructor,
            chain,
        )?;
    }

    for arguments in definition.calls().values() {
        let Value::Array(arguments) = arguments else {
            continue;
        };
        for argument in arguments {
            check_reference(
                registry,
                definition,
                &tags,
                argument,
                ReferenceSite::Call,
                chain,
            )?;
        }
    }

    Ok(())
}

fn check_reference(
    registry: &Arc<DefinitionRegistry>,
    definition: &ServiceDefinition,
    tags: &[String],
    argument: &Value,
    site: ReferenceSite,
    chain: &mut Vec<String>,
) -> ServiceResult<()> {
    let Some(name) = service_reference(argument) else {
        return Ok(());
    };
    let referenced = match registry.resolve_visible(name) {
        Ok(referenced) => referenced,
        Err(ServiceError::ServiceNotFound(_)) if is_infrastructure_service(name) => return Ok(()),
        Err(err) => return Err(err),
    };
    if is_illegal(&referenced, name, tags, site, &chain[0]) {
        let mut trail = chain.clone();
        trail.push(name.to_string());
        return Err(ServiceError::circular(definition.name(), &trail));
    }

    if chain.iter().any(|entry| entry == name) {
        return Ok(());
    }
    chain.push(name.to_string());
    validate_with_chain(registry, &referenced, chain)
}

/// 判断引用是否构成循环
///
/// - 被引用服务不是单例，且其名称出现在当前定义的标签中
/// - 构造参数引用了依赖链的起点（起点是否单例都不允许）
fn is_illegal(
    referenced: &ServiceDefinition,
    name: &str,
    tags: &[String],
    site: ReferenceSite,
    root: &str,
) -> bool {
    let tagged_prototype = !referenced.is_singleton() && tags.iter().any(|tag| tag == name);
    let constructor_loop = site == ReferenceSite::Constructor && name == root;
    tagged_prototype || constructor_loop
}
