//! URL规范化：把自由形式的输入规约为 `scheme://host[/path]`。
//! URL canonicalization: reduces free-form input to
//! `scheme://host[/path]`.
//!
//! 两个入口对应参考行为的两个分歧版本：[`canonicalize`] 在失败时报告
//! [`Error::InvalidUrl`]（连接对象的 `set_url` 使用它），
//! [`try_canonicalize`] 在失败时静默返回 `None`（验证器调用点使用它）。
//!
//! The two entry points correspond to the two divergent revisions of the
//! reference behavior: [`canonicalize`] reports [`Error::InvalidUrl`] on
//! failure (used by the connection object's `set_url`), while
//! [`try_canonicalize`] silently returns `None` (used at validator call
//! sites).

use crate::error::{Error, Result};

/// Canonicalizes a raw URL, failing with [`Error::InvalidUrl`] when no
/// scheme and host can be extracted.
/// 规范化一个原始URL，无法提取方案与主机时以 [`Error::InvalidUrl`] 失败。
pub fn canonicalize(raw: &str, default_scheme: &str) -> Result<String> {
    try_canonicalize(raw, default_scheme).ok_or_else(|| Error::InvalidUrl(raw.to_string()))
}

/// Canonicalizes a raw URL, returning `None` when no scheme and host can be
/// extracted.
///
/// When `raw` carries no `"://"` separator, `default_scheme` is assumed
/// before parsing. The output keeps scheme, host (with port) and path;
/// query and fragment are discarded.
///
/// 规范化一个原始URL，无法提取方案与主机时返回 `None`。当 `raw` 不含
/// `"://"` 分隔符时，解析前先采用 `default_scheme`。输出保留方案、
/// 主机（含端口）与路径；查询与片段被丢弃。
pub fn try_canonicalize(raw: &str, default_scheme: &str) -> Option<String> {
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => (default_scheme, raw),
    };
    if scheme.is_empty() {
        return None;
    }

    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    if host.is_empty() {
        return None;
    }

    let tail = &rest[host_end..];
    let path = if tail.starts_with('/') {
        let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
        &tail[..path_end]
    } else {
        ""
    };

    Some(format!("{scheme}://{host}{path}"))
}
