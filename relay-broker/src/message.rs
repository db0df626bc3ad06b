//! 消息信封（Message）
//!
//! 由字符串键值消息头与不透明的消息体组成：
//! - `content-type`：消息体所用 codec 的名称，缺省为 `json`；
//! - `message-type`：生产者负载的类型名，仅供参考；
//! - 消息体只有结合 `content-type` 指定的 codec 才有意义。
//!
use crate::codec::{CodecRegistry, JSON};
use crate::error::{BrokerError, BrokerResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 消息头键：codec 名称
pub const CONTENT_TYPE: &str = "content-type";
/// 消息头键：负载类型名
pub const MESSAGE_TYPE: &str = "message-type";
/// 未指定 content-type 时使用的 codec
pub const DEFAULT_CONTENT_TYPE: &str = JSON;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    header: HashMap<String, String>,
    body: Vec<u8>,
}

impl Message {
    /// 使用进程级 codec 注册表构造消息
    ///
    /// - `content_type` 为空时使用 `json`；
    /// - `header_pairs` 按 `[k1, v1, k2, v2, ...]` 排列，长度为奇数时返回 `InvalidArgument`；
    /// - codec 未注册时返回 `Unimplemented`，不产生消息。
    pub fn new<T>(payload: &T, content_type: &str, header_pairs: &[&str]) -> BrokerResult<Self>
    where
        T: Serialize + ?Sized,
    {
        Self::new_in(CodecRegistry::global(), payload, content_type, header_pairs)
    }

    /// 与 `new` 相同，但使用指定的注册表
    pub fn new_in<T>(
        registry: &CodecRegistry,
        payload: &T,
        content_type: &str,
        header_pairs: &[&str],
    ) -> BrokerResult<Self>
    where
        T: Serialize + ?Sized,
    {
        if header_pairs.len() % 2 != 0 {
            return Err(BrokerError::invalid_argument(format!(
                "header pairs must be key/value pairs, got {} items",
                header_pairs.len()
            )));
        }

        let content_type = if content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            content_type
        };

        let mut header: HashMap<String, String> = header_pairs
            .chunks_exact(2)
            .map(|kv| (kv[0].to_string(), kv[1].to_string()))
            .collect();
        header.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        header.insert(MESSAGE_TYPE.to_string(), short_type_name::<T>());

        let mut message = Self {
            header,
            body: Vec::new(),
        };
        message.marshal_to_body_in(registry, payload)?;
        Ok(message)
    }

    /// 直接由消息头与消息体组装（供外部适配器还原收到的帧）
    pub fn from_parts(header: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self { header, body }
    }

    pub fn header(&self) -> &HashMap<String, String> {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.header
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.header.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.header.insert(key.into(), value.into());
    }

    /// 消息头中的 content-type，缺失或为空时视为 `json`
    pub fn content_type(&self) -> &str {
        match self.get(CONTENT_TYPE) {
            Some(ct) if !ct.is_empty() => ct,
            _ => DEFAULT_CONTENT_TYPE,
        }
    }

    pub fn message_type(&self) -> Option<&str> {
        self.get(MESSAGE_TYPE)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// 按消息头中的 content-type 重新序列化消息体
    pub fn marshal_to_body<T>(&mut self, value: &T) -> BrokerResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.marshal_to_body_in(CodecRegistry::global(), value)
    }

    pub fn marshal_to_body_in<T>(&mut self, registry: &CodecRegistry, value: &T) -> BrokerResult<()>
    where
        T: Serialize + ?Sized,
    {
        let codec = registry.require(self.content_type())?;
        self.body = codec.encode(value)?;
        Ok(())
    }

    /// 按消息头中的 content-type 反序列化消息体
    pub fn unmarshal_body_to<T>(&self) -> BrokerResult<T>
    where
        T: DeserializeOwned,
    {
        self.unmarshal_body_to_in(CodecRegistry::global())
    }

    pub fn unmarshal_body_to_in<T>(&self, registry: &CodecRegistry) -> BrokerResult<T>
    where
        T: DeserializeOwned,
    {
        registry.require(self.content_type())?.decode(&self.body)
    }
}

/// 负载的运行时类型名：去掉引用/指针标记、泛型参数与模块路径
///
/// 元组与数组保留其结构，仅去掉各组成类型的模块路径，如 `(u32, String)`。
fn short_type_name<T: ?Sized>() -> String {
    let mut name = std::any::type_name::<T>();
    while let Some(rest) = ["&", "mut ", "*const ", "*mut "]
        .iter()
        .find_map(|p| name.strip_prefix(p))
    {
        name = rest;
    }
    if name.starts_with('(') || name.starts_with('[') {
        return strip_paths(name);
    }
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name).to_string()
}

/// 去掉类型名中每个路径的模块前缀
fn strip_paths(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name.split("::").enumerate() {
        if i > 0 {
            // `::` 之前的标识符是模块段
            let keep = out
                .trim_end_matches(|c: char| c.is_alphanumeric() || c == '_')
                .len();
            out.truncate(keep);
        }
        out.push_str(part);
    }
    out
}
