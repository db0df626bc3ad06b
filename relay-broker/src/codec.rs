//! 消息体编解码（Codec）与注册表
//!
//! - `Codec`：按 content-type 名称标识的一对 marshal/unmarshal；
//! - 负载以类型擦除的 serde（`erased_serde`）跨越 codec 边界，trait 可作为对象使用，
//!   且不经过任何中间值形态，完整保留 serde 数据模型（如 `u128`、非字符串键）；
//! - `CodecRegistry`：按名称保存 codec，同名后注册者覆盖先注册者；
//! - `CodecRegistry::global()`：进程级唯一实例，默认预置 `json` 与 `msgpack`。
//!
//! 约定：codec 应在进程初始化阶段、首次收发消息之前完成注册。
//! 注册表内部基于 `DashMap`，即便与查找并发也不会出现数据竞争，
//! 但初始化之后再替换 codec 会让在途消息按新的 codec 解码。
//!
use crate::error::{BrokerError, BrokerResult};
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Cursor;
use std::sync::{Arc, LazyLock};

/// JSON codec 名称，同时也是消息的默认 content-type
pub const JSON: &str = "json";
/// MessagePack codec 名称
pub const MSGPACK: &str = "msgpack";

/// 解码回调：codec 基于字节构造底层反序列化器，交由调用方驱动目标类型的反序列化
pub type Visit<'a> = dyn for<'de> FnMut(&mut dyn erased_serde::Deserializer<'de>) -> Result<(), erased_serde::Error>
    + 'a;

pub trait Codec: Send + Sync {
    /// codec 名称，即消息头中的 content-type
    fn name(&self) -> &str;

    fn marshal(&self, value: &dyn erased_serde::Serialize) -> BrokerResult<Vec<u8>>;

    /// 以 `data` 构造反序列化器并调用一次 `visit`；应拒绝未消费完的尾随字节
    fn unmarshal(&self, data: &[u8], visit: &mut Visit<'_>) -> BrokerResult<()>;
}

impl<'a> dyn Codec + 'a {
    /// 以该 codec 编码任意可序列化的值
    pub fn encode<T>(&self, value: &T) -> BrokerResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        // `&T` 总是 Sized，可擦除为 trait 对象
        self.marshal(&value)
    }

    /// 以该 codec 解码为 `T`
    pub fn decode<T>(&self, data: &[u8]) -> BrokerResult<T>
    where
        T: DeserializeOwned,
    {
        let mut decoded = None;
        self.unmarshal(data, &mut |de: &mut dyn erased_serde::Deserializer<'_>| {
            decoded = Some(erased_serde::deserialize::<T>(de)?);
            Ok(())
        })?;
        decoded.ok_or_else(|| BrokerError::codec(self.name(), "no value was decoded"))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        JSON
    }

    fn marshal(&self, value: &dyn erased_serde::Serialize) -> BrokerResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn unmarshal(&self, data: &[u8], visit: &mut Visit<'_>) -> BrokerResult<()> {
        let mut de = serde_json::Deserializer::from_slice(data);
        {
            let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
            visit(&mut erased).map_err(|e| BrokerError::codec(JSON, e))?;
        }
        de.end()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    fn name(&self) -> &str {
        MSGPACK
    }

    /// 结构体编码为带字段名的 map，便于其他语言的消费方解读
    fn marshal(&self, value: &dyn erased_serde::Serialize) -> BrokerResult<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(|e| BrokerError::codec(MSGPACK, e))
    }

    fn unmarshal(&self, data: &[u8], visit: &mut Visit<'_>) -> BrokerResult<()> {
        let mut de = rmp_serde::Deserializer::new(Cursor::new(data));
        {
            let mut erased = <dyn erased_serde::Deserializer>::erase(&mut de);
            visit(&mut erased).map_err(|e| BrokerError::codec(MSGPACK, e))?;
        }
        if de.position() != data.len() as u64 {
            return Err(BrokerError::codec(MSGPACK, "trailing bytes after value"));
        }
        Ok(())
    }
}

static GLOBAL: LazyLock<CodecRegistry> = LazyLock::new(CodecRegistry::with_defaults);

/// 按名称索引的 codec 注册表
pub struct CodecRegistry {
    codecs: DashMap<String, Arc<dyn Codec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CodecRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self {
            codecs: DashMap::new(),
        }
    }

    /// 预置内建 codec（json、msgpack）的注册表
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(JsonCodec));
        registry.register(Arc::new(MsgPackCodec));
        registry
    }

    /// 进程级注册表
    pub fn global() -> &'static CodecRegistry {
        &GLOBAL
    }

    /// 注册 codec，同名覆盖
    pub fn register(&self, codec: Arc<dyn Codec>) {
        self.codecs.insert(codec.name().to_string(), codec);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.get(name).map(|c| c.value().clone())
    }

    /// 与 `get` 相同，但缺失时返回 `Unimplemented`
    pub fn require(&self, name: &str) -> BrokerResult<Arc<dyn Codec>> {
        self.get(name)
            .ok_or_else(|| BrokerError::unimplemented(format!("codec not registered: {name}")))
    }

    /// 已注册的 codec 名称（按字典序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.codecs.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }
}

/// 向进程级注册表注册 codec
pub fn register_codec(codec: Arc<dyn Codec>) {
    CodecRegistry::global().register(codec);
}

/// 从进程级注册表查找 codec
pub fn get_codec(name: &str) -> Option<Arc<dyn Codec>> {
    CodecRegistry::global().get(name)
}
