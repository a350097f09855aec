//! # 编解码边界
//!
//! 文件字节与 `ImageHandle` / `SaveSpec` 之间的转换。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 和 `commands/info.rs` 调用
//! - 子模块: decode (读取与解码), encode (编码与写出), pdf (单页 PDF)

pub mod decode;
pub mod encode;
pub mod pdf;
