//! fotorite 工具集
//!
//! 目前只有日志初始化。

pub mod init_log;
