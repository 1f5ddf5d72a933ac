//! 上传处理上下文
//!
//! 封装"正在处理哪个文件、要出几道题"这一信息

use std::fmt::Display;

use chrono::Local;

use crate::models::{storage_file_name, SourceKind};

/// 上传处理上下文
#[derive(Debug, Clone)]
pub struct UploadCtx {
    /// 存储桶中的文件名（带时间戳前缀）
    pub storage_name: String,

    /// 用户上传时的原始文件名
    pub original_name: String,

    /// 文件类型
    pub kind: SourceKind,

    /// 要生成的题目数量
    pub num_questions: usize,
}

impl UploadCtx {
    /// 创建新的上传上下文，存储文件名使用当前时间
    pub fn new(original_name: String, kind: SourceKind, num_questions: usize) -> Self {
        Self {
            storage_name: storage_file_name(&original_name, Local::now()),
            original_name,
            kind,
            num_questions,
        }
    }
}

impl Display for UploadCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[上传 {} 题目数#{}]",
            self.storage_name, self.num_questions
        )
    }
}
